// Request parameters from the query string and an urlencoded POST body

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, Method},
};
use std::collections::HashMap;

use super::AppError;

/// Merged request parameters; body values override query values and the
/// first occurrence of a name wins within each source
#[derive(Debug, Clone, Default)]
pub struct Params(HashMap<String, String>);

impl Params {
    fn merge(&mut self, pairs: Vec<(String, String)>, overwrite: bool) {
        let mut seen = std::collections::HashSet::new();
        for (name, value) in pairs {
            if !seen.insert(name.clone()) {
                continue;
            }
            if overwrite || !self.0.contains_key(&name) {
                self.0.insert(name, value);
            }
        }
    }

    /// Value of `name`, or `""` when absent
    #[must_use]
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map_or("", String::as_str)
    }

    /// Value of `name` when present and non-empty
    #[must_use]
    pub fn required(&self, name: &str) -> Option<&str> {
        Some(self.get(name)).filter(|v| !v.is_empty())
    }
}

fn is_form(req: &Request) -> bool {
    req.method() == Method::POST
        && req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

impl<S> FromRequest<S> for Params
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut params = Self::default();

        if let Some(query) = req.uri().query() {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
                .map_err(|e| AppError::bad_request(format!("invalid query string: {e}")))?;
            params.merge(pairs, false);
        }

        if is_form(&req) {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(format!("invalid request body: {e}")))?;
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&body)
                .map_err(|e| AppError::bad_request(format!("invalid form body: {e}")))?;
            params.merge(pairs, true);
        }

        Ok(params)
    }
}
