// HTTP middleware: static API key gate and optional bearer-token gate

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use livegate_core::auth::{check_api_key, JwtVerifier};

use super::{AppError, AppState};

const JWT_QUERY_PARAM: &str = "jwt";

fn authorization_header(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

fn query_token(req: &Request) -> Option<String> {
    let query = req.uri().query()?;
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .ok()?
        .into_iter()
        .find(|(name, _)| name == JWT_QUERY_PARAM)
        .map(|(_, value)| value)
}

/// Reject requests whose `authorization` header is not the configured key
pub async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Err(e) = check_api_key(&state.api_key, authorization_header(&req)) {
        tracing::debug!(path = %req.uri().path(), "Rejected request with invalid API key");
        return AppError::from(e).into_response();
    }

    next.run(req).await
}

/// Validate the bearer token when a JWT secret is configured
pub async fn require_jwt(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(verifier) = state.jwt.as_ref() else {
        return next.run(req).await;
    };

    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let query = query_token(&req);
    let result = JwtVerifier::extract_token(authorization_header(&req), query.as_deref())
        .and_then(|token| verifier.verify(token));

    match result {
        Ok(_) => next.run(req).await,
        Err(e) => {
            tracing::debug!(path = %req.uri().path(), error = %e, "Rejected request with invalid token");
            AppError::from(e).into_response()
        }
    }
}
