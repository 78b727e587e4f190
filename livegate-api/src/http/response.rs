// Uniform response envelope: {"status": <int>, "data": <any>}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub data: T,
}

/// JSON envelope whose HTTP status always equals its `status` field
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    status: StatusCode,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub const fn new(status: StatusCode, data: T) -> Self {
        Self { status, data }
    }

    pub const fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, data)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Json(Envelope {
            status: self.status.as_u16(),
            data: self.data,
        });
        (self.status, body).into_response()
    }
}
