//! Success half of the response envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::pagination::PageLinks;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageLinks>,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self { success: true, count: None, total: None, pagination: None, data }
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self {
        Self { count: Some(data.len()), ..Self::data(data) }
    }

    pub fn page(data: Vec<T>, total: u64, pagination: PageLinks) -> Self {
        Self { total: Some(total), pagination: Some(pagination), ..Self::list(data) }
    }
}

/// `data` with a status other than 200.
pub struct WithStatus<T: Serialize>(pub StatusCode, pub Envelope<T>);

impl<T: Serialize> IntoResponse for WithStatus<T> {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Empty object payload for deletes.
#[derive(Debug, Default, Serialize)]
pub struct Empty {}
