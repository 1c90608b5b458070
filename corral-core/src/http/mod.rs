pub mod header;
mod request;

pub use axum::body::Body;
pub use axum::response::{IntoResponse, Response};
pub use axum::{routing, serve, Json, Router};
pub use bytes::Bytes;

pub use self::header::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, CONTENT_TYPE};
pub use self::request::RouteRequest;
