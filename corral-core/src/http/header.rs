pub use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
pub use axum::http::{HeaderMap, Method, StatusCode};
