//! Convenience type aliases for common handler return types.
//!
//! ```ignore
//! fn list(&self, _req: RouteRequest) -> ApiResult<Response> {
//!     Ok(Json(self.service.list()).into_response())
//! }
//! ```

use crate::error::HttpError;

/// Result of a controller method, failing with [`HttpError`].
///
/// Controller methods return `ApiResult<Response>`.
pub type ApiResult<T> = Result<T, HttpError>;
