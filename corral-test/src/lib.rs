//! In-process HTTP testing for Corral applications.
//!
//! ```ignore
//! let app = TestApp::from_builder(builder);
//! app.post("/customers")
//!     .json(&json!({"name": "Ada"}))
//!     .send()
//!     .await
//!     .assert_created()
//!     .assert_json("/id", 1);
//!
//! app.get("/customers/9")
//!     .send()
//!     .await
//!     .assert_error(StatusCode::NOT_FOUND, "Customer not found");
//! ```

mod app;

pub use app::{TestApp, TestRequest, TestResponse};
pub use http::StatusCode;
