use bytes::Bytes;
use corral_core::http::{Body, Router};
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tower::util::ServiceExt;

/// Drives a built router in-process through `tower::ServiceExt::oneshot`.
pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Build the application and wrap the resulting router.
    pub fn from_builder<S>(builder: corral_core::AppBuilder<S>) -> Self
    where
        S: Clone + Send + Sync + 'static,
    {
        Self::new(builder.build())
    }

    pub fn get(&self, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, Method::GET, path)
    }

    pub fn post(&self, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, Method::POST, path)
    }

    pub fn put(&self, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, Method::DELETE, path)
    }
}

/// A pending request. Without a body it is sent with no `Content-Type`.
pub struct TestRequest<'a> {
    app: &'a TestApp,
    method: Method,
    path: String,
    body: Option<Vec<u8>>,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: Method, path: &str) -> Self {
        Self {
            app,
            method,
            path: path.to_string(),
            body: None,
        }
    }

    /// Serialize `body` as the JSON payload.
    pub fn json(self, body: &impl Serialize) -> Self {
        let bytes = serde_json::to_vec(body).expect("test payload must serialize");
        self.raw_json(bytes)
    }

    /// Send `body` verbatim as `application/json`, e.g. a truncated document.
    pub fn raw_json(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub async fn send(self) -> TestResponse {
        let mut builder = Request::builder().method(self.method).uri(&self.path);
        let body = match self.body {
            Some(bytes) => {
                builder = builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Body::from(bytes)
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("test request must be well-formed");

        let response = self
            .app
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("failed to read response body")
            .to_bytes();

        TestResponse { status, headers, body }
    }
}

/// A buffered response with chainable assertions.
///
/// JSON lookups take RFC 6901 pointers: `""` is the whole document,
/// `"/0/name"` the name of the first element.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "expected {expected}, got {}\nbody: {}",
            self.status,
            self.text()
        );
        self
    }

    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_created(self) -> Self {
        self.assert_status(StatusCode::CREATED)
    }

    pub fn assert_bad_request(self) -> Self {
        self.assert_status(StatusCode::BAD_REQUEST)
    }

    pub fn assert_not_found(self) -> Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }

    pub fn assert_conflict(self) -> Self {
        self.assert_status(StatusCode::CONFLICT)
    }

    /// 204 with nothing in the body and no `Content-Type`.
    pub fn assert_no_content(self) -> Self {
        let resp = self.assert_status(StatusCode::NO_CONTENT);
        assert!(resp.body.is_empty(), "expected empty body, got: {}", resp.text());
        assert_eq!(resp.header("content-type"), None);
        resp
    }

    /// Assert an `{"error": message}` envelope with the given status.
    pub fn assert_error(self, status: StatusCode, message: &str) -> Self {
        let resp = self.assert_status(status);
        assert_eq!(resp.error_message(), message);
        resp
    }

    /// Assert a 400 validation envelope naming exactly `fields`, in order.
    pub fn assert_validation_failed(self, fields: &[&str]) -> Self {
        let resp = self.assert_error(StatusCode::BAD_REQUEST, "Validation failed");
        let details: Value = resp.json();
        let named: Vec<&str> = details["details"]
            .as_array()
            .map(|items| items.iter().filter_map(|d| d["field"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(named, fields, "body: {details}");
        resp
    }

    /// Assert the value at `pointer` equals `expected`.
    pub fn assert_json(self, pointer: &str, expected: impl Into<Value>) -> Self {
        let expected = expected.into();
        let actual = self.at(pointer);
        assert_eq!(actual, expected, "at {pointer:?}\nbody: {}", self.text());
        self
    }

    /// Assert the array at `pointer` has `len` elements.
    pub fn assert_len(self, pointer: &str, len: usize) -> Self {
        let actual = self.at(pointer).as_array().map(Vec::len);
        assert_eq!(actual, Some(len), "array length at {pointer:?}\nbody: {}", self.text());
        self
    }

    /// The `error` string of an error envelope.
    pub fn error_message(&self) -> String {
        match self.at("/error") {
            Value::String(message) => message,
            other => panic!("expected an error envelope, got {other}\nbody: {}", self.text()),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let name: HeaderName = name.parse().ok()?;
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("body is not the expected JSON: {e}\nbody: {}", self.text()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn at(&self, pointer: &str) -> Value {
        let root: Value = self.json();
        root.pointer(pointer)
            .cloned()
            .unwrap_or_else(|| panic!("nothing at {pointer:?}\nbody: {root}"))
    }
}
