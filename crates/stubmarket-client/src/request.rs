//! Request descriptions passed to the gateway verbs.

use reqwest::multipart::Form;
use serde_json::Value;

/// Request payload.
#[derive(Debug)]
pub enum Body {
    /// A JSON document.
    Json(Value),
    /// A multipart form (file uploads).
    Multipart(Form),
}

/// A request against the API, relative to a base URL.
///
/// # Example
///
/// ```
/// use stubmarket_client::Request;
///
/// let request = Request::new("/api/marketplace/listings")
///     .slug("42")
///     .query("status", "active");
/// assert_eq!(
///     request.url("http://localhost:5000"),
///     "http://localhost:5000/api/marketplace/listings/42"
/// );
/// ```
#[derive(Debug)]
pub struct Request {
    resource: String,
    slug: Option<String>,
    query: Vec<(String, String)>,
    body: Option<Body>,
    base_url: Option<String>,
}

impl Request {
    /// Start a request for `resource` (e.g., "/api/stubs").
    #[must_use]
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            slug: None,
            query: Vec::new(),
            body: None,
            base_url: None,
        }
    }

    /// Append `/<slug>` to the resource path. Empty slugs are ignored.
    #[must_use]
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        self.slug = (!slug.is_empty()).then_some(slug);
        self
    }

    /// Add a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Send `value` as a JSON body.
    #[must_use]
    pub fn json(mut self, value: Value) -> Self {
        self.body = Some(Body::Json(value));
        self
    }

    /// Send `form` as a multipart body.
    #[must_use]
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = Some(Body::Multipart(form));
        self
    }

    /// Send this request to `base_url` instead of the configured API base.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// The full URL, using `default_base` unless the request overrides it.
    #[must_use]
    pub fn url(&self, default_base: &str) -> String {
        let base = self.base_url.as_deref().unwrap_or(default_base);
        let base = base.trim_end_matches('/');
        let separator = if self.resource.starts_with('/') { "" } else { "/" };

        match &self.slug {
            Some(slug) => format!("{base}{separator}{}/{slug}", self.resource),
            None => format!("{base}{separator}{}", self.resource),
        }
    }

    /// Query parameters in insertion order.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Take the body out of the request.
    pub(crate) fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }
}
