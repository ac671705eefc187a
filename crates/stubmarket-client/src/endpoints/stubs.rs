//! Stub collection endpoints.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use stubmarket_core::StubId;

use super::{data, to_json};
use crate::error::{ApiError, Result};
use crate::gateway::ApiClient;
use crate::request::Request;
use crate::types::{Stub, StubUpdate};

const STUBS: &str = "/api/stubs";
const UPLOAD: &str = "/api/stubs/upload";

/// The current user's stubs, newest first.
///
/// # Errors
///
/// Returns an [`ApiError`] if the request fails or the payload is malformed.
pub async fn list(api: &ApiClient) -> Result<Vec<Stub>> {
    data(api, api.get(Request::new(STUBS)).await?)
}

/// One of the current user's stubs.
///
/// # Errors
///
/// Returns `Http { status: 404 }` if the stub does not exist or belongs to
/// someone else.
pub async fn get(api: &ApiClient, id: StubId) -> Result<Stub> {
    data(api, api.get(Request::new(STUBS).slug(id.to_string())).await?)
}

/// Correct the details of a stub.
///
/// # Errors
///
/// Returns `Http { status: 400 }` with the server message for invalid
/// values (empty title, bad date, unsupported currency).
pub async fn update(api: &ApiClient, id: StubId, changes: &StubUpdate) -> Result<Stub> {
    let request = Request::new(STUBS)
        .slug(id.to_string())
        .json(to_json(api, changes)?);
    data(api, api.put(request).await?)
}

/// Upload a stub image for processing.
///
/// `file_name` must end in `.png`, `.jpg`, or `.jpeg`.
///
/// # Errors
///
/// Returns `Unexpected` for an unsupported file type, and `Http { status: 400 }`
/// if the server rejects the upload.
pub async fn upload(api: &ApiClient, title: &str, file_name: &str, image: Vec<u8>) -> Result<Stub> {
    let mime = image_mime(file_name).ok_or_else(|| {
        api.fail(ApiError::Unexpected(format!("unsupported image type: {file_name}")))
    })?;

    let part = Part::bytes(image)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .map_err(|e| api.fail(ApiError::Unexpected(e.to_string())))?;
    let form = Form::new().text("title", title.to_string()).part("image", part);

    tracing::debug!(title = %title, file_name = %file_name, "Uploading stub");
    data(api, api.post(Request::new(UPLOAD).multipart(form)).await?)
}

fn image_mime(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}
