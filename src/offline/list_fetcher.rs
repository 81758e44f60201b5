use crate::constants::LICENSE_HEADER;
use crate::errors::{AppError, AppResult};
use crate::models::UpdateManifest;
use reqwest::StatusCode;
use tracing::{debug, info};
use url::Url;

/// Fetches the update manifest from the licensing endpoint.
///
/// Sends a single GET to `base_url` with the license token in the
/// `X-Xray-License` header.
///
/// # Errors
///
/// - `InvalidInput` if the token or URL is empty
/// - `UrlError` if the URL cannot be parsed
/// - `NetworkError` if the request or body read fails
/// - `HttpStatus` if the server answers anything but 200, carrying the status line
/// - `ParseError` if the body is not a valid manifest
pub async fn fetch_manifest(
    client: &reqwest::Client,
    license_token: &str,
    base_url: &str,
) -> AppResult<UpdateManifest> {
    if license_token.trim().is_empty() {
        return Err(AppError::InvalidInput("License token is required".into()));
    }
    if base_url.trim().is_empty() {
        return Err(AppError::InvalidInput("Update list URL is required".into()));
    }
    let url = Url::parse(base_url)?;

    info!(url = %url, "Getting updates");
    let response = client
        .get(url.as_str())
        .header(LICENSE_HEADER, license_token)
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(AppError::HttpStatus {
            status: status.to_string(),
        });
    }

    let body = response.bytes().await?;
    let manifest = parse_manifest(&body)?;
    debug!(
        last_update = manifest.last_update,
        urls = manifest.urls.len(),
        "Update list received"
    );
    Ok(manifest)
}

/// Parses a list endpoint body.
///
/// An empty `urls` array is a valid, empty manifest; a body that is not JSON is an error.
pub fn parse_manifest(body: &[u8]) -> AppResult<UpdateManifest> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::ParseError(format!("Invalid update list response: {e}")))
}
