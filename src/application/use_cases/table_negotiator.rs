//! Touchstone's two-phase import.
//!
//! The raw file goes up first; Touchstone answers with a review page holding its guess
//! for every column. That guess is read back and posted, unchanged, to finish the
//! import. The steps only run forward: [`upload_raw`] yields a [`RawUpload`],
//! [`negotiate`] turns it into a [`TableStructure`], [`finalize`] consumes that.

use crate::domain::error::{AppError, Result};
use crate::domain::http_message::{HttpRequest, HttpResponse, MultipartFile};
use crate::domain::upload::{DateFormat, TableStructure};
use crate::infrastructure::html;
use crate::infrastructure::http::ScopedSession;
use tracing::{info, warn};

pub const RAW_UPLOAD_FIELD: &str = "fileToUpload";

/// Headers and cookies added to both import requests.
#[derive(Debug, Clone, Default)]
pub struct ExtraRequestOptions {
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
}

/// The server accepted the raw file and assigned it an id.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub file_id: String,
    pub response: HttpResponse,
}

pub async fn upload_raw(
    session: &ScopedSession,
    url: String,
    file: MultipartFile,
    extra: &ExtraRequestOptions,
) -> Result<RawUpload> {
    let file_name = file.file_name.clone();
    let request = HttpRequest::post(url)
        .with_file(file)
        .with_headers(extra.headers.clone())
        .with_cookies(extra.cookies.clone());
    let response = session.send(request).await?;

    let file_id = if response.is_success() {
        file_id_from_url(&response.url)
    } else {
        None
    };
    let Some(file_id) = file_id else {
        return Err(AppError::ProtocolError(format!(
            "Invalid response to raw upload (status {}, url {}):\n\n{}",
            response.status, response.url, response.body
        )));
    };

    info!(file_name = %file_name, file_id = %file_id, "Raw file accepted");
    Ok(RawUpload { file_id, response })
}

/// Reads the server's column guesses off the review page.
pub fn negotiate(raw: &RawUpload, date_format: DateFormat) -> Result<TableStructure> {
    let columns = html::parse_column_guesses(&raw.response.body)?;
    let table = TableStructure {
        file_id: raw.file_id.clone(),
        date_format,
        columns,
    };

    let unguessed = table.unguessed_columns();
    if unguessed > 0 {
        warn!(
            file_id = %table.file_id,
            unguessed,
            "Touchstone could not identify some columns; they will be left unmapped"
        );
    }
    Ok(table)
}

pub async fn finalize(
    session: &ScopedSession,
    url: String,
    table: TableStructure,
    extra: &ExtraRequestOptions,
) -> Result<HttpResponse> {
    let request = HttpRequest::post(url)
        .with_form(table.to_form())
        .with_headers(extra.headers.clone())
        .with_cookies(extra.cookies.clone());
    let response = session.send(request).await?;

    if !response.is_success() {
        return Err(AppError::ProtocolError(format!(
            "Non-2XX response ({}). Is your input data in the correct format?",
            response.status
        )));
    }

    info!(
        file_id = %table.file_id,
        columns = table.columns.len(),
        "Column structure confirmed"
    );
    Ok(response)
}

/// The `file_id` query parameter of the URL the raw upload redirected to.
pub fn file_id_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "file_id")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
