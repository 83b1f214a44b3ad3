use crate::application::use_cases::file_payload::{into_multipart, normalize};
use crate::application::use_cases::request_dispatch::{dispatch, RequestOptions};
use crate::domain::credentials::Credentials;
use crate::domain::error::{AppError, Result};
use crate::domain::file_input::FileInput;
use crate::domain::http_message::{HttpRequest, HttpResponse};
use crate::domain::portal_config::TestTextConfig;
use crate::domain::upload::{ContentType, UploadResult};
use crate::infrastructure::html;
use crate::infrastructure::http::{
    ReqwestTransport, ScopedSession, Transport, TransportConfig,
};
use tracing::{info, warn};

pub const SYNTHETIC_FILE_NAME: &str = "filename.tsv";
const UPLOAD_FIELD: &str = "file";

/// TestText before login. `open` consumes it and yields a live session.
pub struct TestTextClient {
    credentials: Credentials,
    config: TestTextConfig,
    transport: Box<dyn Transport>,
}

impl TestTextClient {
    pub fn new(credentials: Credentials, config: TestTextConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&TransportConfig {
            timeout_secs: config.timeout_secs,
            default_headers: config
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            ..Default::default()
        })?;
        Ok(Self::with_transport(credentials, config, Box::new(transport)))
    }

    pub fn with_transport(
        credentials: Credentials,
        config: TestTextConfig,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            credentials,
            config,
            transport,
        }
    }

    /// Visits the start page for a CSRF token and logs in with it.
    ///
    /// The transport is closed on every failure path; on success it stays open until
    /// the returned session is dropped or closed.
    pub async fn open(self) -> Result<TestTextSession> {
        let Self {
            credentials,
            config,
            transport,
        } = self;
        let session = ScopedSession::new(transport, "testtext");
        credentials.ensure_present()?;

        let start_url = config.endpoint(&config.start_uri);
        let start = session.send(HttpRequest::get(start_url.as_str())).await?;
        if !start.body.contains(&config.start_check) {
            return Err(AppError::ProtocolError(format!(
                "Unsuccessful session init. Is this the correct URL?: {}",
                config.url
            )));
        }

        let csrf_token = html::extract_input_value(&start.body, "csrf_token")?.unwrap_or_else(|| {
            warn!(url = %start_url, "Start page has no csrf_token field; logging in without one");
            String::new()
        });

        let login = HttpRequest::post(config.endpoint(&config.login_uri)).with_form(vec![
            ("submit".to_string(), "Login".to_string()),
            ("email".to_string(), credentials.username.clone()),
            ("password".to_string(), credentials.password.clone()),
            ("csrf_token".to_string(), csrf_token),
        ]);
        let response = session.send(login).await?;
        if !response.body.contains(&config.login_check) {
            return Err(AppError::AuthenticationError(format!(
                "Unsuccessful login. Check the provided credentials (username: {})",
                credentials.username
            )));
        }

        info!(username = %credentials.username, "Logged in to TestText");
        Ok(TestTextSession { session, config })
    }
}

/// An authenticated TestText session. Dropping it closes the connection.
pub struct TestTextSession {
    session: ScopedSession,
    config: TestTextConfig,
}

impl TestTextSession {
    /// Uploads a TSV file. `max_bytes` overrides the configured limit.
    ///
    /// No formatting checks happen client-side; the portal expects tab separated
    /// values with `YYYY-MM-DD` dates.
    pub async fn upload(
        &self,
        file: FileInput,
        content_type: ContentType,
        max_bytes: Option<usize>,
    ) -> Result<UploadResult> {
        let uri = match content_type {
            ContentType::Email => &self.config.email_upload_uri,
            ContentType::Sms => &self.config.sms_upload_uri,
        };
        let url = self.config.endpoint(uri);
        let max_bytes = max_bytes.unwrap_or(self.config.max_bytes);

        let payload = normalize(file, SYNTHETIC_FILE_NAME, max_bytes)?;
        let bytes = payload.len();
        let (part, source) = into_multipart(payload, UPLOAD_FIELD);

        let request = HttpRequest::post(url.as_str())
            .with_header("Referer", url.as_str())
            .with_file(part);
        let result = self.session.send(request).await;
        drop(source);
        let response = result?;

        if !response.body.contains(&self.config.upload_check) {
            return Err(failure_reason(&response, content_type));
        }

        info!(%content_type, bytes, "Upload accepted by TestText");
        Ok(UploadResult {
            failures: None,
            response,
        })
    }

    /// Ad-hoc authenticated request. Relative urls are joined to the portal root.
    pub async fn request(
        &self,
        method: &str,
        url: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse> {
        let url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            self.config.endpoint(url)
        };
        dispatch(&self.session, method, url, options).await
    }

    pub fn close(self) {
        self.session.close();
    }
}

fn failure_reason(response: &HttpResponse, content_type: ContentType) -> AppError {
    if response.body == "unauthorized" {
        let detail = match content_type {
            ContentType::Sms => " (sms upload might not be permitted)",
            ContentType::Email => "",
        };
        return AppError::AuthenticationError(format!(
            "Unsuccessful upload: unauthorized{}",
            detail
        ));
    }

    let reason = html::extract_alert_text(&response.body)
        .ok()
        .flatten()
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| "Unknown reason.".to_string());
    AppError::UploadRejected(format!("Unsuccessful upload: {}", reason))
}
