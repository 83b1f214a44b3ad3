use crate::application::use_cases::file_payload::{into_multipart, normalize};
use crate::application::use_cases::request_dispatch::{dispatch, RequestOptions};
use crate::application::use_cases::table_negotiator::{
    finalize, negotiate, upload_raw, ExtraRequestOptions, RAW_UPLOAD_FIELD,
};
use crate::domain::credentials::Credentials;
use crate::domain::error::{AppError, Result};
use crate::domain::file_input::{has_suffix, FileInput};
use crate::domain::http_message::{HttpRequest, HttpResponse};
use crate::domain::portal_config::{
    TouchstoneConfig, TOUCHSTONE_FILE_SUFFIXES, TOUCHSTONE_MAX_BYTES,
};
use crate::domain::upload::DateFormat;
use crate::infrastructure::html;
use crate::infrastructure::http::{
    ReqwestTransport, ScopedSession, Transport, TransportConfig,
};
use std::path::Path;
use tracing::info;

/// Options for [`TouchstoneSession::upload_data`]. Unset urls fall back to the config.
#[derive(Debug, Clone, Default)]
pub struct UploadDataOptions {
    pub date_format: DateFormat,
    pub initial_upload_url: Option<String>,
    pub final_upload_url: Option<String>,
    pub extra: ExtraRequestOptions,
}

/// Touchstone with its login token fetched but not yet logged in.
pub struct TouchstoneClient {
    credentials: Credentials,
    config: TouchstoneConfig,
    session: ScopedSession,
    csrf_token: String,
}

impl TouchstoneClient {
    pub async fn connect(credentials: Credentials, config: TouchstoneConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&TransportConfig {
            timeout_secs: config.timeout_secs,
            ..Default::default()
        })?;
        Self::connect_with_transport(credentials, config, Box::new(transport)).await
    }

    /// Fetches the login form for its `_csrf_token`. The session cookies set by this
    /// page are kept for the login that follows.
    pub async fn connect_with_transport(
        credentials: Credentials,
        config: TouchstoneConfig,
        transport: Box<dyn Transport>,
    ) -> Result<Self> {
        let session = ScopedSession::new(transport, "touchstone");
        credentials.ensure_present()?;

        let login_url = config.resolve(&config.login_url);
        let page = session.send(HttpRequest::get(login_url.as_str())).await?;
        let csrf_token = html::extract_input_value(&page.body, "_csrf_token")?.ok_or_else(|| {
            AppError::ProtocolError(format!("No _csrf_token field on login page {}", login_url))
        })?;

        Ok(Self {
            credentials,
            config,
            session,
            csrf_token,
        })
    }

    fn login_payload(&self) -> Vec<(String, String)> {
        match &self.config.login_payload {
            Some(payload) => payload
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => vec![
                ("_csrf_token".to_string(), self.csrf_token.clone()),
                ("_username".to_string(), self.credentials.username.clone()),
                ("_password".to_string(), self.credentials.password.clone()),
                ("_submit".to_string(), "Log in".to_string()),
            ],
        }
    }

    /// Logs in. A successful login redirects to the portal root; landing anywhere
    /// else (typically back on the login form) means the credentials were refused.
    pub async fn open(self) -> Result<TouchstoneSession> {
        let request = HttpRequest::post(self.config.resolve(&self.config.login_check_url))
            .with_form(self.login_payload())
            .with_headers(self.config.login_headers());
        let response = self.session.send(request).await?;

        if !response.is_success() {
            return Err(AppError::ProtocolError(format!(
                "Non-2XX response ({}) to login",
                response.status
            )));
        }
        if !same_location(&response.url, &self.config.uri) {
            return Err(AppError::AuthenticationError(format!(
                "Incorrect credentials (username: {}, landed on {})",
                self.credentials.username, response.url
            )));
        }

        info!(username = %self.credentials.username, "Logged in to Touchstone");
        Ok(TouchstoneSession {
            session: self.session,
            config: self.config,
        })
    }
}

/// An authenticated Touchstone session. Dropping it closes the connection.
pub struct TouchstoneSession {
    session: ScopedSession,
    config: TouchstoneConfig,
}

impl TouchstoneSession {
    /// Imports a spreadsheet: raw upload, column negotiation, confirmation.
    ///
    /// `filename` must end in xls, xlsx, csv or txt. Without `data` the file is read
    /// from `filename`; otherwise `filename` only names the uploaded part.
    pub async fn upload_data(
        &self,
        filename: &str,
        data: Option<FileInput>,
        options: UploadDataOptions,
    ) -> Result<HttpResponse> {
        if !has_suffix(filename, TOUCHSTONE_FILE_SUFFIXES) {
            return Err(AppError::ConfigurationError(
                "Filetype must be one of: xls, xlsx, csv, txt".to_string(),
            ));
        }

        let part_name = Path::new(filename)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        let input = data.unwrap_or_else(|| FileInput::Path(filename.into()));
        let mut payload = normalize(input, &part_name, TOUCHSTONE_MAX_BYTES)?;
        payload.file_name = part_name;
        let (part, source) = into_multipart(payload, RAW_UPLOAD_FIELD);

        let initial_url = self.config.resolve(
            options
                .initial_upload_url
                .as_deref()
                .unwrap_or(&self.config.initial_upload_url),
        );
        let final_url = self.config.resolve(
            options
                .final_upload_url
                .as_deref()
                .unwrap_or(&self.config.final_upload_url),
        );

        let raw = upload_raw(&self.session, initial_url, part, &options.extra).await;
        drop(source);
        let raw = raw?;

        let table = negotiate(&raw, options.date_format)?;
        finalize(&self.session, final_url, table, &options.extra).await
    }

    /// Ad-hoc authenticated request. Relative urls are joined to the portal root.
    pub async fn request(
        &self,
        method: &str,
        url: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse> {
        dispatch(&self.session, method, self.config.resolve(url), options).await
    }

    pub fn close(self) {
        self.session.close();
    }
}

/// Compares host and path, ignoring scheme and surrounding slashes.
fn same_location(a: &str, b: &str) -> bool {
    fn strip(url: &str) -> &str {
        url.trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_matches('/')
    }
    strip(a) == strip(b)
}
