use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TESTTEXT_MAX_BYTES: usize = 10_000_000;
pub const TOUCHSTONE_MAX_BYTES: usize = 10_485_760;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const TESTTEXT_PATH_SUFFIXES: &[&str] = &["tsv"];
pub const TOUCHSTONE_FILE_SUFFIXES: &[&str] = &["xls", "xlsx", "csv", "txt"];

/// TestText endpoints and page markers.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TestTextConfig {
    pub url: String,
    pub start_uri: String,
    pub login_uri: String,
    pub email_upload_uri: String,
    pub sms_upload_uri: String,
    /// Must appear in the start page body. Empty matches everything.
    pub start_check: String,
    pub login_check: String,
    pub upload_check: String,
    pub max_bytes: usize,
    pub timeout_secs: u64,
    /// Sent with every request of the session.
    pub headers: BTreeMap<String, String>,
}

impl Default for TestTextConfig {
    fn default() -> Self {
        Self {
            url: "https://testtext.com".to_string(),
            start_uri: "/login".to_string(),
            login_uri: "/login".to_string(),
            email_upload_uri: "/upload".to_string(),
            sms_upload_uri: "/uploadsms".to_string(),
            start_check: String::new(),
            login_check: "Start Your Test".to_string(),
            upload_check: "ROLL BACK".to_string(),
            max_bytes: TESTTEXT_MAX_BYTES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            headers: BTreeMap::new(),
        }
    }
}

impl TestTextConfig {
    pub fn endpoint(&self, uri: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), uri)
    }
}

/// Touchstone endpoints. Relative URLs are joined to `uri` with a `/`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TouchstoneConfig {
    pub uri: String,
    pub login_url: String,
    pub login_check_url: String,
    pub initial_upload_url: String,
    pub final_upload_url: String,
    pub timeout_secs: u64,
    /// Replaces the default `_csrf_token`/`_username`/`_password`/`_submit` form.
    pub login_payload: Option<BTreeMap<String, String>>,
    /// Replaces the default browser-like login headers.
    pub headers: Option<BTreeMap<String, String>>,
}

impl Default for TouchstoneConfig {
    fn default() -> Self {
        Self {
            uri: "https://touchstonetests.io".to_string(),
            login_url: "login".to_string(),
            login_check_url: "login_check".to_string(),
            initial_upload_url: "import".to_string(),
            final_upload_url: "ajax-review-columns".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            login_payload: None,
            headers: None,
        }
    }
}

impl TouchstoneConfig {
    /// Joins a relative url to `uri`; absolute http(s) urls pass through.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("https://") || url.starts_with("http://") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.uri.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }

    pub fn login_headers(&self) -> Vec<(String, String)> {
        if let Some(headers) = &self.headers {
            return headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
        }

        let host = self
            .uri
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        vec![
            ("Host".to_string(), host.to_string()),
            ("Origin".to_string(), self.uri.clone()),
            ("Referrer".to_string(), self.resolve(&self.login_url)),
            ("Sec-Fetch-Dest".to_string(), "document".to_string()),
            ("Sec-Fetch-Mode".to_string(), "navigate".to_string()),
            ("Sec-Fetch-Site".to_string(), "same-origin".to_string()),
            ("Sec-Fetch-User".to_string(), "?1".to_string()),
            ("Upgrade-Insecure-Requests".to_string(), "1".to_string()),
        ]
    }
}
