use crate::domain::error::Result;
use crate::domain::http_message::{HttpMethod, HttpRequest, HttpResponse, MultipartFile};
use crate::infrastructure::http::ScopedSession;

/// Everything a caller can attach to an ad-hoc authenticated request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query string for GET, form body for POST.
    pub payload: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub file: Option<MultipartFile>,
}

/// Sends a GET or POST through an open session. `method` is matched
/// case-insensitively; anything else is refused before a request is built.
pub async fn dispatch(
    session: &ScopedSession,
    method: &str,
    url: String,
    options: RequestOptions,
) -> Result<HttpResponse> {
    let method: HttpMethod = method.parse()?;
    let RequestOptions {
        payload,
        headers,
        cookies,
        file,
    } = options;

    let mut request = HttpRequest::new(method, url)
        .with_headers(headers)
        .with_cookies(cookies);
    request = match method {
        HttpMethod::Get => request.with_query(payload),
        HttpMethod::Post => request.with_form(payload),
    };
    if let Some(file) = file {
        request = request.with_file(file);
    }

    session.send(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::infrastructure::http::mock::MockTransport;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[tokio::test]
    async fn test_get_payload_becomes_query() {
        let mock = MockTransport::new();
        mock.push_response(200, "https://portal.test/list?page=2", "ok");
        let session = ScopedSession::new(Box::new(mock.clone()), "test");

        let options = RequestOptions {
            payload: vec![pair("page", "2")],
            ..Default::default()
        };
        dispatch(&session, "get", "https://portal.test/list".to_string(), options)
            .await
            .unwrap();

        let sent = &mock.requests()[0];
        assert_eq!(sent.method, HttpMethod::Get);
        assert_eq!(sent.query, vec![pair("page", "2")]);
        assert!(sent.form.is_empty());
    }

    #[tokio::test]
    async fn test_post_payload_becomes_form() {
        let mock = MockTransport::new();
        mock.push_response(200, "https://portal.test/save", "ok");
        let session = ScopedSession::new(Box::new(mock.clone()), "test");

        let options = RequestOptions {
            payload: vec![pair("name", "q3")],
            cookies: vec![pair("sid", "abc")],
            ..Default::default()
        };
        dispatch(&session, "POST", "https://portal.test/save".to_string(), options)
            .await
            .unwrap();

        let sent = &mock.requests()[0];
        assert_eq!(sent.form_value("name"), Some("q3"));
        assert_eq!(sent.cookies, vec![pair("sid", "abc")]);
    }

    #[tokio::test]
    async fn test_other_methods_rejected_before_sending() {
        let mock = MockTransport::new();
        let session = ScopedSession::new(Box::new(mock.clone()), "test");

        let err = dispatch(
            &session,
            "PUT",
            "https://portal.test/x".to_string(),
            RequestOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::ConfigurationError(_)));
        assert!(mock.requests().is_empty());
    }
}
