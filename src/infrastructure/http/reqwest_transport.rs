use super::{Transport, TransportConfig};
use crate::domain::error::{AppError, Result};
use crate::domain::http_message::{HttpMethod, HttpRequest, HttpResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::sync::Mutex;
use std::time::Duration;

pub struct ReqwestTransport {
    client: Mutex<Option<Client>>,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(header_map(&config.default_headers)?)
            .build()
            .map_err(|e| AppError::TransportError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Mutex::new(Some(client)),
        })
    }

    fn client(&self) -> Result<Client> {
        self.client
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| AppError::TransportError("Session is already closed".to_string()))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let client = self.client()?;
        let HttpRequest {
            method,
            url,
            query,
            form,
            headers,
            cookies,
            file,
        } = request;

        let mut builder = match method {
            HttpMethod::Get => client.get(&url),
            HttpMethod::Post => client.post(&url),
        };

        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if !headers.is_empty() {
            builder = builder.headers(header_map(&headers)?);
        }
        if !cookies.is_empty() {
            let cookie = cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(COOKIE, cookie);
        }

        builder = match file {
            Some(file) => {
                let mut multipart = Form::new();
                for (key, value) in form {
                    multipart = multipart.text(key, value);
                }
                let part = Part::bytes(file.content).file_name(file.file_name);
                builder.multipart(multipart.part(file.field, part))
            }
            None if !form.is_empty() => builder.form(&form),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::TransportError(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::TransportError(format!("Failed to read response body: {}", e)))?;

        Ok(HttpResponse {
            status,
            url: final_url,
            body,
        })
    }

    fn close(&self) {
        self.client.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::ConfigurationError(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::ConfigurationError(format!("Invalid value for header '{}': {}", name, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_map_rejects_bad_names() {
        let bad = vec![("Bad Header".to_string(), "x".to_string())];
        assert!(matches!(
            header_map(&bad),
            Err(AppError::ConfigurationError(_))
        ));
    }

    #[tokio::test]
    async fn test_send_after_close_fails_without_network() {
        let transport = ReqwestTransport::new(&TransportConfig::default()).unwrap();
        transport.close();
        let err = transport
            .send(HttpRequest::get("http://127.0.0.1:9/unreachable"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TransportError(_)));
        assert!(err.to_string().contains("closed"));
    }
}
