//! HTTP implementation of [`Transport`] on top of `reqwest`.
//!
//! A failed response is domain-classified only when the server sent a JSON
//! body with a non-empty `message` string. Network errors, timeouts, other
//! bodies and undecodable success payloads all become transport errors.

use crate::config::ApiConfig;
use crate::transport::{Resource, Transport};
use crate::{Error, RemoteError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::sync::{PoisonError, RwLock};

pub struct HttpTransport {
    client: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| Error::Config(format!("invalid api.base_url {:?}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "api.base_url {:?} cannot carry a path",
                config.base_url
            )));
        }

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url,
            token: RwLock::new(None),
        })
    }

    pub fn url_for(&self, resource: &Resource) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(resource.segments());
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner);
        match token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, resource: &Resource, request: RequestBuilder) -> std::result::Result<Value, RemoteError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            tracing::debug!("Request to {} failed: {}", resource, e);
            RemoteError::transport(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::transport(format!("failed to read body: {}", e)))?;

        if !status.is_success() {
            let err = classify_failure(status, &body);
            tracing::debug!("{} answered {}: {}", resource, status, err);
            return Err(err);
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body)
            .map_err(|e| RemoteError::transport(format!("invalid JSON from {}: {}", resource, e)))
    }
}

/// Map a non-success response to a [`RemoteError`]
pub fn classify_failure(status: StatusCode, body: &[u8]) -> RemoteError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) if !parsed.message.trim().is_empty() => RemoteError::domain(parsed.message),
        _ => RemoteError::transport(format!("unexpected status {}", status)),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, resource: &Resource) -> std::result::Result<Value, RemoteError> {
        let url = self.url_for(resource);
        tracing::debug!("GET {}", url);
        self.send(resource, self.client.get(url)).await
    }

    async fn post(&self, resource: &Resource, body: Value) -> std::result::Result<Value, RemoteError> {
        let url = self.url_for(resource);
        tracing::debug!("POST {}", url);
        self.send(resource, self.client.post(url).json(&body)).await
    }

    fn set_auth_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterDimension;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(base_url: &str) -> HttpTransport {
        HttpTransport::new(&ApiConfig {
            base_url: base_url.into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_urls_join_base_path() {
        let t = transport("http://10.0.0.2:3333");
        assert_eq!(t.url_for(&Resource::Groups).as_str(), "http://10.0.0.2:3333/groups");

        let t = transport("https://api.example.com/v1/");
        assert_eq!(
            t.url_for(&Resource::Users).as_str(),
            "https://api.example.com/v1/users"
        );
    }

    #[test]
    fn test_group_segment_is_encoded() {
        let t = transport("http://localhost:3333");
        let url = t.url_for(&Resource::ExercisesByGroup(FilterDimension::new("bíceps/tríceps")));
        assert_eq!(
            url.as_str(),
            "http://localhost:3333/exercises/bygroup/b%C3%ADceps%2Ftr%C3%ADceps"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpTransport::new(&ApiConfig {
            base_url: "not a url".into(),
            timeout_secs: 5,
        })
        .err()
        .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_message_body_is_domain_error() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"status":"error","message":"Este e-mail já está em uso."}"#.as_bytes(),
        );
        assert_eq!(err, RemoteError::domain("Este e-mail já está em uso."));
    }

    #[test]
    fn test_other_bodies_are_transport_errors() {
        let bodies: [&[u8]; 4] = [
            b"",
            b"<html>Bad Gateway</html>",
            br#"{"error":"x"}"#,
            br#"{"message":"  "}"#,
        ];
        for body in bodies {
            let err = classify_failure(StatusCode::BAD_GATEWAY, body);
            assert!(matches!(err, RemoteError::Transport(_)), "{:?}", err);
        }
    }

    #[tokio::test]
    async fn test_failed_response_with_message_is_domain_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": "error",
                "message": "Este e-mail já está em uso."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let t = transport(&server.uri());
        let err = t
            .post(&Resource::Users, json!({"name": "Ana"}))
            .await
            .unwrap_err();
        assert_eq!(err, RemoteError::domain("Este e-mail já está em uso."));
    }

    #[tokio::test]
    async fn test_failed_response_without_message_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/groups"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = transport(&server.uri()).get(&Resource::Groups).await.unwrap_err();
        assert!(matches!(err, RemoteError::Transport(_)), "{:?}", err);
        assert_eq!(err.domain_message(), None);
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let payload = transport(&server.uri())
            .post(&Resource::Users, json!({}))
            .await
            .unwrap();
        assert_eq!(payload, Value::Null);
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_string("costas,ombro"))
            .mount(&server)
            .await;

        let err = transport(&server.uri()).get(&Resource::Groups).await.unwrap_err();
        assert!(matches!(err, RemoteError::Transport(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_bearer_token_follows_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["costas"])))
            .mount(&server)
            .await;

        let t = transport(&server.uri());
        t.get(&Resource::Groups).await.unwrap();
        t.set_auth_token(Some("jwt-abc".into()));
        let payload = t.get(&Resource::Groups).await.unwrap();
        assert_eq!(payload, json!(["costas"]));
        t.set_auth_token(None);
        t.get(&Resource::Groups).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let auth: Vec<Option<String>> = requests
            .iter()
            .map(|r| {
                r.headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .collect();
        assert_eq!(auth, vec![None, Some("Bearer jwt-abc".to_string()), None]);
    }
}
