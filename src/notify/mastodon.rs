use anyhow::{Context, Result};
use reqwest::{Client, Request};
use std::time::Duration;
use uuid::Uuid;

use super::{DeliveryOutcome, StatusPayload, StatusPublisher};
use crate::config::ServerConfig;

pub const STATUSES_PATH: &str = "/api/v1/statuses";
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Posts statuses to a Mastodon-compatible server.
#[derive(Clone)]
pub struct MastodonClient {
    endpoint: String,
    access_token: String,
    client: Client,
}

impl MastodonClient {
    pub fn new(cfg: &ServerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building mastodon http client")?;
        Ok(Self {
            endpoint: format!("{}{}", cfg.host.trim_end_matches('/'), STATUSES_PATH),
            access_token: cfg.access_token.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the POST for one status. Every call gets a fresh idempotency key.
    pub fn build_request(&self, status: &StatusPayload) -> Result<Request> {
        self.client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .header(IDEMPOTENCY_KEY_HEADER, Uuid::new_v4().to_string())
            .form(status)
            .build()
            .context("building status request")
    }

    /// Send exactly once.
    pub async fn send(&self, status: &StatusPayload) -> DeliveryOutcome {
        let req = match self.build_request(status) {
            Ok(r) => r,
            Err(e) => return DeliveryOutcome::Transport(format!("{e:#}")),
        };
        match self.client.execute(req).await {
            Ok(rsp) => {
                let code = rsp.status();
                if code.is_success() {
                    DeliveryOutcome::Accepted {
                        status: code.as_u16(),
                    }
                } else {
                    DeliveryOutcome::Rejected {
                        status: code.as_u16(),
                    }
                }
            }
            Err(e) => DeliveryOutcome::Transport(e.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl StatusPublisher for MastodonClient {
    async fn publish(&self, status: &StatusPayload) -> DeliveryOutcome {
        self.send(status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;

    fn client() -> MastodonClient {
        MastodonClient::new(&ServerConfig {
            host: "https://social.example.test/".into(),
            access_token: "tok123".into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn payload() -> StatusPayload {
        StatusPayload {
            status: "Hello!\nworld & more\n\nhttps://x.test/?a=1".into(),
            visibility: "public".into(),
            language: "en".into(),
        }
    }

    #[test]
    fn targets_statuses_endpoint_with_post() {
        let req = client().build_request(&payload()).unwrap();
        assert_eq!(req.method(), reqwest::Method::POST);
        assert_eq!(
            req.url().as_str(),
            "https://social.example.test/api/v1/statuses"
        );
    }

    #[test]
    fn authorization_is_bearer_token() {
        let req = client().build_request(&payload()).unwrap();
        assert_eq!(req.headers()[AUTHORIZATION], "Bearer tok123");
    }

    #[test]
    fn idempotency_key_is_fresh_per_request() {
        let c = client();
        let a = c.build_request(&payload()).unwrap();
        let b = c.build_request(&payload()).unwrap();
        let ka = a.headers()[IDEMPOTENCY_KEY_HEADER].to_str().unwrap().to_string();
        let kb = b.headers()[IDEMPOTENCY_KEY_HEADER].to_str().unwrap().to_string();
        assert!(!ka.is_empty());
        assert_ne!(ka, kb);
    }

    #[test]
    fn body_is_form_encoded() {
        let req = client().build_request(&payload()).unwrap();
        assert_eq!(
            req.headers()[reqwest::header::CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        let body = req.body().and_then(|b| b.as_bytes()).unwrap();
        let body = std::str::from_utf8(body).unwrap();
        assert_eq!(
            body,
            "status=Hello%21%0Aworld+%26+more%0A%0Ahttps%3A%2F%2Fx.test%2F%3Fa%3D1&visibility=public&language=en"
        );
    }
}
