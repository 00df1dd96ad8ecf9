//! HTTP client for the Proxmox API with ticket authentication and automatic
//! refresh.
//!
//! The client adds the `PVEAuthCookie` cookie to every request and the
//! `CSRFPreventionToken` header to write requests. A `401 Unauthorized`
//! response triggers one re-login with the stored credentials followed by a
//! single retry. Every non-2xx response is funneled through the error mapper,
//! so callers only ever see taxonomy errors.

use crate::config::{ProxmoxConfig, RateLimit};
use crate::core::domain::error::{self, BridgeError, BridgeResult};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use url::Url;

/// How long a ticket is trusted before a fresh login. Proxmox tickets live
/// for two hours; refresh early to avoid racing the expiry.
const TICKET_LIFETIME: Duration = Duration::from_secs(2 * 3600 - 300);

/// Per-request bound on the upstream round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct Ticket {
    cookie: String,
    csrf: String,
    obtained: Instant,
}

impl Ticket {
    fn is_expired(&self) -> bool {
        self.obtained.elapsed() >= TICKET_LIFETIME
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    realm: &'a str,
}

#[derive(Deserialize)]
struct LoginData {
    ticket: String,
    #[serde(rename = "CSRFPreventionToken")]
    csrf_token: String,
}

/// Proxmox wraps every response body in a `data` envelope.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Authenticated Proxmox API client.
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base: Url,
    username: String,
    password: String,
    realm: String,
    ticket: RwLock<Option<Ticket>>,
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

impl ApiClient {
    /// Creates a client for the configured Proxmox host. Starts
    /// unauthenticated; the first request performs the login.
    pub fn new(config: &ProxmoxConfig, rate_limit: Option<RateLimit>) -> BridgeResult<Self> {
        let base = Url::parse(&config.base_url()).map_err(|e| {
            BridgeError::validation("proxmox.host", format!("invalid API base URL: {e}"))
        })?;
        Self::with_base_url(base, config, rate_limit)
    }

    /// Creates a client against an explicit base URL (tests point this at a
    /// mock server).
    pub fn with_base_url(
        base: Url,
        config: &ProxmoxConfig,
        rate_limit: Option<RateLimit>,
    ) -> BridgeResult<Self> {
        let http = Client::builder()
            .danger_accept_invalid_certs(!config.verify_ssl)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BridgeError::Upstream {
                status: None,
                message: format!("cannot build HTTP client: {e}"),
            })?;

        let rate_limiter = rate_limit.and_then(|rl| {
            let per_second = NonZeroU32::new(rl.requests_per_second)?;
            let burst = NonZeroU32::new(rl.burst_size)?;
            Some(RateLimiter::direct(
                Quota::per_second(per_second).allow_burst(burst),
            ))
        });

        Ok(Self {
            http,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
            realm: config.realm.clone(),
            ticket: RwLock::new(None),
            rate_limiter,
        })
    }

    /// Performs an authenticated GET request and unwraps the `data` envelope.
    pub async fn get<T>(&self, path: &str) -> BridgeResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.execute(Method::GET, path, None::<&()>).await
    }

    /// Performs an authenticated POST request with a JSON body.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> BridgeResult<T>
    where
        B: Serialize,
        T: serde::de::DeserializeOwned,
    {
        self.execute(Method::POST, path, Some(body)).await
    }

    /// Performs an authenticated POST request without a body.
    pub async fn post_empty<T>(&self, path: &str) -> BridgeResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.execute(Method::POST, path, None::<&()>).await
    }

    /// Performs an authenticated DELETE request.
    pub async fn delete<T>(&self, path: &str) -> BridgeResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.execute(Method::DELETE, path, None::<&()>).await
    }

    async fn execute<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> BridgeResult<T>
    where
        B: Serialize,
        T: serde::de::DeserializeOwned,
    {
        self.ensure_authenticated().await?;

        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let response = self.send(method.clone(), path, body).await?;

        // One refresh-and-retry on an expired or revoked ticket.
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            self.refresh().await?;
            self.send(method, path, body).await?
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error::map_status(status, &text));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| BridgeError::Upstream {
            status: Some(status.as_u16()),
            message: format!("cannot parse response: {e}"),
        })?;
        Ok(envelope.data)
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> BridgeResult<reqwest::Response>
    where
        B: Serialize,
    {
        let url = format!(
            "{}/api2/json/{}",
            self.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let needs_csrf = method != Method::GET;
        let mut builder = self.http.request(method, &url);
        {
            let guard = self.ticket.read().await;
            if let Some(ticket) = guard.as_ref() {
                builder = builder.header("Cookie", format!("PVEAuthCookie={}", ticket.cookie));
                if needs_csrf {
                    builder = builder.header("CSRFPreventionToken", &ticket.csrf);
                }
            }
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(|e| error::map_transport(&e))
    }

    async fn ensure_authenticated(&self) -> BridgeResult<()> {
        let expired = {
            let guard = self.ticket.read().await;
            guard.as_ref().map(Ticket::is_expired).unwrap_or(true)
        };
        if expired {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Presents credentials to `access/ticket` and stores the new ticket.
    async fn refresh(&self) -> BridgeResult<()> {
        let url = format!(
            "{}/api2/json/access/ticket",
            self.base.as_str().trim_end_matches('/')
        );
        let request = LoginRequest {
            username: &self.username,
            password: &self.password,
            realm: &self.realm,
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| error::map_transport(&e))?;

        match response.status() {
            StatusCode::OK => {
                let envelope: Envelope<LoginData> =
                    response.json().await.map_err(|e| BridgeError::Upstream {
                        status: None,
                        message: format!("cannot parse login response: {e}"),
                    })?;
                let mut guard = self.ticket.write().await;
                *guard = Some(Ticket {
                    cookie: envelope.data.ticket,
                    csrf: envelope.data.csrf_token,
                    obtained: Instant::now(),
                });
                tracing::debug!(realm = %self.realm, "refreshed API ticket");
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BridgeError::Auth(
                "credentials rejected by the Proxmox API".to_string(),
            )),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(error::map_status(status, &text))
            }
        }
    }
}
