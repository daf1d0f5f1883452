//! Authenticated, retrying HTTP transport against one management controller
//!
//! One client per host per operation. Sessions are never shared across hosts
//! and the underlying connection pool is disabled entirely: embedded
//! firmware HTTP stacks routinely leave a socket unusable after an error, so
//! every attempt negotiates a fresh TCP/TLS connection.

use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{ConnectionConfig, Credentials};
use crate::constants::limits;
use crate::errors::OperationError;
use crate::redfish::dialect::ControllerDialect;

/// Minimal view of one HTTP exchange. The body is kept as text because a
/// rebooting controller frequently truncates it mid-stream; parsing is the
/// caller's decision.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub location: Option<String>,
    pub auth_token: Option<String>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Authenticated handle to one controller. Token session when the firmware
/// supports it, per-request basic auth otherwise.
#[derive(Debug, Clone, Default)]
struct Session {
    token: Option<String>,
    location: Option<String>,
}

pub struct RedfishClient {
    host: String,
    base_url: String,
    http: Client,
    credentials: Credentials,
    connection: ConnectionConfig,
    dialect: Arc<dyn ControllerDialect>,
    session: Option<Session>,
    generation: Option<u8>,
}

impl RedfishClient {
    pub fn new(
        host: &str,
        credentials: Credentials,
        connection: ConnectionConfig,
        dialect: Arc<dyn ControllerDialect>,
    ) -> Result<Self, OperationError> {
        // Hosts are normally bare addresses; a full URL is accepted so
        // non-TLS endpoints can be addressed explicitly.
        let base_url = if host.contains("://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host)
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(connection.timeout_seconds))
            .danger_accept_invalid_certs(!connection.verify_ssl)
            // Never reuse a connection; see module docs.
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| OperationError::Transport {
                host: host.to_string(),
                attempts: 0,
                detail: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            host: host.to_string(),
            base_url,
            http,
            credentials,
            connection,
            dialect,
            session: None,
            generation: None,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn dialect(&self) -> Arc<dyn ControllerDialect> {
        self.dialect.clone()
    }

    /// Open an authenticated session. Prefers a token session; firmware
    /// without a session service falls back to per-request basic auth.
    pub async fn login(&mut self) -> Result<(), OperationError> {
        if self.session.is_some() {
            return Ok(());
        }

        let path = self.dialect.session_path().to_string();
        let body = json!({
            "UserName": self.credentials.username,
            "Password": self.credentials.password(),
        });

        let resp = self.execute(Method::POST, &path, Some(&body), false).await?;

        if resp.is_success() {
            if resp.auth_token.is_none() {
                debug!("Session on {} returned no token, using basic auth", self.host);
            }
            self.session = Some(Session {
                token: resp.auth_token,
                location: resp.location,
            });
            info!("Session established on {}", self.host);
            return Ok(());
        }

        if resp.status == 404 || resp.status == 405 {
            debug!(
                "No session service on {} (HTTP {}), using basic auth",
                self.host, resp.status
            );
            self.session = Some(Session::default());
            return Ok(());
        }

        Err(OperationError::Protocol {
            host: self.host.clone(),
            detail: format!("session login returned HTTP {}", resp.status),
        })
    }

    /// Tear down the session. Best-effort on every exit path: a controller
    /// that is rebooting will reject this and that is fine.
    pub async fn logout(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let Some(location) = session.location else {
            return;
        };

        let url = self.absolute_url(&location);
        let mut request = self.http.request(Method::DELETE, &url);
        if let Some(token) = &session.token {
            request = request.header("X-Auth-Token", token);
        } else {
            request = request
                .basic_auth(&self.credentials.username, Some(self.credentials.password()));
        }

        match request.send().await {
            Ok(resp) => debug!("Session on {} closed (HTTP {})", self.host, resp.status()),
            Err(e) => debug!("Session teardown on {} failed: {}", self.host, e),
        }
    }

    pub async fn get(&mut self, path: &str) -> Result<HttpResponse, OperationError> {
        self.execute(Method::GET, path, None, true).await
    }

    pub async fn post_json(
        &mut self,
        path: &str,
        body: &Value,
    ) -> Result<HttpResponse, OperationError> {
        self.execute(Method::POST, path, Some(body), true).await
    }

    /// Read the manager base resource. Used for generation detection and as
    /// the post-reboot reachability probe.
    pub async fn fetch_manager(&mut self) -> Result<HttpResponse, OperationError> {
        let path = self.dialect.manager_path().to_string();
        self.get(&path).await
    }

    /// Detect the controller generation from the manager model string,
    /// cached for the lifetime of this client.
    pub async fn ensure_generation(&mut self) -> Result<u8, OperationError> {
        if let Some(generation) = self.generation {
            return Ok(generation);
        }

        let resp = self.fetch_manager().await?;
        if !resp.is_success() {
            return Err(OperationError::Protocol {
                host: self.host.clone(),
                detail: format!("manager resource returned HTTP {}", resp.status),
            });
        }

        let model = resp
            .json()
            .as_ref()
            .and_then(|doc| doc.get("Model").and_then(Value::as_str))
            .unwrap_or("")
            .to_string();
        let generation = self.dialect.generation_from_model(&model);
        info!(
            "Detected controller generation {} on {} (model: {})",
            generation, self.host, model
        );
        self.generation = Some(generation);
        Ok(generation)
    }

    /// Execute one logical request under the retry policy. Connection
    /// errors, timeouts, 5xx and 429 are retried with backoff on a fresh
    /// connection; 401/403 fail immediately; everything else is returned to
    /// the caller untouched.
    async fn execute(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        use_auth: bool,
    ) -> Result<HttpResponse, OperationError> {
        let budget = self.connection.retries + 1;
        let mut last_detail = String::new();

        for attempt in 1..=budget {
            debug!(
                "  {} {}{} (attempt {}/{})",
                method, self.base_url, path, attempt, budget
            );

            match self.send_once(method.clone(), path, body, use_auth).await {
                Ok(resp) => {
                    if resp.status == 401 || resp.status == 403 {
                        return Err(OperationError::Auth {
                            host: self.host.clone(),
                        });
                    }
                    if resp.status == 429 || resp.status >= 500 {
                        last_detail = format!(
                            "HTTP {}: {}",
                            resp.status,
                            resp.body.chars().take(300).collect::<String>()
                        );
                    } else {
                        return Ok(resp);
                    }
                }
                Err(detail) => last_detail = detail,
            }

            if attempt < budget {
                let delay = self.backoff(attempt);
                warn!(
                    "  Request to {} failed (attempt {}/{}), retrying in {}s: {}",
                    self.host,
                    attempt,
                    budget,
                    delay.as_secs(),
                    last_detail
                );
                sleep(delay).await;
            }
        }

        Err(OperationError::Transport {
            host: self.host.clone(),
            attempts: budget,
            detail: last_detail,
        })
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        use_auth: bool,
    ) -> Result<HttpResponse, String> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);

        if use_auth {
            match self.session.as_ref().and_then(|s| s.token.as_ref()) {
                Some(token) => request = request.header("X-Auth-Token", token),
                None => {
                    request = request
                        .basic_auth(&self.credentials.username, Some(self.credentials.password()))
                }
            }
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let resp = request.send().await.map_err(|e| e.to_string())?;

        let status = resp.status();
        let location = header_string(&resp, reqwest::header::LOCATION);
        let auth_token = header_string(&resp, "X-Auth-Token");
        let body = resp.text().await.map_err(|e| e.to_string())?;

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
            location,
            auth_token,
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.connection.retry_delay_seconds;
        let delay = base.saturating_mul(1u64 << (attempt - 1).min(16));
        Duration::from_secs(delay.min(limits::MAX_BACKOFF_SECONDS))
    }

    fn absolute_url(&self, location: &str) -> String {
        if location.contains("://") {
            location.to_string()
        } else {
            format!("{}{}", self.base_url, location)
        }
    }
}

fn header_string<K>(resp: &reqwest::Response, key: K) -> Option<String>
where
    K: reqwest::header::AsHeaderName,
{
    resp.headers()
        .get(key)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
