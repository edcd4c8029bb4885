// Session login
//
// `POST /cgi-bin/luci/api/xqsystem/login` with a form body. A 200 response
// carrying a non-empty `token` authenticates the session; the token is then
// embedded in every API path. There is no logout endpoint in use.

use std::sync::atomic::Ordering;

use reqwest::{Method, StatusCode};
use reqwest::header::HeaderMap;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::auth::LOGIN_LOG_TYPE;
use crate::client::RouterClient;
use crate::error::{Error, preview};
use crate::transport::ResponseBody;

const LOGIN_PATH: &str = "xqsystem/login";

/// Login response shape. Everything else in the body is ignored.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

impl RouterClient {
    /// Authenticate with the stored credentials.
    ///
    /// On success the token is stored and, on the first successful login,
    /// the identity snapshot is derived. On any failure the stored token is
    /// cleared, so the session is unauthenticated afterwards.
    pub async fn login(&self) -> Result<(), Error> {
        let _gate = self.login_gate.lock().await;
        self.login_locked().await
    }

    /// Log in again after a request made at `generation` (see
    /// [`login_generation`](Self::login_generation)) hit an expired session.
    ///
    /// Concurrent callers that saw the same stale session share a single
    /// login: whoever takes the gate first logs in, the rest reuse its
    /// outcome. A shared failed attempt reports [`Error::NotAuthenticated`].
    pub async fn relogin(&self, generation: u64) -> Result<(), Error> {
        let _gate = self.login_gate.lock().await;
        if self.login_generation() != generation {
            debug!("session already renewed by a concurrent login");
            return if self.is_authenticated() {
                Ok(())
            } else {
                Err(Error::NotAuthenticated)
            };
        }
        self.login_locked().await
    }

    /// The login itself. Callers hold `login_gate`.
    async fn login_locked(&self) -> Result<(), Error> {
        let result = self.complete_login().await;
        self.login_attempts.fetch_add(1, Ordering::AcqRel);
        result
    }

    async fn complete_login(&self) -> Result<(), Error> {
        match self.request_token().await {
            Ok(token) => {
                self.set_token(token);
                info!(host = self.host(), "login successful");
                if self.identity.get().is_none() {
                    let identity = self.derive_identity().await;
                    let _ = self.identity.set(identity);
                }
                Ok(())
            }
            Err(e) => {
                self.clear_token();
                warn!(host = self.host(), error = %e, "login failed");
                Err(e)
            }
        }
    }

    async fn request_token(&self) -> Result<String, Error> {
        let url = self.public_url(LOGIN_PATH)?;
        debug!("logging in at {}", url);

        let credentials = self.credentials();
        let form = [
            ("username", credentials.username.as_str()),
            ("logtype", LOGIN_LOG_TYPE),
            ("password", credentials.password.expose_secret()),
        ];

        let resp = self
            .transport()
            .request(Method::POST, url, HeaderMap::new(), Some(form.as_slice()))
            .await?;

        if resp.status != StatusCode::OK {
            return Err(Error::Authentication {
                message: format!(
                    "login failed (HTTP {}): {}",
                    resp.status,
                    preview(&resp.body.to_text())
                ),
            });
        }

        let value = match resp.body {
            ResponseBody::Json(value) => value,
            ResponseBody::Text(body) => {
                return Err(Error::Authentication {
                    message: format!("unexpected login response: {}", preview(&body)),
                });
            }
        };

        let parsed: LoginResponse =
            serde_json::from_value(value).map_err(|e| Error::Authentication {
                message: format!("unexpected login response shape: {e}"),
            })?;

        match parsed.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(Error::Authentication {
                message: parsed
                    .msg
                    .unwrap_or_else(|| "no token in login response".into()),
            }),
        }
    }
}
