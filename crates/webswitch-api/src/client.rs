// Switch web UI session
//
// Wraps `reqwest::Client` with the device's cookie pseudo-auth, login
// redirect detection, inline-alert rejection, and the save.cgi commit
// loop. All configuration surfaces (vlan, ports, loop, ...) are
// implemented as inherent methods in `device/` to keep this module
// focused on transport mechanics.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::Method;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::CONTENT_TYPE;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::auth::{Credentials, SessionState};
use crate::error::Error;
use crate::form::FormFields;
use crate::markup::rejection_alert;
use crate::transport::{ClientConfig, CommitPolicy};

/// Page used to probe whether the cookie is accepted.
const SESSION_PROBE_PATH: &str = "/info.cgi";

/// Commit endpoint and its single command.
const SAVE_PATH: &str = "/save.cgi";
const SAVE_CMD: &str = "save";

/// Body marker the save handler prints when flash writing fails.
const SAVE_ERROR_MARKER: &str = "Error saving configuration";

/// Maximum body length echoed back in `HttpStatus` errors.
const BODY_EXCERPT_LEN: usize = 200;

/// Authenticated session against one switch.
///
/// Safe to share behind an `Arc` between concurrently running operations:
/// the HTTP client and the cookie jar are internally synchronized, and
/// no lock serializes unrelated requests. The only lock is the one
/// guarding IGMP per-port updates (see
/// [`configure_port_igmp_snooping`](Self::configure_port_igmp_snooping)).
///
/// Cancellation is per call. The `*_with` variants take a
/// `CancellationToken` that aborts only that request (and its commit);
/// every other method can be bounded with `tokio::time::timeout` or by
/// dropping its future. Cancelling never changes the session state.
pub struct SwitchClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    autosave: bool,
    commit_policy: CommitPolicy,
    cookie_jar: Arc<Jar>,
    state: RwLock<SessionState>,
    /// Serializes the IGMP port table read-modify-write.
    igmp_port_lock: Mutex<()>,
}

impl fmt::Debug for SwitchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchClient")
            .field("base_url", &self.base_url.as_str())
            .field("autosave", &self.autosave)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SwitchClient {
    /// Build a client without touching the network.
    ///
    /// The session starts [`Unauthenticated`](SessionState::Unauthenticated);
    /// the first request authenticates and validates lazily.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let (http, cookie_jar) = config.build_client()?;
        Ok(Self {
            http,
            base_url: config.base_url,
            credentials: config.credentials,
            autosave: config.autosave,
            commit_policy: config.commit,
            cookie_jar,
            state: RwLock::new(SessionState::Unauthenticated),
            igmp_port_lock: Mutex::new(()),
        })
    }

    /// Build, authenticate, and validate in one step.
    pub async fn connect(config: ClientConfig) -> Result<Self, Error> {
        let client = Self::new(config)?;
        client.authenticate();
        client.validate_session().await?;
        Ok(client)
    }

    /// The web UI root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn autosave(&self) -> bool {
        self.autosave
    }

    /// Current position in the session state machine.
    pub fn state(&self) -> SessionState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// The `Cookie` header value the jar currently sends to the device.
    pub fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookie_jar.cookies(&self.base_url)?;
        cookies.to_str().ok().map(String::from)
    }

    pub(crate) fn igmp_port_lock(&self) -> &Mutex<()> {
        &self.igmp_port_lock
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Attach the locally computed `admin` cookie to the jar.
    ///
    /// No request is sent; whether the device accepts the cookie is only
    /// known after [`validate_session`](Self::validate_session).
    pub fn authenticate(&self) {
        if self.state() == SessionState::Rejected {
            return;
        }
        self.cookie_jar
            .add_cookie_str(&self.credentials.cookie_string(), &self.base_url);
        debug!(username = %self.credentials.username, "auth cookie attached");
        self.set_state(SessionState::CookieSet);
    }

    /// Confirm the cookie by loading an authenticated page.
    ///
    /// The device reports a bad cookie with a 200 response whose body
    /// redirects the browser to `/login.cgi`, so the body is what decides.
    pub async fn validate_session(&self) -> Result<(), Error> {
        self.validate_session_with(&CancellationToken::new()).await
    }

    async fn validate_session_with(&self, cancel: &CancellationToken) -> Result<(), Error> {
        if self.state() == SessionState::Unauthenticated {
            self.authenticate();
        }
        let url = self.url(SESSION_PROBE_PATH)?;
        let body = self.send(Method::GET, url, None, cancel).await?;
        self.check_login_redirect(&body)?;
        self.set_state(SessionState::Authenticated);
        info!(base_url = %self.base_url, "session established");
        Ok(())
    }

    /// Make sure the session is usable before a request.
    async fn ensure_session(&self, cancel: &CancellationToken) -> Result<(), Error> {
        match self.state() {
            SessionState::Authenticated => Ok(()),
            SessionState::Rejected => Err(rejected_session()),
            SessionState::Unauthenticated | SessionState::CookieSet => {
                self.validate_session_with(cancel).await
            }
        }
    }

    fn check_login_redirect(&self, body: &str) -> Result<(), Error> {
        if is_login_redirect(body) {
            warn!(base_url = %self.base_url, "device redirected to login page");
            self.set_state(SessionState::Rejected);
            return Err(Error::Authentication {
                message: "device redirected to /login.cgi (credentials rejected)".into(),
            });
        }
        Ok(())
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a CGI path such as `/vlan.cgi?page=static`.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Issue one request against the device.
    ///
    /// `body` is an already urlencoded form. Non-GET requests are
    /// mutations: a bare alert page in response fails the call, and
    /// with autosave enabled a successful one is followed by
    /// [`commit`](Self::commit).
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<String, Error> {
        self.execute_with(method, path, body, &CancellationToken::new())
            .await
    }

    /// [`execute`](Self::execute), aborted with `Error::Cancelled` when
    /// `cancel` fires. The token also covers the autosave commit.
    pub async fn execute_with(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        self.ensure_session(cancel).await?;

        let url = self.url(path)?;
        let is_mutation = method != Method::GET;
        let response = self.send(method, url, body, cancel).await?;
        self.check_login_redirect(&response)?;

        if is_mutation {
            if let Some(message) = rejection_alert(&response) {
                return Err(Error::Rejected { message });
            }
            if self.autosave {
                self.commit_with(cancel).await?;
            }
        }

        Ok(response)
    }

    /// GET a page and return its HTML.
    pub async fn get_page(&self, path: &str) -> Result<String, Error> {
        self.execute(Method::GET, path, None).await
    }

    pub async fn get_page_with(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        self.execute_with(Method::GET, path, None, cancel).await
    }

    /// URL-encode `fields` and POST them to `path`.
    pub async fn submit_form(&self, path: &str, fields: &FormFields) -> Result<String, Error> {
        self.execute(Method::POST, path, Some(fields.encode())).await
    }

    pub async fn submit_form_with(
        &self,
        path: &str,
        fields: &FormFields,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        self.execute_with(Method::POST, path, Some(fields.encode()), cancel)
            .await
    }

    /// Persist the running configuration via `save.cgi`.
    ///
    /// Retries up to the configured number of attempts with a fixed delay.
    /// A network error, a non-2xx status, or the device's "Error saving
    /// configuration" marker all count as a failed attempt. Only this loop
    /// ever resends a save.
    pub async fn commit(&self) -> Result<(), Error> {
        self.commit_with(&CancellationToken::new()).await
    }

    /// [`commit`](Self::commit) that stops retrying (and aborts the
    /// request in flight) once `cancel` fires.
    pub async fn commit_with(&self, cancel: &CancellationToken) -> Result<(), Error> {
        let attempts = self.commit_policy.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.save_once(cancel).await {
                Ok(()) => {
                    debug!(attempt, "configuration saved");
                    return Ok(());
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    warn!(error = %e, attempt, attempts, "saving configuration failed");
                    last_error = Some(e);
                }
            }

            if attempt < attempts {
                tokio::select! {
                    () = cancel.cancelled() => return Err(Error::Cancelled),
                    () = tokio::time::sleep(self.commit_policy.delay) => {}
                }
            }
        }

        Err(Error::Commit {
            attempts,
            source: Box::new(last_error.unwrap_or(Error::Rejected {
                message: "save.cgi never answered".into(),
            })),
        })
    }

    async fn save_once(&self, cancel: &CancellationToken) -> Result<(), Error> {
        let url = self.url(SAVE_PATH)?;
        let body = FormFields::new(SAVE_CMD).encode();
        let response = self.send(Method::POST, url, Some(body), cancel).await?;
        self.check_login_redirect(&response)?;
        if response.contains(SAVE_ERROR_MARKER) {
            return Err(Error::Rejected {
                message: SAVE_ERROR_MARKER.into(),
            });
        }
        Ok(())
    }

    /// Send a single request, racing it against `cancel`.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        debug!("{} {}", method, url);

        let mut builder = self.http.request(method, url);
        if let Some(body) = body {
            builder = builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body);
        }

        let resp = tokio::select! {
            () = cancel.cancelled() => return Err(Error::Cancelled),
            resp = builder.send() => resp?,
        };

        let status = resp.status();
        let text = tokio::select! {
            () = cancel.cancelled() => return Err(Error::Cancelled),
            text = resp.text() => text?,
        };
        trace!(status = status.as_u16(), bytes = text.len(), "response received");

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: excerpt(&text),
            });
        }

        Ok(text)
    }
}

fn rejected_session() -> Error {
    Error::Authentication {
        message: "session was rejected by the device; build a new client".into(),
    }
}

/// Does the body carry the firmware's redirect-to-login script?
pub(crate) fn is_login_redirect(body: &str) -> bool {
    body.contains("location.replace(\"/login.cgi\")")
        || body.contains("location.replace('/login.cgi')")
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LEN).collect()
}
