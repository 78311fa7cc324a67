use secrecy::{ExposeSecret, SecretString};

/// Name of the cookie the switch firmware checks on every CGI request.
pub const AUTH_COOKIE_NAME: &str = "admin";

/// Username/password pair for the switch's web UI.
///
/// The firmware never issues a session token. Instead the browser-side
/// login script hashes the credential pair into the `admin` cookie, and
/// every CGI compares that cookie against its own hash. We do the same
/// computation locally.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// The `admin` cookie value: lowercase hex MD5 of `username ‖ password`.
    ///
    /// Deterministic, so the same pair always yields the same cookie and
    /// nothing needs to be refreshed mid-session.
    pub fn auth_cookie_value(&self) -> String {
        let mut keyed = String::with_capacity(self.username.len() + 32);
        keyed.push_str(&self.username);
        keyed.push_str(self.password.expose_secret());
        format!("{:x}", md5::compute(keyed.as_bytes()))
    }

    /// Full `Set-Cookie`-style string for the cookie jar.
    pub(crate) fn cookie_string(&self) -> String {
        format!("{AUTH_COOKIE_NAME}={}; Path=/", self.auth_cookie_value())
    }
}

/// Lifecycle of a [`SwitchClient`](crate::SwitchClient) session.
///
/// `Rejected` is terminal: the cookie is never refreshed, so a rejected
/// session must be replaced by constructing a new client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Client built, no cookie in the jar yet.
    Unauthenticated,
    /// Cookie attached but not yet confirmed by the device.
    CookieSet,
    /// The device served an authenticated page with this cookie.
    Authenticated,
    /// The device answered with its login redirect.
    Rejected,
}
