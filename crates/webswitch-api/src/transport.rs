// Session configuration and reqwest::Client construction.
//
// Callers build a `ClientConfig` (directly or through webswitch-config)
// and hand it to `SwitchClient`. The core never reads config files.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;

const USER_AGENT: &str = concat!("webswitch/", env!("CARGO_PKG_VERSION"));

/// Retry budget for `save.cgi`.
///
/// Fixed delay, no jitter: the device's save handler is single-threaded and
/// a plain pause is all it needs between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for CommitPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Everything needed to talk to one switch.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Web UI root, e.g. `http://192.168.2.1`.
    pub base_url: Url,
    pub credentials: Credentials,
    /// Issue a `save.cgi` commit after every successful mutation.
    pub autosave: bool,
    pub commit: CommitPolicy,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Shared cookie jar. A fresh one is created when `None`.
    pub cookie_jar: Option<Arc<Jar>>,
}

impl ClientConfig {
    pub fn new(base_url: Url, credentials: Credentials) -> Self {
        Self {
            base_url,
            credentials,
            autosave: false,
            commit: CommitPolicy::default(),
            timeout: Duration::from_secs(30),
            cookie_jar: None,
        }
    }

    /// Parse `base_url` and build a config with default tuning.
    pub fn from_parts(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, Error> {
        let url = Url::parse(base_url)?;
        Ok(Self::new(url, Credentials::new(username, password)))
    }

    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    pub fn with_commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.commit = policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the `reqwest::Client` and return it with the jar it uses.
    ///
    /// The jar is `Arc`-shared and internally synchronized, so concurrent
    /// requests never need an extra lock around it.
    pub(crate) fn build_client(&self) -> Result<(reqwest::Client, Arc<Jar>), Error> {
        let jar = self
            .cookie_jar
            .clone()
            .unwrap_or_else(|| Arc::new(Jar::default()));

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        Ok((http, jar))
    }
}
