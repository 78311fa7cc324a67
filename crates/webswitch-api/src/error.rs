use thiserror::Error;

/// Top-level error type for the `webswitch-api` crate.
///
/// Every failure an adapter call can produce: transport, session,
/// markup decoding, enum codecs, port resolution, and commit.
/// Nothing here is ever swallowed; callers match on the variant.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Network-level failure (connection refused, DNS, timeout, ...).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The device answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The session's cancellation token fired mid-request.
    #[error("Request cancelled")]
    Cancelled,

    // ── Session ─────────────────────────────────────────────────────
    /// The device redirected to its login page (status 200, marker in body).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Markup ──────────────────────────────────────────────────────
    /// The response could not be parsed as an HTML document at all.
    #[error("HTML parse error: {message}")]
    Parse { message: String },

    /// An expected table, row, input, or selected option was missing.
    #[error("Field not found on {page}: {field}")]
    FieldNotFound { field: String, page: String },

    // ── Domain ──────────────────────────────────────────────────────
    /// Unknown enum label or wire code.
    #[error("Unrecognized {domain} value: {value:?}")]
    Codec { domain: &'static str, value: String },

    /// Port display name or ID not present in the live port table.
    #[error("Port not found: {port}")]
    PortNotFound { port: String },

    /// The device rejected a form submission with an inline alert.
    #[error("Rejected by device: {message}")]
    Rejected { message: String },

    /// Input that cannot be expressed as a device form at all.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    // ── Commit ──────────────────────────────────────────────────────
    /// Saving the running configuration failed on every attempt.
    #[error("Saving configuration failed after {attempts} attempts: {source}")]
    Commit {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns `true` if the device refused the session credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::PortNotFound { .. } | Self::FieldNotFound { .. } => true,
            Self::HttpStatus { status, .. } => *status == 404,
            _ => false,
        }
    }

    pub(crate) fn field_not_found(field: impl Into<String>, page: impl Into<String>) -> Self {
        Self::FieldNotFound {
            field: field.into(),
            page: page.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_error_keeps_last_cause() {
        let err = Error::Commit {
            attempts: 3,
            source: Box::new(Error::HttpStatus {
                status: 500,
                body: "busy".into(),
            }),
        };
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("HTTP 500"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn classification_helpers() {
        let port = Error::PortNotFound {
            port: "Port 99".into(),
        };
        assert!(port.is_not_found());
        assert!(!port.is_transient());

        let status = Error::HttpStatus {
            status: 503,
            body: String::new(),
        };
        assert!(status.is_transient());

        let auth = Error::Authentication {
            message: "login redirect".into(),
        };
        assert!(auth.is_auth_failure());
    }
}
