use reqwest::StatusCode;
use thiserror::Error;

/// Longest backend error body kept for diagnostics.
const MAX_ERROR_BODY: usize = 512;

/// Failure talking to the log-intelligence backend.
///
/// All variants collapse to one user-facing message per operation; the detail only reaches logs.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("could not decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BackendError {
    pub fn status(url: &str, status: StatusCode, body: &str) -> Self {
        let mut body = body.trim().to_string();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
            body.push('…');
        }
        BackendError::Status {
            url: url.to_string(),
            status,
            body,
        }
    }
}

/// Rejection raised locally before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter at least one log line.")]
    NoLines,
}

/// Render an error and its sources as one `outer: inner: root` line for logging.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        out.push_str(": ");
        out.push_str(&e.to_string());
        source = e.source();
    }
    out
}
