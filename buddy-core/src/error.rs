use reqwest::StatusCode;
use thiserror::Error;

/// Failure reported by a weather, place-search or location source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to send request to {service}: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} request failed with status {status}: {body}")]
    Status { service: &'static str, status: StatusCode, body: String },

    #[error("Failed to parse {service} response: {source}")]
    Parse {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{service} response is missing {field}")]
    MissingField { service: &'static str, field: &'static str },

    #[error("Unknown time zone '{0}'")]
    UnknownTimeZone(String),

    #[error("No device location available.\nHint: run `buddy configure` and set a home location.")]
    LocationUnavailable,
}

impl SourceError {
    pub(crate) fn missing(service: &'static str, field: &'static str) -> Self {
        SourceError::MissingField { service, field }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
