//! Error type definitions for the gateway

use thiserror::Error;

/// Which upstream call an origin failure happened in.
///
/// The same transport error is reported differently depending on whether the
/// title metadata or the per-part play-URLs were being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginStage {
    VideoInfo,
    PlayUrl,
}

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Client supplied an invalid id or page number
    #[error("{message}")]
    Validation { message: String },

    /// The origin platform could not deliver what was asked for
    #[error("{}: {}", .stage.describe(), .source)]
    Origin {
        stage: OriginStage,
        #[source]
        source: OriginError,
    },

    /// The play-URL response offered no video rendition at all
    #[error("No video stream available for part {part}")]
    NoVideoStream { part: usize },

    /// Manifest text could not be produced
    #[error("Failed to render {document}: {message}")]
    Render { document: String, message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Errors raised by the origin platform client
#[derive(Error, Debug)]
pub enum OriginError {
    /// Transport level failure (DNS, connect, TLS, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-zero status code
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// The API answered `code = 0` without a `data` payload
    #[error("Empty response data from {endpoint}")]
    EmptyData { endpoint: String },

    /// The play-URL response carried no DASH section
    #[error("Failed to get dash info")]
    NoDash,

    /// The title id could not be turned into a request
    #[error("Invalid title id: {id}")]
    InvalidId { id: String },

    /// A configured upstream header is not a legal header value
    #[error("Invalid {name} header value")]
    InvalidHeader { name: &'static str },
}

impl OriginStage {
    pub fn describe(&self) -> &'static str {
        match self {
            OriginStage::VideoInfo => "Failed to fetch video info",
            OriginStage::PlayUrl => "Failed to fetch video playurl",
        }
    }
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Wrap an origin failure with the stage it happened in
    pub fn origin(stage: OriginStage, source: OriginError) -> Self {
        Self::Origin { stage, source }
    }

    /// Create a render error for the named document kind
    pub fn render<D: Into<String>, M: Into<String>>(document: D, message: M) -> Self {
        Self::Render {
            document: document.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_error_message_names_stage_and_cause() {
        let err = AppError::origin(
            OriginStage::VideoInfo,
            OriginError::Api {
                code: -404,
                message: "啥都木有".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "Failed to fetch video info: API error -404: 啥都木有"
        );
    }

    #[test]
    fn test_no_dash_message() {
        let err = AppError::origin(OriginStage::PlayUrl, OriginError::NoDash);
        assert_eq!(
            err.to_string(),
            "Failed to fetch video playurl: Failed to get dash info"
        );
    }
}
