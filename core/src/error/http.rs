use std::fmt;

use thiserror::Error;

/// Classification of a failed HTTP exchange with the mothership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Unknown,
}

impl HttpErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mothership unreachable, or it handed back something that is not a task
/// descriptor. Abandons the cycle; nothing is reported.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("fetch http error kind={kind} url={url}: {message}")]
    Transport {
        kind: HttpErrorKind,
        url: String,
        message: String,
    },
    #[error("fetch http error kind=status status={status} url={url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("fetch response from {url} exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },
    #[error("failed to decode task descriptor: {message} | body={body}")]
    Decode { message: String, body: String },
    #[error("task descriptor is missing `{0}`")]
    MissingField(&'static str),
    #[error("malformed task descriptor: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FetchError::Transport {
                kind: HttpErrorKind::Timeout,
                ..
            }
        )
    }
}

/// Mothership unreachable or refused the report. The result is dropped.
#[derive(Error, Debug)]
pub enum PostError {
    #[error("post http error kind={kind} url={url}: {message}")]
    Transport {
        kind: HttpErrorKind,
        url: String,
        message: String,
    },
    #[error("post http error kind=status status={status} url={url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("failed to encode report: {0}")]
    Encode(String),
}
