use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("dns failure: {0}")]
    Dns(String),

    #[error("tls error: {0}")]
    Tls(String),

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("request timeout")]
    RequestTimeout,

    #[error("too many redirects")]
    RedirectLoop,

    #[error("http error {status}")]
    Http {
        status: reqwest::StatusCode,
        retriable: bool,
    },

    #[error("body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),

    #[error("charset error: {0}")]
    Charset(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("unknown: {0}")]
    Unknown(String),
}

impl FetchError {
    pub fn should_retry(&self) -> bool {
        match self {
            // Fatal errors - don't retry
            Self::InvalidUrl(_) => false,
            Self::UnsupportedScheme(_) => false,
            Self::BodyTooLarge(_) => false,
            Self::UnsupportedContentType(_) => false,
            Self::Charset(_) => false,
            Self::Cancelled => false,
            Self::Http { retriable, .. } => *retriable,

            // Temporary errors - retry
            Self::Dns(_) => true,
            Self::Tls(_) => true,
            Self::ConnectTimeout => true,
            Self::RequestTimeout => true,
            Self::RedirectLoop => true,
            Self::Io(_) => true,
            Self::Unknown(_) => true,
        }
    }

    /// Whether the failure is the caller's input rather than the network.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidUrl(_) | Self::UnsupportedScheme(_))
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            }
        } else if err.is_redirect() {
            Self::RedirectLoop
        } else if let Some(status) = err.status() {
            Self::Http {
                status,
                retriable: status.is_server_error(),
            }
        } else if err.is_connect() {
            let message = err.to_string();
            if message.contains("certificate") || message.contains("tls") {
                Self::Tls(message)
            } else {
                Self::Dns(message)
            }
        } else if err.is_request() {
            Self::Dns(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Io(err.to_string())
        } else {
            Self::Unknown(err.to_string())
        }
    }
}
