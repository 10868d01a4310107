use std::{error::Error as StdError, fmt};

use backtrace::Backtrace;
use http::StatusCode;
use thiserror::Error;

pub trait ErrorCode: StdError + 'static {
    fn code(&self) -> (StatusCode, &'static str);
}

#[derive(Error, Debug)]
pub enum Code {
    #[error(transparent)]
    Any(#[from] anyhow::Error),
    #[error("Not found. {0}")]
    NotFound(String),
    #[error("Invalid values. {0}")]
    InvalidValues(String),
    #[error("Malformed key store. {0}")]
    MalformedKeyStore(String),
    #[error("No usable signing key. {0}")]
    NoUsableKey(String),
    #[error("Invalid signature. {0}")]
    InvalidSignature(String),
    #[error("Malformed token. {0}")]
    MalformedToken(String),
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Denied")]
    Denied,
}

impl ErrorCode for Code {
    fn code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Any(_) => (StatusCode::INTERNAL_SERVER_ERROR, "1010001"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "1010002"),
            Self::InvalidValues(_) => (StatusCode::BAD_REQUEST, "1010003"),
            Self::MalformedKeyStore(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "1010004")
            }
            Self::NoUsableKey(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "1010005")
            }
            Self::InvalidSignature(_) => (StatusCode::UNAUTHORIZED, "1010006"),
            Self::MalformedToken(_) => (StatusCode::BAD_REQUEST, "1010007"),
            Self::InvalidRefreshToken => (StatusCode::BAD_REQUEST, "1010008"),
            Self::Denied => (StatusCode::FORBIDDEN, "1010009"),
        }
    }
}

pub struct WithBacktrace {
    source: Code,
    backtrace: Backtrace,
}

impl WithBacktrace {
    pub fn code(&self) -> &Code {
        &self.source
    }

    pub fn status(&self) -> StatusCode {
        self.source.code().0
    }
}

impl fmt::Debug for WithBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithBacktrace")
            .field("source", &self.source)
            .field("backtrace", &self.backtrace)
            .finish()
    }
}

impl fmt::Display for WithBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl StdError for WithBacktrace {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

impl From<Code> for WithBacktrace {
    fn from(code: Code) -> Self {
        WithBacktrace {
            source: code,
            backtrace: Backtrace::new(),
        }
    }
}

impl From<WithBacktrace> for Code {
    fn from(value: WithBacktrace) -> Self {
        value.source
    }
}

impl PartialEq for WithBacktrace {
    fn eq(&self, other: &Self) -> bool {
        let (_, src_code) = self.source.code();
        let (_, dst_code) = other.source.code();
        src_code == dst_code
    }
}

#[inline]
pub fn any<E: StdError>(err: E) -> WithBacktrace {
    Code::Any(anyhow::anyhow!("{}", err.to_string())).into()
}

#[inline]
pub fn anyhow(err: anyhow::Error) -> WithBacktrace {
    Code::Any(err).into()
}

#[inline]
pub fn not_found<S: ToString + ?Sized>(err: &S) -> WithBacktrace {
    Code::NotFound(err.to_string()).into()
}

#[inline]
pub fn invalid_values<S: ToString + ?Sized>(err: &S) -> WithBacktrace {
    Code::InvalidValues(err.to_string()).into()
}

#[inline]
pub fn malformed_key_store<S: ToString + ?Sized>(err: &S) -> WithBacktrace {
    Code::MalformedKeyStore(err.to_string()).into()
}

#[inline]
pub fn no_usable_key<S: ToString + ?Sized>(err: &S) -> WithBacktrace {
    Code::NoUsableKey(err.to_string()).into()
}

#[inline]
pub fn invalid_signature<S: ToString + ?Sized>(err: &S) -> WithBacktrace {
    Code::InvalidSignature(err.to_string()).into()
}

#[inline]
pub fn malformed_token<S: ToString + ?Sized>(err: &S) -> WithBacktrace {
    Code::MalformedToken(err.to_string()).into()
}

#[inline]
pub fn invalid_refresh_token() -> WithBacktrace {
    Code::InvalidRefreshToken.into()
}

#[inline]
pub fn denied() -> WithBacktrace {
    Code::Denied.into()
}

#[cfg(feature = "axum-resp")]
mod axum {
    use axum::response::IntoResponse;
    use serde_json::json;

    use super::ErrorCode;

    impl IntoResponse for super::WithBacktrace {
        fn into_response(self) -> axum::response::Response {
            tracing::error!("{:?}", self);

            let (status_code, code) = self.source.code();

            let payload = json!({
                "code": code,
                "message": self.to_string(),
            });

            (status_code, axum::Json(payload)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_follows_code() {
        assert_eq!(denied(), denied());
        assert_eq!(invalid_values("a"), invalid_values("b"));
        assert_ne!(invalid_values("a"), malformed_token("a"));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(invalid_values("scope").status(), StatusCode::BAD_REQUEST);
        assert_eq!(denied().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            invalid_signature("bad").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            no_usable_key("empty").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(matches!(
            Code::from(invalid_refresh_token()),
            Code::InvalidRefreshToken
        ));
    }
}
