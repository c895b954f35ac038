use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity taken from the `X-User-ID` header.
///
/// Never rejects: handlers decide whether a missing identity is an error.
/// Blank or non-UTF-8 values count as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub Option<String>);

impl UserId {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        Ok(UserId(user_id))
    }
}
