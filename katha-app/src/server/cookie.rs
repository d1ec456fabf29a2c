//! The `katha_session` cookie.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use super::state::SessionId;

/// Cookie naming the visitor's story session.
pub const SESSION_COOKIE: &str = "katha_session";

/// The visitor's session id, read from the request or freshly assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCookie {
    /// Session id.
    pub id: SessionId,
    /// `true` when the request carried no valid cookie.
    pub fresh: bool,
}

impl SessionCookie {
    /// Find the session id in a `Cookie` header value.
    #[must_use]
    pub fn parse(header: &str) -> Option<SessionId> {
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
    }

    /// Attach `Set-Cookie` to `response` when the id was just assigned.
    pub fn apply(self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.fresh {
            let cookie = format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id);
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SessionCookie {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let existing = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(Self::parse);

        Ok(existing.map_or_else(
            || Self {
                id: Uuid::new_v4(),
                fresh: true,
            },
            |id| Self { id, fresh: false },
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_finds_session_among_others() {
        let id = Uuid::new_v4();
        let header = format!("theme=dark; {SESSION_COOKIE}={id}; lang=hi");
        assert_eq!(SessionCookie::parse(&header), Some(id));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(SessionCookie::parse("katha_session=not-a-uuid"), None);
        assert_eq!(SessionCookie::parse("other=1"), None);
        assert_eq!(SessionCookie::parse(""), None);
    }

    #[test]
    fn fresh_cookie_is_set_once() {
        let cookie = SessionCookie {
            id: Uuid::new_v4(),
            fresh: true,
        };
        let response = cookie.apply("ok");
        let set = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set.starts_with(&format!("{SESSION_COOKIE}={}", cookie.id)));
        assert!(set.contains("HttpOnly"));

        let known = SessionCookie {
            fresh: false,
            ..cookie
        };
        assert!(known.apply("ok").headers().get(SET_COOKIE).is_none());
    }
}
