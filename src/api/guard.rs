//! Request guard: origin check and session resolution.
//!
//! Every request passes through here before any handler runs. The origin
//! check rejects unsafe cross-origin mutating requests outright; the session
//! layer turns the cookie into a [`CurrentIdentity`] extension and owns the
//! cookie's refresh/clear side of the response.

use axum::extract::{Request, State};
use axum::http::header::{InvalidHeaderValue, COOKIE, HOST, ORIGIN, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use url::Url;

use super::handlers::auth::{AuthConfig, AuthState};
use crate::auth::Error;
use crate::store::{SessionRecord, UserRecord};

/// The user/session pair resolved from the request's cookie.
#[derive(Clone, Debug)]
pub struct Identity {
    pub user: UserRecord,
    pub session: SessionRecord,
}

/// Always present as a request extension once the guard has run; `None`
/// means no (valid) session cookie was presented.
#[derive(Clone, Debug, Default)]
pub struct CurrentIdentity(pub Option<Identity>);

/// Reject unsafe cross-origin mutating requests before anything else runs.
///
/// Mutating methods must carry an `Origin` header whose host matches the
/// request's own `Host` header or one of the configured allowed hosts.
pub(crate) async fn origin_guard(
    State(state): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    if !matches!(
        *request.method(),
        Method::GET | Method::HEAD | Method::OPTIONS
    ) {
        let headers = request.headers();
        let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());
        let host = headers.get(HOST).and_then(|value| value.to_str().ok());
        let allowed = origin
            .is_some_and(|origin| origin_allowed(origin, host, state.config().allowed_hosts()));
        if !allowed {
            return Error::OriginRejected.into_response();
        }
    }
    next.run(request).await
}

fn origin_allowed(origin: &str, host: Option<&str>, allowed_hosts: &[String]) -> bool {
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    let Some(origin_host) = url.host_str() else {
        return false;
    };
    let origin_host = match url.port() {
        Some(port) => format!("{origin_host}:{port}"),
        None => origin_host.to_string(),
    };
    host.is_some_and(|host| host == origin_host)
        || allowed_hosts.iter().any(|host| *host == origin_host)
}

/// Resolve the session cookie and manage its transport-level lifecycle.
///
/// After the handler runs, at most one `Set-Cookie` is appended: a renewed
/// cookie when the session went stale (the stored expiry is deliberately not
/// touched), or a clearing cookie when a cookie was presented but resolved
/// to nothing. A handler that set the session cookie itself always wins.
pub(crate) async fn session_guard(
    State(state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    enum CookieAction {
        Keep,
        Refresh(String),
        Clear,
    }

    let token = extract_session_token(request.headers(), state.config().cookie_name());
    let (identity, action) = match token {
        None => (None, CookieAction::Keep),
        Some(token) => match state.sessions().validate(&token).await {
            Err(err) => return err.into_response(),
            Ok(None) => (None, CookieAction::Clear),
            Ok(Some(validated)) => {
                let action = if validated.refresh_cookie {
                    CookieAction::Refresh(validated.session.id.clone())
                } else {
                    CookieAction::Keep
                };
                (
                    Some(Identity {
                        user: validated.user,
                        session: validated.session,
                    }),
                    action,
                )
            }
        },
    };

    request.extensions_mut().insert(CurrentIdentity(identity));
    let mut response = next.run(request).await;

    if !sets_session_cookie(response.headers(), state.config().cookie_name()) {
        let cookie = match action {
            CookieAction::Keep => None,
            CookieAction::Refresh(token) => session_cookie(state.config(), &token).ok(),
            CookieAction::Clear => clear_session_cookie(state.config()).ok(),
        };
        if let Some(cookie) = cookie {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
    }
    response
}

/// Build the `HttpOnly` session cookie carrying the raw token.
pub(crate) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let name = config.cookie_name();
    let ttl = config.session_ttl_seconds();
    let mut cookie = format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl}");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let name = config.cookie_name();
    let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == cookie_name && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

fn sets_session_cookie(headers: &HeaderMap, cookie_name: &str) -> bool {
    headers.get_all(SET_COOKIE).iter().any(|value| {
        value
            .to_str()
            .is_ok_and(|value| value.trim_start().starts_with(&format!("{cookie_name}=")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_must_match_request_host() {
        assert!(origin_allowed("http://app.test", Some("app.test"), &[]));
        assert!(origin_allowed(
            "https://app.test:8443",
            Some("app.test:8443"),
            &[]
        ));
        assert!(!origin_allowed("http://evil.test", Some("app.test"), &[]));
        assert!(!origin_allowed("http://app.test:8080", Some("app.test"), &[]));
        assert!(!origin_allowed("http://app.test", None, &[]));
    }

    #[test]
    fn origin_accepts_configured_extra_hosts() {
        let allowed = vec!["front.test".to_string()];
        assert!(origin_allowed("https://front.test", Some("api.test"), &allowed));
        assert!(!origin_allowed("https://other.test", Some("api.test"), &allowed));
    }

    #[test]
    fn schemeless_origin_is_rejected() {
        assert!(!origin_allowed("evil.test", Some("evil.test"), &[]));
        assert!(!origin_allowed("null", Some("app.test"), &[]));
    }

    #[test]
    fn cookie_round_trip() {
        let config = AuthConfig::new().with_session_ttl_seconds(60);
        let cookie = session_cookie(&config, "token123").expect("cookie");
        let value = cookie.to_str().expect("ascii");
        assert!(value.starts_with("gatehouse_session=token123;"));
        assert!(value.contains("Max-Age=60"));
        assert!(value.contains("HttpOnly"));
        assert!(!value.contains("Secure"));

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("other=1; gatehouse_session=token123"),
        );
        assert_eq!(
            extract_session_token(&headers, "gatehouse_session"),
            Some("token123".to_string())
        );
    }

    #[test]
    fn secure_flag_follows_config() {
        let config = AuthConfig::new().with_cookie_secure(true);
        let cookie = session_cookie(&config, "t").expect("cookie");
        assert!(cookie.to_str().expect("ascii").ends_with("; Secure"));
        let clear = clear_session_cookie(&config).expect("cookie");
        assert!(clear.to_str().expect("ascii").contains("Max-Age=0"));
    }

    #[test]
    fn missing_or_empty_cookie_is_no_session() {
        let headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers, "gatehouse_session"), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("gatehouse_session="));
        assert_eq!(extract_session_token(&headers, "gatehouse_session"), None);
    }

    #[test]
    fn handler_set_cookie_is_detected() {
        let mut headers = HeaderMap::new();
        assert!(!sets_session_cookie(&headers, "gatehouse_session"));
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("gatehouse_session=abc; Path=/"),
        );
        assert!(sets_session_cookie(&headers, "gatehouse_session"));
    }
}
