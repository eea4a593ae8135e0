//! services/relay/src/web/cookies.rs
//!
//! Re-issues backend `Set-Cookie` headers on the relay's own origin.
//!
//! Only the name, value and lifetime survive. Every cookie is rewritten as
//! `HttpOnly; SameSite=Lax; Path=/`, plus `Secure` in production, so the
//! browser scopes it to the relay no matter what the backend asked for.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;

/// Builds a jar holding one re-issued cookie per parseable backend header.
pub fn reissue(set_cookies: &[String], secure: bool) -> CookieJar {
    set_cookies
        .iter()
        .filter_map(|raw| match Cookie::parse_encoded(raw.clone()) {
            Ok(parsed) => Some(harden(parsed, secure)),
            Err(e) => {
                warn!("Dropping unparseable Set-Cookie from backend: {}", e);
                None
            }
        })
        .fold(CookieJar::new(), |jar, cookie| jar.add(cookie))
}

/// Rewrites a backend cookie with the relay's fixed attributes.
pub fn harden(parsed: Cookie<'static>, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(parsed.name().to_string(), parsed.value().to_string());
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");

    // Keep the lifetime so a backend clearing a cookie still clears it here.
    if let Some(max_age) = parsed.max_age() {
        cookie.set_max_age(max_age);
    }
    if let Some(expires) = parsed.expires() {
        cookie.set_expires(expires);
    }
    cookie
}
