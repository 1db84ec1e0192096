use axum::http::{header, HeaderMap, HeaderValue};
use cookie::{Cookie, CookieBuilder, SameSite};

use super::jwt;

pub const PORTAL_ACCESS: &str = "portal_access";
pub const PORTAL_REFRESH: &str = "portal_refresh";

fn cookie_secure() -> bool {
    std::env::var("COOKIE_SECURE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false)
}

fn cookie_domain() -> Option<String> {
    std::env::var("COOKIE_DOMAIN")
        .ok()
        .filter(|d| !d.is_empty())
}

fn base_cookie(name: &'static str, value: &str) -> CookieBuilder<'static> {
    let mut cookie = Cookie::build((name, value.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(cookie_secure());

    if let Some(domain) = cookie_domain() {
        cookie = cookie.domain(domain);
    }
    cookie
}

fn header_value(cookie: CookieBuilder<'static>) -> Option<HeaderValue> {
    HeaderValue::from_str(&cookie.build().to_string()).ok()
}

/// Build a Set-Cookie header value for the access token.
pub fn build_access_cookie(token: &str, max_age_minutes: i64) -> Option<HeaderValue> {
    header_value(
        base_cookie(PORTAL_ACCESS, token)
            .max_age(cookie::time::Duration::seconds(max_age_minutes * 60)),
    )
}

/// Build a Set-Cookie header value for the refresh token.
pub fn build_refresh_cookie(token: &str, max_age_days: i64) -> Option<HeaderValue> {
    header_value(
        base_cookie(PORTAL_REFRESH, token)
            .max_age(cookie::time::Duration::seconds(max_age_days * 86400)),
    )
}

/// Extract the access token from cookies (preferred) or Bearer header (fallback).
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_cookie(headers, PORTAL_ACCESS) {
        return Some(token);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Extract the refresh token from cookies.
pub fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    extract_cookie(headers, PORTAL_REFRESH)
}

/// Parse a specific cookie value from the Cookie header.
fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|piece| Cookie::parse(piece.trim().to_string()).ok())
        .find(|c| c.name() == name && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

/// Set both access and refresh cookies using the current JWT expiry config.
pub fn set_auth_cookies(headers: &mut HeaderMap, access_token: &str, refresh_token: &str) {
    let cookies = [
        build_access_cookie(access_token, jwt::access_token_expiry_minutes()),
        build_refresh_cookie(refresh_token, jwt::refresh_token_expiry_days()),
    ];
    for value in cookies.into_iter().flatten() {
        headers.append(header::SET_COOKIE, value);
    }
}

/// Expire both auth cookies.
pub fn clear_auth_cookies(headers: &mut HeaderMap) {
    for name in [PORTAL_ACCESS, PORTAL_REFRESH] {
        if let Some(value) = header_value(base_cookie(name, "").max_age(cookie::time::Duration::ZERO)) {
            headers.append(header::SET_COOKIE, value);
        }
    }
}
