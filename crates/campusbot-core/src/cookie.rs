//! Cookie helpers shared by every request that needs the CSRF token.

/// Name of the cookie the backend stores its CSRF token in.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Header the token is echoed back in on mutating requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Look up `name` in a `Cookie`-style header (`a=1; b=2`).
///
/// Entries are trimmed before matching and the first exact `name=` prefix
/// wins. The value is percent-decoded; a malformed escape leaves it raw.
pub fn read_cookie(cookies: &str, name: &str) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }

    cookies
        .split(';')
        .map(str::trim)
        .find_map(|entry| entry.strip_prefix(name)?.strip_prefix('='))
        .map(|raw| {
            urlencoding::decode(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string())
        })
}

/// The CSRF token from a cookie header, if the backend has issued one.
pub fn csrf_token(cookies: &str) -> Option<String> {
    read_cookie(cookies, CSRF_COOKIE)
}
