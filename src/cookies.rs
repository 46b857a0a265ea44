use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use url::Url;

/// Read-only access to the cookies visible to the page
pub trait CookieSource: Send + Sync {
    /// Current cookie string, shaped like `a=1; b=2`, if there is one
    fn cookie_string(&self) -> Option<String>;
}

/// Look up the first cookie called `name` in a raw cookie string and decode its value
///
/// Names are compared case-sensitively against the whole `name=` prefix of each pair,
/// so `csrftokenFAKE=...` never matches `csrftoken`.
pub fn get_cookie(cookies: &str, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(prefix.as_str()))
        .map(decode_value)
}

/// Percent-decode a cookie value, keeping the raw text if it is not valid UTF-8 once decoded
fn decode_value(value: &str) -> String {
    urlencoding::decode(value).map_or_else(|_| value.to_string(), |v| v.into_owned())
}

/// Fixed cookie string
#[derive(Debug, Default, Clone)]
pub struct StaticCookies(Option<String>);

impl StaticCookies {
    pub fn new(cookies: impl Into<String>) -> Self {
        Self(Some(cookies.into()))
    }

    /// No cookies at all
    pub const fn empty() -> Self {
        Self(None)
    }
}

impl CookieSource for StaticCookies {
    fn cookie_string(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Cookies held by a `reqwest` jar for a given page URL
pub struct JarCookies {
    jar: Arc<Jar>,
    url: Url,
}

impl JarCookies {
    pub const fn new(jar: Arc<Jar>, url: Url) -> Self {
        Self { jar, url }
    }
}

impl CookieSource for JarCookies {
    fn cookie_string(&self) -> Option<String> {
        self.jar
            .cookies(&self.url)
            .and_then(|header| header.to_str().ok().map(String::from))
    }
}
