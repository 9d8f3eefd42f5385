//! Cookie parsing and `Set-Cookie` construction.

use axum::http::header::{InvalidHeaderValue, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::CookieConfig;
use crate::routing::CookieSync;

/// Cookies sent with a request.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    pairs: Vec<(String, String)>,
}

impl CookieJar {
    /// Parse every `Cookie` header. The first occurrence of a name wins.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut pairs = Vec::new();
        for value in headers.get_all(COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for pair in value.split(';') {
                if let Some((name, value)) = pair.split_once('=') {
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    let value = value.trim().trim_matches('"');
                    pairs.push((name.to_string(), value.to_string()));
                }
            }
        }
        Self { pairs }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// `Set-Cookie` value for a site-wide cookie.
pub fn set_cookie(name: &str, value: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!("{}={}; Path=/; SameSite=Lax", name, value))
}

/// Resolved cookie and header names.
#[derive(Debug, Clone)]
pub struct CookieNames {
    pub locale: String,
    pub user_id: String,
    pub locale_header: HeaderName,
}

impl CookieNames {
    pub fn from_config(config: &CookieConfig) -> Result<Self, axum::http::header::InvalidHeaderName> {
        Ok(Self {
            locale: config.locale_name.clone(),
            user_id: config.user_id_name.clone(),
            locale_header: HeaderName::from_bytes(config.locale_header.as_bytes())?,
        })
    }
}

/// Write a cookie/header plan onto response headers.
pub fn apply_cookie_sync(headers: &mut HeaderMap, names: &CookieNames, sync: &CookieSync) {
    if let Some(locale) = &sync.set_locale {
        append_cookie(headers, &names.locale, locale);
    }
    if let Some(user_id) = &sync.set_user_id {
        append_cookie(headers, &names.user_id, user_id);
    }

    match sync.locale_header.as_deref().map(HeaderValue::from_str) {
        Some(Ok(value)) => {
            headers.insert(names.locale_header.clone(), value);
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Locale is not a valid header value");
            headers.remove(&names.locale_header);
        }
        None => {
            headers.remove(&names.locale_header);
        }
    }
}

fn append_cookie(headers: &mut HeaderMap, name: &str, value: &str) {
    match set_cookie(name, value) {
        Ok(cookie) => {
            headers.append(SET_COOKIE, cookie);
        }
        Err(e) => tracing::warn!(cookie = %name, error = %e, "Skipping invalid cookie"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> CookieNames {
        CookieNames::from_config(&CookieConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1; __LOCALE_NAME=fr"));
        headers.append(COOKIE, HeaderValue::from_static("__LOCALE_NAME=de; b=\"quoted\""));

        let jar = CookieJar::from_headers(&headers);
        assert_eq!(jar.get("__LOCALE_NAME"), Some("fr"));
        assert_eq!(jar.get("a"), Some("1"));
        assert_eq!(jar.get("b"), Some("quoted"));
        assert_eq!(jar.get("missing"), None);
    }

    #[test]
    fn test_apply_changed_locale() {
        let mut headers = HeaderMap::new();
        let sync = CookieSync {
            set_locale: Some("fr".into()),
            set_user_id: Some("abc123".into()),
            locale_header: Some("fr".into()),
        };
        apply_cookie_sync(&mut headers, &names(), &sync);

        let cookies: Vec<_> = headers.get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0], "__LOCALE_NAME=fr; Path=/; SameSite=Lax");
        assert_eq!(cookies[1], "__USER_ID=abc123; Path=/; SameSite=Lax");
        assert_eq!(headers.get("x-locale").unwrap(), "fr");
    }

    #[test]
    fn test_apply_unchanged_removes_stale_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-locale", HeaderValue::from_static("en"));
        let sync = CookieSync {
            set_locale: None,
            set_user_id: None,
            locale_header: None,
        };
        apply_cookie_sync(&mut headers, &names(), &sync);
        assert!(headers.get("x-locale").is_none());
        assert!(headers.get(SET_COOKIE).is_none());
    }
}
