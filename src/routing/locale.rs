//! Locale resolution.
//!
//! # Responsibilities
//! - Hold the supported locale set and its default
//! - Detect a locale prefix on the request path
//! - Negotiate a locale from `Accept-Language`
//! - Resolve the effective locale: cookie > Accept-Language > default
//!
//! # Design Decisions
//! - Resolution is total: it always yields a supported locale
//! - Language tags compare ASCII case-insensitively; the configured spelling is returned
//! - Path prefixes compare case-sensitively, like every other path segment

use serde::Serialize;
use thiserror::Error;

use crate::config::validation::is_valid_locale_code;

/// Error building a [`LocaleSet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleSetError {
    #[error("locale set is empty")]
    Empty,
    #[error("invalid locale code {0:?}")]
    InvalidCode(String),
    #[error("duplicate locale {0:?}")]
    Duplicate(String),
    #[error("default locale {0:?} is not supported")]
    DefaultUnsupported(String),
}

/// Where a resolved locale came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocaleSource {
    Path,
    Cookie,
    AcceptLanguage,
    Default,
}

impl LocaleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocaleSource::Path => "path",
            LocaleSource::Cookie => "cookie",
            LocaleSource::AcceptLanguage => "accept_language",
            LocaleSource::Default => "default",
        }
    }
}

/// A locale picked for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub locale: &'a str,
    pub source: LocaleSource,
}

/// Ordered set of supported locale codes with a designated default.
#[derive(Debug, Clone)]
pub struct LocaleSet {
    locales: Vec<String>,
    default: String,
}

impl LocaleSet {
    /// Build a locale set. The default must be one of `locales`.
    pub fn new<I, S>(locales: I, default: impl Into<String>) -> Result<Self, LocaleSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: Vec<String> = Vec::new();
        for code in locales {
            let code = code.into();
            if !is_valid_locale_code(&code) {
                return Err(LocaleSetError::InvalidCode(code));
            }
            if set.iter().any(|c| c.eq_ignore_ascii_case(&code)) {
                return Err(LocaleSetError::Duplicate(code));
            }
            set.push(code);
        }
        if set.is_empty() {
            return Err(LocaleSetError::Empty);
        }

        let default = default.into();
        if !set.contains(&default) {
            return Err(LocaleSetError::DefaultUnsupported(default));
        }

        Ok(Self { locales: set, default })
    }

    /// The locale served on unprefixed URLs.
    pub fn default_locale(&self) -> &str {
        &self.default
    }

    pub fn is_default(&self, code: &str) -> bool {
        self.default == code
    }

    /// Exact membership test.
    pub fn contains(&self, code: &str) -> bool {
        self.locales.iter().any(|c| c == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.locales.iter().map(String::as_str)
    }

    fn find_ignore_case(&self, code: &str) -> Option<&str> {
        self.locales
            .iter()
            .find(|c| c.eq_ignore_ascii_case(code))
            .map(String::as_str)
    }

    /// The supported locale the path is prefixed with, if any.
    ///
    /// `/fr` and `/fr/about` carry `fr`; `/french` does not.
    pub fn prefix_of(&self, path: &str) -> Option<&str> {
        self.locales
            .iter()
            .find(|locale| {
                path.strip_prefix('/')
                    .and_then(|rest| rest.strip_prefix(locale.as_str()))
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
            .map(String::as_str)
    }

    /// Pick the first acceptable language from an `Accept-Language` value.
    ///
    /// Candidates are tried in preference order; each one matches exactly or,
    /// failing that, by its primary subtag (`pl-PL` → `pl`).
    pub fn negotiate(&self, accept_language: &str) -> Option<&str> {
        for tag in parse_accept_language(accept_language) {
            if let Some(locale) = self.find_ignore_case(&tag) {
                return Some(locale);
            }
            if let Some((primary, _)) = tag.split_once('-') {
                if let Some(locale) = self.find_ignore_case(primary) {
                    return Some(locale);
                }
            }
        }
        None
    }

    /// Resolve the effective locale for a request without a locale prefix.
    pub fn resolve(&self, cookie: Option<&str>, accept_language: Option<&str>) -> Resolved<'_> {
        if let Some(locale) = cookie.and_then(|c| self.iter().find(|l| *l == c)) {
            return Resolved {
                locale,
                source: LocaleSource::Cookie,
            };
        }

        if let Some(locale) = accept_language.and_then(|h| self.negotiate(h)) {
            return Resolved {
                locale,
                source: LocaleSource::AcceptLanguage,
            };
        }

        Resolved {
            locale: &self.default,
            source: LocaleSource::Default,
        }
    }
}

/// Parse an `Accept-Language` value into language tags, most preferred first.
///
/// Entries with `q=0` or an unparseable quality are dropped, as is `*`.
/// Equal qualities keep header order.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut entries: Vec<(String, f32)> = Vec::new();

    for part in header.split(',') {
        let mut params = part.split(';');
        let tag = params.next().unwrap_or_default().trim();
        if tag.is_empty() || tag == "*" {
            continue;
        }

        let mut quality = Some(1.0f32);
        for param in params {
            if let Some((key, value)) = param.split_once('=') {
                if key.trim().eq_ignore_ascii_case("q") {
                    quality = value.trim().parse::<f32>().ok();
                }
            }
        }

        match quality {
            Some(q) if q > 0.0 => entries.push((tag.to_string(), q)),
            _ => {}
        }
    }

    // Stable: ties keep their original order.
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.into_iter().map(|(tag, _)| tag).collect()
}
