//! Rewrite/redirect decisions.
//!
//! # Responsibilities
//! - Bypass excluded paths (static assets, API routes, file requests)
//! - Detect an explicit locale prefix and honor it
//! - Otherwise resolve a locale and pick rewrite vs redirect
//! - Route experiment-enabled paths to the `/exp` variant tree
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Total: every request yields a decision, no error path
//! - Explicit locale prefixes are always rewritten, never redirected
//! - The default locale keeps clean URLs (rewrite); others become visible (redirect)

use serde::Serialize;

use crate::config::{ConfigError, EdgeConfig};
use crate::routing::locale::{LocaleSet, LocaleSource};
use crate::routing::matcher::{strip_locale, ExperimentPaths};

/// Segment inserted after the locale for experiment variants.
pub const EXPERIMENT_SEGMENT: &str = "/exp";

/// Borrowed view of the request fields routing depends on.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteRequest<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub locale_cookie: Option<&'a str>,
    pub accept_language: Option<&'a str>,
}

/// How a route is applied to the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    /// Server-side target change; the browser URL is unchanged.
    Rewrite,
    /// Client is sent to the target URL.
    Redirect,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Rewrite => "rewrite",
            RouteKind::Redirect => "redirect",
        }
    }
}

/// A computed route for a non-excluded request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub kind: RouteKind,
    pub locale: String,
    pub source: LocaleSource,
    pub path: String,
    pub query: Option<String>,
    pub experiment: bool,
}

impl Route {
    /// Target path with the original query appended verbatim.
    pub fn target(&self) -> String {
        match &self.query {
            Some(query) if !query.is_empty() => format!("{}?{}", self.path, query),
            _ => self.path.clone(),
        }
    }
}

/// Outcome of routing a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RoutingDecision {
    PassThrough,
    Route(Route),
}

/// Whether a path bypasses locale routing entirely.
pub fn is_excluded(path: &str, extra_prefixes: &[String]) -> bool {
    path.starts_with("/static")
        || path.contains("/api/")
        || path.contains('.')
        || extra_prefixes.iter().any(|p| path.starts_with(p.as_str()))
}

/// Compiled locale and experiment routing tables.
#[derive(Debug, Clone)]
pub struct LocaleRouter {
    locales: LocaleSet,
    experiments: ExperimentPaths,
    excluded_prefixes: Vec<String>,
}

impl LocaleRouter {
    pub fn new(locales: LocaleSet, experiments: ExperimentPaths, excluded_prefixes: Vec<String>) -> Self {
        Self {
            locales,
            experiments,
            excluded_prefixes,
        }
    }

    /// Compile routing tables from configuration.
    pub fn from_config(config: &EdgeConfig) -> Result<Self, ConfigError> {
        let locales = LocaleSet::new(
            config.locales.supported.iter().cloned(),
            config.locales.default.clone(),
        )?;
        let experiments = ExperimentPaths::new(&config.experiments.pages)?;

        tracing::info!(
            locales = config.locales.supported.len(),
            default_locale = %config.locales.default,
            experiment_paths = experiments.len(),
            "Routing tables compiled"
        );

        Ok(Self::new(
            locales,
            experiments,
            config.experiments.excluded_prefixes.clone(),
        ))
    }

    pub fn locales(&self) -> &LocaleSet {
        &self.locales
    }

    pub fn experiments(&self) -> &ExperimentPaths {
        &self.experiments
    }

    /// Decide how to route a request.
    pub fn decide(&self, req: &RouteRequest<'_>) -> RoutingDecision {
        if is_excluded(req.path, &self.excluded_prefixes) {
            return RoutingDecision::PassThrough;
        }

        let (locale, source, rest) = match self.locales.prefix_of(req.path) {
            Some(locale) => (locale, LocaleSource::Path, strip_locale(req.path, locale)),
            None => {
                let resolved = self.locales.resolve(req.locale_cookie, req.accept_language);
                (resolved.locale, resolved.source, leading_slash(req.path))
            }
        };

        let experiment = self.experiments.matches(rest);
        let path = if experiment {
            format!("/{}{}{}", locale, EXPERIMENT_SEGMENT, rest)
        } else {
            format!("/{}{}", locale, rest)
        };

        let kind = if source == LocaleSource::Path || self.locales.is_default(locale) {
            RouteKind::Rewrite
        } else {
            RouteKind::Redirect
        };

        RoutingDecision::Route(Route {
            kind,
            locale: locale.to_string(),
            source,
            path,
            query: req.query.map(String::from),
            experiment,
        })
    }
}

fn leading_slash(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(locales: &[&str], default: &str, pages: &[&str]) -> LocaleRouter {
        LocaleRouter::new(
            LocaleSet::new(locales.iter().copied(), default).unwrap(),
            ExperimentPaths::new(pages).unwrap(),
            Vec::new(),
        )
    }

    fn route(decision: RoutingDecision) -> Route {
        match decision {
            RoutingDecision::Route(r) => r,
            RoutingDecision::PassThrough => panic!("expected a route"),
        }
    }

    #[test]
    fn test_excluded_paths_pass_through() {
        let r = router(&["en", "fr"], "en", &["/pricing"]);
        for path in ["/static/app.css", "/favicon.ico", "/fr/api/items", "/x/api/", "/en/logo.png"] {
            let req = RouteRequest { path, ..Default::default() };
            assert_eq!(r.decide(&req), RoutingDecision::PassThrough, "{}", path);
        }
    }

    #[test]
    fn test_extra_excluded_prefix() {
        let r = LocaleRouter::new(
            LocaleSet::new(["en"], "en").unwrap(),
            ExperimentPaths::default(),
            vec!["/_next".to_string()],
        );
        let req = RouteRequest { path: "/_next/data", ..Default::default() };
        assert_eq!(r.decide(&req), RoutingDecision::PassThrough);
    }

    #[test]
    fn test_prefixed_experiment_is_rewritten_to_exp() {
        let r = router(&["en", "fr"], "en", &["/pricing"]);
        for locale in ["en", "fr"] {
            let path = format!("/{}/pricing", locale);
            let got = route(r.decide(&RouteRequest { path: &path, ..Default::default() }));
            assert_eq!(got.kind, RouteKind::Rewrite);
            assert_eq!(got.path, format!("/{}/exp/pricing", locale));
            assert_eq!(got.source, LocaleSource::Path);
            assert!(got.experiment);
        }
    }

    #[test]
    fn test_prefixed_plain_path_keeps_prefix() {
        let r = router(&["en", "fr"], "en", &["/pricing"]);
        let got = route(r.decide(&RouteRequest {
            path: "/fr/about",
            locale_cookie: Some("en"),
            ..Default::default()
        }));
        assert_eq!(got.kind, RouteKind::Rewrite);
        assert_eq!(got.path, "/fr/about");
        assert_eq!(got.locale, "fr");
        assert!(!got.experiment);
    }

    #[test]
    fn test_bare_locale_path() {
        let r = router(&["en", "fr"], "en", &["/"]);
        let got = route(r.decide(&RouteRequest { path: "/fr", ..Default::default() }));
        assert_eq!(got.path, "/fr/exp/");
        assert_eq!(got.kind, RouteKind::Rewrite);
    }

    #[test]
    fn test_default_locale_rewrites() {
        let r = router(&["en", "es"], "en", &[]);
        let got = route(r.decide(&RouteRequest { path: "/about", ..Default::default() }));
        assert_eq!(got.kind, RouteKind::Rewrite);
        assert_eq!(got.path, "/en/about");
        assert_eq!(got.locale, "en");
    }

    #[test]
    fn test_non_default_locale_redirects() {
        let r = router(&["en", "es"], "en", &[]);
        let got = route(r.decide(&RouteRequest {
            path: "/about",
            accept_language: Some("es"),
            ..Default::default()
        }));
        assert_eq!(got.kind, RouteKind::Redirect);
        assert_eq!(got.path, "/es/about");
        assert_eq!(got.source, LocaleSource::AcceptLanguage);
    }

    #[test]
    fn test_unprefixed_experiment_with_dynamic_pattern() {
        let r = router(&["en", "es"], "en", &["/product/[slug]"]);
        let got = route(r.decide(&RouteRequest {
            path: "/product/abc123",
            locale_cookie: Some("es"),
            ..Default::default()
        }));
        assert_eq!(got.kind, RouteKind::Redirect);
        assert_eq!(got.path, "/es/exp/product/abc123");

        let got = route(r.decide(&RouteRequest { path: "/product/abc/def", ..Default::default() }));
        assert_eq!(got.path, "/en/product/abc/def");
        assert!(!got.experiment);
    }

    #[test]
    fn test_query_preserved_verbatim() {
        let r = router(&["en", "es"], "en", &[]);
        let got = route(r.decide(&RouteRequest {
            path: "/search",
            query: Some("q=a%20b&x=1"),
            accept_language: Some("es-MX"),
            ..Default::default()
        }));
        assert_eq!(got.target(), "/es/search?q=a%20b&x=1");
    }

    #[test]
    fn test_root_path() {
        let r = router(&["en"], "en", &[]);
        let got = route(r.decide(&RouteRequest { path: "/", ..Default::default() }));
        assert_eq!(got.path, "/en/");
    }
}
