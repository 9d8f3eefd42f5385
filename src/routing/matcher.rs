//! Experiment path matching.
//!
//! # Responsibilities
//! - Hold the configured experiment-enabled paths
//! - Compile `[param]` patterns once at load time
//! - Answer "is this (locale-stripped) path experiment-enabled?"
//!
//! # Design Decisions
//! - Literal entries live in a HashSet: O(1) exact lookup first
//! - Each `[param]` matches exactly one non-empty segment (`[^/]+`), anchored
//! - No normalization: `/about` and `/about/` are different paths
//! - Any match is sufficient; pattern order is irrelevant

use std::collections::HashSet;

use regex::Regex;
use thiserror::Error;

/// Error compiling an experiment path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern must start with '/'")]
    NotAbsolute,
    #[error("unbalanced brackets")]
    Unbalanced,
    #[error("nested brackets")]
    Nested,
    #[error("empty or invalid parameter name")]
    BadParameter,
    #[error("regex: {0}")]
    Regex(String),
}

/// A compiled experiment path entry.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Matches one path exactly.
    Literal(String),
    /// Matches paths with `[param]` segments.
    Dynamic { source: String, regex: Regex },
}

impl PathPattern {
    /// Compile a pattern such as `/pricing` or `/product/[slug]`.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::NotAbsolute);
        }
        if !pattern.contains('[') && !pattern.contains(']') {
            return Ok(PathPattern::Literal(pattern.to_string()));
        }

        let mut expr = String::from("^");
        let mut rest = pattern;
        while let Some(open) = rest.find(['[', ']']) {
            if rest[open..].starts_with(']') {
                return Err(PatternError::Unbalanced);
            }
            expr.push_str(&regex::escape(&rest[..open]));

            let after = &rest[open + 1..];
            let close = after.find(['[', ']']).ok_or(PatternError::Unbalanced)?;
            if after[close..].starts_with('[') {
                return Err(PatternError::Nested);
            }
            let name = &after[..close];
            if name.is_empty() || name.contains('/') {
                return Err(PatternError::BadParameter);
            }

            expr.push_str("[^/]+");
            rest = &after[close + 1..];
        }
        expr.push_str(&regex::escape(rest));
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| PatternError::Regex(e.to_string()))?;
        Ok(PathPattern::Dynamic {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        match self {
            PathPattern::Literal(path) => path,
            PathPattern::Dynamic { source, .. } => source,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Literal(literal) => literal == path,
            PathPattern::Dynamic { regex, .. } => regex.is_match(path),
        }
    }
}

/// The set of experiment-enabled paths.
#[derive(Debug, Clone, Default)]
pub struct ExperimentPaths {
    literals: HashSet<String>,
    patterns: Vec<PathPattern>,
}

impl ExperimentPaths {
    /// Compile every entry. Fails on the first malformed pattern.
    pub fn new<I, S>(entries: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut paths = Self::default();
        for entry in entries {
            match PathPattern::compile(entry.as_ref())? {
                PathPattern::Literal(literal) => {
                    paths.literals.insert(literal);
                }
                dynamic => paths.patterns.push(dynamic),
            }
        }
        Ok(paths)
    }

    /// Compile a comma separated list (e.g. the `EXPERIMENT_PAGES` variable).
    pub fn from_comma_list(raw: &str) -> Result<Self, PatternError> {
        Self::new(crate::config::loader::split_list(raw))
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.literals.len() + self.patterns.len()
    }

    /// Whether a locale-stripped path is experiment-enabled.
    pub fn matches(&self, path: &str) -> bool {
        if self.literals.contains(path) {
            return true;
        }
        self.patterns.iter().any(|p| p.matches(path))
    }
}

/// Remove a leading `/{locale}` segment, yielding `/` when nothing remains.
pub fn strip_locale<'a>(path: &'a str, locale: &str) -> &'a str {
    let rest = path
        .strip_prefix('/')
        .and_then(|p| p.strip_prefix(locale))
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        .unwrap_or(path);
    if rest.is_empty() {
        "/"
    } else {
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let paths = ExperimentPaths::new(["/pricing", "/about/"]).unwrap();
        assert!(paths.matches("/pricing"));
        assert!(!paths.matches("/pricing/"));
        assert!(paths.matches("/about/"));
        assert!(!paths.matches("/about"));
    }

    #[test]
    fn test_dynamic_segment() {
        let paths = ExperimentPaths::new(["/product/[slug]"]).unwrap();
        assert!(paths.matches("/product/abc123"));
        assert!(!paths.matches("/product/abc/def"));
        assert!(!paths.matches("/product/"));
        assert!(!paths.matches("/products/abc"));
    }

    #[test]
    fn test_multiple_parameters_and_escaping() {
        let paths = ExperimentPaths::new(["/blog/[year]/[slug]+x"]).unwrap();
        assert!(paths.matches("/blog/2024/hello+x"));
        assert!(!paths.matches("/blog/2024/helloxx"));
    }

    #[test]
    fn test_empty_set_never_matches() {
        let paths = ExperimentPaths::from_comma_list(" , ").unwrap();
        assert!(paths.is_empty());
        assert!(!paths.matches("/"));
        assert!(!paths.matches("/anything"));
    }

    #[test]
    fn test_comma_list() {
        let paths = ExperimentPaths::from_comma_list("/, /product/[slug]").unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.matches("/"));
        assert!(paths.matches("/product/x"));
    }

    #[test]
    fn test_malformed_patterns() {
        assert_eq!(PathPattern::compile("pricing").unwrap_err(), PatternError::NotAbsolute);
        assert_eq!(PathPattern::compile("/p/[slug").unwrap_err(), PatternError::Unbalanced);
        assert_eq!(PathPattern::compile("/p/slug]").unwrap_err(), PatternError::Unbalanced);
        assert_eq!(PathPattern::compile("/p/[a[b]]").unwrap_err(), PatternError::Nested);
        assert_eq!(PathPattern::compile("/p/[]").unwrap_err(), PatternError::BadParameter);
    }

    #[test]
    fn test_strip_locale() {
        assert_eq!(strip_locale("/fr/about", "fr"), "/about");
        assert_eq!(strip_locale("/fr", "fr"), "/");
        assert_eq!(strip_locale("/fr/", "fr"), "/");
        assert_eq!(strip_locale("/french", "fr"), "/french");
    }
}
