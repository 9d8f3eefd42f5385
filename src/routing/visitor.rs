//! Visitor identity and locale cookie synchronization.

use rand::Rng;

const USER_ID_LEN: usize = 11;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Cookie and header changes to apply to a routed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSync {
    /// New value for the locale cookie, when it changed.
    pub set_locale: Option<String>,
    /// Freshly minted user id, when the request carried none.
    pub set_user_id: Option<String>,
    /// Value for the locale response header; `None` removes the header.
    pub locale_header: Option<String>,
}

/// Plan cookie/header updates from the request's prior cookies.
///
/// The locale cookie and header change only when the resolved locale differs
/// from the prior cookie. An existing user id is never replaced.
pub fn plan_cookie_sync(
    prior_locale: Option<&str>,
    prior_user_id: Option<&str>,
    resolved_locale: &str,
) -> CookieSync {
    let changed = prior_locale != Some(resolved_locale);

    CookieSync {
        set_locale: changed.then(|| resolved_locale.to_string()),
        set_user_id: match prior_user_id {
            Some(id) if !id.is_empty() => None,
            _ => Some(generate_user_id()),
        },
        locale_header: changed.then(|| resolved_locale.to_string()),
    }
}

/// Short random identifier used for stable experiment bucketing.
pub fn generate_user_id() -> String {
    let mut rng = rand::thread_rng();
    (0..USER_ID_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_locale_sets_cookie_and_header() {
        let sync = plan_cookie_sync(Some("en"), Some("abc"), "fr");
        assert_eq!(sync.set_locale.as_deref(), Some("fr"));
        assert_eq!(sync.locale_header.as_deref(), Some("fr"));
        assert_eq!(sync.set_user_id, None);
    }

    #[test]
    fn test_unchanged_locale_is_left_alone() {
        let sync = plan_cookie_sync(Some("fr"), Some("abc"), "fr");
        assert_eq!(sync.set_locale, None);
        assert_eq!(sync.locale_header, None);
    }

    #[test]
    fn test_missing_user_id_is_minted() {
        let sync = plan_cookie_sync(None, None, "en");
        let id = sync.set_user_id.unwrap();
        assert_eq!(id.len(), USER_ID_LEN);
        assert!(id.bytes().all(|b| BASE36.contains(&b)));
        assert_eq!(sync.set_locale.as_deref(), Some("en"));

        let sync = plan_cookie_sync(None, Some(""), "en");
        assert!(sync.set_user_id.is_some());
    }

    #[test]
    fn test_user_ids_differ() {
        assert_ne!(generate_user_id(), generate_user_id());
    }
}
