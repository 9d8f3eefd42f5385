//! Experiment datafile cache.
//!
//! # Responsibilities
//! - Fetch the experiment datafile from the CDN on first use
//! - Serve the cached copy until invalidated by the webhook
//!
//! # Design Decisions
//! - Lock-free reads via `ArcSwapOption`; routing never waits on it
//! - Refetches are single-flight: concurrent misses wait for one CDN request
//! - The datafile is opaque JSON: only `revision` is read

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::experiments::ExperimentError;

/// A fetched datafile.
#[derive(Debug, Clone, PartialEq)]
pub struct Datafile {
    pub revision: Option<String>,
    pub raw: Value,
}

impl Datafile {
    pub fn from_json(raw: Value) -> Self {
        let revision = match raw.get("revision") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Self { revision, raw }
    }
}

/// CDN location of the datafile for an SDK key.
pub fn datafile_url(base_url: &str, sdk_key: &str) -> String {
    format!("{}/datafiles/{}.json", base_url.trim_end_matches('/'), sdk_key)
}

/// Cached datafile with explicit invalidation.
pub struct DatafileCache {
    url: String,
    client: reqwest::Client,
    current: ArcSwapOption<Datafile>,
    refresh: Mutex<()>,
}

impl DatafileCache {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ExperimentError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
            current: ArcSwapOption::empty(),
            refresh: Mutex::new(()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The cached datafile, without fetching.
    pub fn cached(&self) -> Option<Arc<Datafile>> {
        self.current.load_full()
    }

    /// The cached datafile, fetching it when absent.
    pub async fn get(&self) -> Result<Arc<Datafile>, ExperimentError> {
        if let Some(datafile) = self.cached() {
            return Ok(datafile);
        }

        let _guard = self.refresh.lock().await;
        // Another caller may have fetched while we waited.
        if let Some(datafile) = self.cached() {
            return Ok(datafile);
        }

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExperimentError::Status(status.as_u16()));
        }

        let datafile = Arc::new(Datafile::from_json(response.json::<Value>().await?));
        tracing::info!(
            url = %self.url,
            revision = datafile.revision.as_deref().unwrap_or("unknown"),
            "Datafile fetched"
        );
        self.current.store(Some(datafile.clone()));
        Ok(datafile)
    }

    /// Drop the cached copy; the next `get` refetches.
    pub fn invalidate(&self) {
        let previous = self.current.swap(None);
        tracing::info!(
            had_datafile = previous.is_some(),
            "Datafile cache invalidated"
        );
    }

    #[cfg(test)]
    pub(crate) fn preload(&self, datafile: Datafile) {
        self.current.store(Some(Arc::new(datafile)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_datafile_url() {
        assert_eq!(
            datafile_url("https://cdn.example.com/", "KEY"),
            "https://cdn.example.com/datafiles/KEY.json"
        );
    }

    #[test]
    fn test_revision_parsing() {
        assert_eq!(
            Datafile::from_json(json!({"revision": "42"})).revision.as_deref(),
            Some("42")
        );
        assert_eq!(
            Datafile::from_json(json!({"revision": 7})).revision.as_deref(),
            Some("7")
        );
        assert_eq!(Datafile::from_json(json!({})).revision, None);
    }

    #[test]
    fn test_invalidate_clears_cache() {
        let cache = DatafileCache::new("http://127.0.0.1:1/df.json", Duration::from_secs(1)).unwrap();
        assert!(cache.cached().is_none());
        cache.preload(Datafile::from_json(json!({"revision": "1"})));
        assert!(cache.cached().is_some());
        cache.invalidate();
        assert!(cache.cached().is_none());
    }
}
