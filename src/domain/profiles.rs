//! Profile records and the store they are looked up in
//!
//! The bundled store is an in-memory fixture table rebuilt on every start. All
//! lookups go through [`ProfileLookup`], which bounds each store call with the
//! upstream timeout so a remote store can be swapped in behind [`ProfileStore`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::errors::{ToolError, UpstreamError};

pub const DEFAULT_PROFILE_ID: &str = "alex-rivera";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub title: String,
    pub location: String,
    pub bio: String,
    pub skills: Vec<String>,
}

impl Profile {
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) is a {} based in {}. Skills: {}.",
            self.name,
            self.id,
            self.title,
            self.location,
            self.skills.join(", ")
        )
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<Option<Profile>, UpstreamError>;
    async fn list(&self) -> Result<Vec<Profile>, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct StaticProfileStore {
    order: Vec<String>,
    profiles: HashMap<String, Profile>,
}

impl StaticProfileStore {
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self {
            order: profiles.iter().map(|profile| profile.id.clone()).collect(),
            profiles: profiles
                .into_iter()
                .map(|profile| (profile.id.clone(), profile))
                .collect(),
        }
    }

    pub fn with_fixtures() -> Self {
        Self::new(vec![
            fixture(
                DEFAULT_PROFILE_ID,
                "Alex Rivera",
                "Senior Platform Engineer",
                "Lisbon, Portugal",
                "Builds developer platforms and keeps deploy pipelines boring.",
                &["Rust", "Kubernetes", "Observability"],
            ),
            fixture(
                "sam-okafor",
                "Sam Okafor",
                "Product Designer",
                "Lagos, Nigeria",
                "Designs calm interfaces for busy people.",
                &["Interaction design", "Prototyping", "Accessibility"],
            ),
            fixture(
                "mei-tanaka",
                "Mei Tanaka",
                "Data Scientist",
                "Osaka, Japan",
                "Turns messy event streams into forecasts people trust.",
                &["Python", "Time series", "Experiment design"],
            ),
        ])
    }
}

fn fixture(
    id: &str,
    name: &str,
    title: &str,
    location: &str,
    bio: &str,
    skills: &[&str],
) -> Profile {
    Profile {
        id: id.to_string(),
        name: name.to_string(),
        title: title.to_string(),
        location: location.to_string(),
        bio: bio.to_string(),
        skills: skills.iter().map(|skill| skill.to_string()).collect(),
    }
}

#[async_trait]
impl ProfileStore for StaticProfileStore {
    async fn fetch(&self, id: &str) -> Result<Option<Profile>, UpstreamError> {
        Ok(self.profiles.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Profile>, UpstreamError> {
        Ok(self
            .order
            .iter()
            .filter_map(|id| self.profiles.get(id).cloned())
            .collect())
    }
}

/// How profile ids are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSettings {
    pub default_profile_id: String,
    /// When set, an unknown id is an error instead of falling back to the default.
    pub strict_lookup: bool,
    pub upstream_timeout: Duration,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            default_profile_id: DEFAULT_PROFILE_ID.to_string(),
            strict_lookup: false,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

#[derive(Clone)]
pub struct ProfileLookup {
    store: Arc<dyn ProfileStore>,
    settings: ProfileSettings,
}

impl ProfileLookup {
    pub fn new(store: Arc<dyn ProfileStore>, settings: ProfileSettings) -> Self {
        Self { store, settings }
    }

    /// Resolves a requested id, falling back to the default profile when the id
    /// is absent, blank, or (unless strict) unknown.
    pub async fn resolve(&self, requested: Option<&str>) -> Result<Profile, ToolError> {
        if let Some(id) = requested.map(str::trim).filter(|id| !id.is_empty()) {
            if let Some(profile) = self.fetch(id).await? {
                return Ok(profile);
            }
            if self.settings.strict_lookup {
                return Err(ToolError::invalid_input(format!("unknown profile id {id:?}")));
            }
            debug!(
                requested = id,
                fallback = %self.settings.default_profile_id,
                "profile not found, using default"
            );
        }

        self.default_profile().await
    }

    pub async fn default_profile(&self) -> Result<Profile, ToolError> {
        let id = &self.settings.default_profile_id;
        self.fetch(id).await?.ok_or_else(|| {
            ToolError::from(UpstreamError::Unavailable(format!(
                "default profile {id:?} is missing from the store"
            )))
        })
    }

    pub async fn list(&self) -> Result<Vec<Profile>, ToolError> {
        Ok(self.bounded(self.store.list()).await??)
    }

    async fn fetch(&self, id: &str) -> Result<Option<Profile>, ToolError> {
        Ok(self.bounded(self.store.fetch(id)).await??)
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = T>,
    ) -> Result<T, UpstreamError> {
        let limit = self.settings.upstream_timeout;
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| UpstreamError::Timeout {
                after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowStore;

    #[async_trait]
    impl ProfileStore for SlowStore {
        async fn fetch(&self, _id: &str) -> Result<Option<Profile>, UpstreamError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn list(&self) -> Result<Vec<Profile>, UpstreamError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![])
        }
    }

    fn lookup(strict_lookup: bool) -> ProfileLookup {
        ProfileLookup::new(
            Arc::new(StaticProfileStore::with_fixtures()),
            ProfileSettings {
                strict_lookup,
                ..ProfileSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn resolves_known_id() {
        let profile = lookup(false).resolve(Some("mei-tanaka")).await.expect("profile");
        assert_eq!(profile.name, "Mei Tanaka");
    }

    #[tokio::test]
    async fn absent_or_blank_id_uses_default() {
        let lookup = lookup(true);
        for requested in [None, Some(""), Some("   ")] {
            let profile = lookup.resolve(requested).await.expect("default profile");
            assert_eq!(profile.id, DEFAULT_PROFILE_ID);
        }
    }

    #[tokio::test]
    async fn unknown_id_falls_back_silently_by_default() {
        let profile = lookup(false)
            .resolve(Some("nonexistent-id"))
            .await
            .expect("fallback profile");
        assert_eq!(profile.id, DEFAULT_PROFILE_ID);
    }

    #[tokio::test]
    async fn unknown_id_is_rejected_in_strict_mode() {
        let err = lookup(true)
            .resolve(Some("nonexistent-id"))
            .await
            .expect_err("strict lookup must fail");
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn missing_default_profile_is_upstream_failure() {
        let lookup = ProfileLookup::new(
            Arc::new(StaticProfileStore::new(vec![])),
            ProfileSettings::default(),
        );
        let err = lookup.resolve(None).await.expect_err("empty store");
        assert!(matches!(err, ToolError::Upstream(UpstreamError::Unavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_times_out() {
        let lookup = ProfileLookup::new(Arc::new(SlowStore), ProfileSettings::default());
        let err = lookup.resolve(Some("alex-rivera")).await.expect_err("timeout");
        match err {
            ToolError::Upstream(upstream) => {
                assert!(upstream.is_timeout());
                assert_eq!(upstream.to_string(), "request timed out after 5000ms");
            }
            other => panic!("expected upstream timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn lists_profiles_in_fixture_order() {
        let ids: Vec<_> = lookup(false)
            .list()
            .await
            .expect("profiles")
            .into_iter()
            .map(|profile| profile.id)
            .collect();
        assert_eq!(ids, ["alex-rivera", "sam-okafor", "mei-tanaka"]);
    }
}
