//! High-level lookup operations
//!
//! One [`PackageLookup`] owns the API client, the session cache, and the
//! optional local-tool probe. Each request runs fetch → match → extract
//! synchronously; "not found" is always a normal return value, and upstream
//! failures never surface past the cache layer.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{
    DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, LookupConfig, MAX_TIMEOUT_SECS,
    MIN_TIMEOUT_SECS,
};
use crate::lookup::api::WingetApi;
use crate::lookup::cache::{CacheStatistics, ResponseCache, SearchKey};
use crate::lookup::error::LookupError;
use crate::lookup::fetch::{RetryPolicy, RetryingFetcher};
use crate::lookup::probe::CliProbe;
use crate::lookup::types::{InstallerFacts, PackageCandidate, PackageDetails, PackageRef};
use crate::lookup::{installers, matcher, version};

/// One lookup request. Optional behavior is explicit configuration here,
/// not flags threaded through the layers below.
#[derive(Debug, Clone)]
pub struct LookupRequest {
    pub display_name: String,
    pub publisher: Option<String>,
    pub package_id: Option<String>,
    pub require_64bit: bool,
    pub timeout_secs: u64,
}

impl LookupRequest {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            publisher: None,
            package_id: None,
            require_64bit: false,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn package_id(mut self, package_id: impl Into<String>) -> Self {
        self.package_id = Some(package_id.into());
        self
    }

    pub fn require_64bit(mut self, require: bool) -> Self {
        self.require_64bit = require;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    // Contract violations are rejected at the public boundary only
    fn validate(&self) -> Result<(), LookupError> {
        if self.display_name.trim().is_empty() {
            return Err(LookupError::EmptyDisplayName);
        }
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&self.timeout_secs) {
            return Err(LookupError::TimeoutOutOfRange {
                min: MIN_TIMEOUT_SECS,
                max: MAX_TIMEOUT_SECS,
                got: self.timeout_secs,
            });
        }
        Ok(())
    }
}

/// Package lookup service
pub struct PackageLookup {
    api: WingetApi,
    cache: ResponseCache,
    probe: CliProbe,
    /// Timeout for prewarm fetches, which carry no per-request timeout
    request_timeout: Duration,
    probe_timeout: Duration,
    prewarm_delay: Duration,
}

impl PackageLookup {
    pub fn new(config: &LookupConfig) -> Self {
        let fetcher = RetryingFetcher::new(RetryPolicy {
            max_attempts: config.retry.max_attempts,
            base_delay: Duration::from_millis(config.retry.base_delay_ms),
        });
        let probe = if config.probe.enabled {
            CliProbe::locate()
        } else {
            CliProbe::unavailable()
        };
        Self {
            api: WingetApi::new(&config.api.base_url, fetcher),
            cache: ResponseCache::new(),
            probe,
            request_timeout: Duration::from_secs(config.api.request_timeout_secs),
            probe_timeout: Duration::from_secs(config.probe.timeout_secs),
            prewarm_delay: Duration::from_millis(config.prewarm.delay_ms),
        }
    }

    pub fn with_parts(api: WingetApi, probe: CliProbe, prewarm_delay: Duration) -> Self {
        Self {
            api,
            cache: ResponseCache::new(),
            probe,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            prewarm_delay,
        }
    }

    /// Existence check, optionally gated on 64-bit installer availability
    pub async fn exists(&self, request: &LookupRequest) -> Result<bool, LookupError> {
        let details = self.details(request).await?;
        Ok(details.found && (!request.require_64bit || details.has_64bit))
    }

    /// Full metadata for the best-matching package. A request that matches
    /// nothing returns `found = false`, never an error.
    pub async fn details(&self, request: &LookupRequest) -> Result<PackageDetails, LookupError> {
        request.validate()?;
        let timeout = Duration::from_secs(request.timeout_secs);

        let key = SearchKey::new(
            &request.display_name,
            request.publisher.as_deref(),
            request.package_id.as_deref(),
        );
        let candidates = self
            .cache
            .search_or_fetch(&key, || {
                self.api.search(
                    &request.display_name,
                    request.publisher.as_deref(),
                    request.package_id.as_deref(),
                    timeout,
                )
            })
            .await;

        let resolved = matcher::resolve(
            &candidates,
            &request.display_name,
            request.publisher.as_deref(),
            request.package_id.as_deref(),
        );
        let Some(mut candidate) = resolved.candidate else {
            debug!(term = %request.display_name, "no candidate cleared the match threshold");
            return Ok(PackageDetails::not_found());
        };

        let mut facts = installers::extract(&candidate);
        if !candidate.has_installer_detail() {
            // Lightweight search results omit installers; go through the
            // manifest cache for the full record
            let id = candidate.id.clone();
            if let Some(manifest) = self
                .cache
                .manifest_or_fetch(&id, || self.api.manifest(&id, timeout))
                .await
            {
                facts = installers::extract(&manifest);
                candidate = merge_manifest(candidate, manifest);
            }
        }

        let mut has_64bit = facts.has_64bit;
        if request.require_64bit && !has_64bit && facts.architectures.is_empty() {
            // Manifest data is silent on architecture; the local tool is the
            // last remaining source of truth
            has_64bit = self
                .probe
                .has_64bit_installer(&candidate.id, self.probe_timeout)
                .await;
        }

        Ok(build_details(candidate, facts, has_64bit))
    }

    /// Resolve a package from an MSI product code via the local tool
    pub async fn find_by_product_code(
        &self,
        product_code: &str,
        timeout_secs: u64,
    ) -> Option<PackageRef> {
        self.probe
            .find_by_product_code(product_code, Duration::from_secs(timeout_secs))
            .await
    }

    /// Warm the search cache for a batch of terms: case-insensitive dedupe,
    /// skip anything already cached, and pause between upstream calls.
    pub async fn prewarm(&self, terms: &[String], publisher: Option<&str>) {
        let mut seen = HashSet::new();
        let mut fetched = 0usize;
        for term in terms {
            let normalized = term.trim().to_lowercase();
            if normalized.is_empty() || !seen.insert(normalized) {
                continue;
            }
            let key = SearchKey::new(term, publisher, None);
            if self.cache.contains_search(&key) {
                debug!(term, "already cached, skipping");
                continue;
            }
            if fetched > 0 {
                tokio::time::sleep(self.prewarm_delay).await;
            }
            let timeout = self.request_timeout;
            self.cache
                .search_or_fetch(&key, || self.api.search(term, publisher, None, timeout))
                .await;
            fetched += 1;
        }
        info!(requested = terms.len(), fetched, "prewarm finished");
    }

    pub fn probe_available(&self) -> bool {
        self.probe.is_available()
    }

    pub fn cache_stats(&self) -> CacheStatistics {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Prefer manifest fields where the search result was silent
fn merge_manifest(search: PackageCandidate, manifest: PackageCandidate) -> PackageCandidate {
    PackageCandidate {
        id: search.id,
        display_name: manifest.display_name.or(search.display_name),
        publisher: manifest.publisher.or(search.publisher),
        description: manifest.description.or(search.description),
        homepage: manifest.homepage.or(search.homepage),
        license: manifest.license.or(search.license),
        tags: if manifest.tags.is_empty() {
            search.tags
        } else {
            manifest.tags
        },
        versions: if manifest.versions.is_empty() {
            search.versions
        } else {
            manifest.versions
        },
        search_score: search.search_score,
        installers: manifest.installers,
    }
}

fn build_details(
    candidate: PackageCandidate,
    facts: InstallerFacts,
    has_64bit: bool,
) -> PackageDetails {
    let latest_version = version::latest(&candidate.versions).map(str::to_string);
    PackageDetails {
        found: true,
        id: Some(candidate.id),
        name: candidate.display_name,
        publisher: candidate.publisher,
        description: candidate.description,
        homepage: candidate.homepage,
        license: candidate.license,
        tags: candidate.tags,
        versions: candidate.versions,
        latest_version,
        architectures: facts.architectures.into_iter().collect(),
        installer_types: facts.installer_types.into_iter().collect(),
        scopes: facts.scopes.into_iter().collect(),
        has_64bit,
        has_arm64: facts.has_arm64,
    }
}
