//! winget.run community API wire format and endpoints
//!
//! Search responses are lightweight and usually omit installer detail; the
//! per-package manifest endpoint fills that gap. Optional fields stay
//! optional all the way into [`PackageCandidate`] so callers can tell "no
//! detail in this response" from "empty detail".

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::lookup::error::FetchError;
use crate::lookup::fetch::RetryingFetcher;
use crate::lookup::types::{
    Architecture, InstallerRecord, InstallerType, PackageCandidate, Scope,
};

/// Response from the package search endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResponse {
    #[serde(default)]
    packages: Vec<PackageEnvelope>,
}

/// Response from the single-package manifest endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PackageResponse {
    package: PackageEnvelope,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PackageEnvelope {
    id: String,
    #[serde(default)]
    versions: Vec<String>,
    latest: Option<LatestBlock>,
    search_score: Option<f64>,
    installers: Option<Vec<InstallerWire>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LatestBlock {
    name: Option<String>,
    publisher: Option<String>,
    description: Option<String>,
    homepage: Option<String>,
    license: Option<String>,
    tags: Option<Vec<String>>,
    installers: Option<Vec<InstallerWire>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstallerWire {
    #[serde(alias = "Arch")]
    architecture: Option<String>,
    installer_type: Option<String>,
    scope: Option<String>,
}

impl InstallerWire {
    // Unrecognized enum strings become None rather than failing the record
    fn into_record(self) -> InstallerRecord {
        InstallerRecord {
            architecture: self.architecture.as_deref().and_then(Architecture::parse),
            installer_type: self.installer_type.as_deref().and_then(InstallerType::parse),
            scope: self.scope.as_deref().and_then(Scope::parse),
        }
    }
}

impl PackageEnvelope {
    fn into_candidate(self) -> PackageCandidate {
        let (name, publisher, description, homepage, license, tags, latest_installers) =
            match self.latest {
                Some(latest) => (
                    latest.name,
                    latest.publisher,
                    latest.description,
                    latest.homepage,
                    latest.license,
                    latest.tags.unwrap_or_default(),
                    latest.installers,
                ),
                None => (None, None, None, None, None, Vec::new(), None),
            };

        let installers = self
            .installers
            .or(latest_installers)
            .map(|list| list.into_iter().map(InstallerWire::into_record).collect());

        PackageCandidate {
            id: self.id,
            display_name: name,
            publisher,
            description,
            homepage,
            license,
            tags,
            versions: self.versions,
            search_score: self.search_score,
            installers,
        }
    }
}

/// Client for the winget.run v2 endpoints
pub struct WingetApi {
    fetcher: RetryingFetcher,
    base: reqwest::Url,
}

impl WingetApi {
    pub fn new(base_url: &str, fetcher: RetryingFetcher) -> Self {
        Self {
            fetcher,
            base: reqwest::Url::parse(base_url).expect("invalid API base URL"),
        }
    }

    /// Search for packages. A 404 is a normal empty result.
    pub async fn search(
        &self,
        term: &str,
        publisher: Option<&str>,
        package_id: Option<&str>,
        timeout: Duration,
    ) -> Result<Vec<PackageCandidate>, FetchError> {
        let mut url = self.base.clone();
        url.set_path("/v2/packages");
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("query", term);
            if let Some(publisher) = publisher {
                params.append_pair("publisher", publisher);
            }
            if let Some(id) = package_id {
                params.append_pair("id", id);
            }
        }

        let body = match self.fetcher.get(url.as_str(), timeout).await {
            Ok(body) => body,
            Err(FetchError::Status { status: 404 }) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let response: SearchResponse = serde_json::from_str(&body).map_err(|err| {
            warn!(term, error = %err, "failed to parse search response");
            FetchError::InvalidResponse(err.to_string())
        })?;

        Ok(response
            .packages
            .into_iter()
            .map(PackageEnvelope::into_candidate)
            .collect())
    }

    /// Fetch the full manifest for one package. `Ok(None)` means the
    /// repository does not know the id.
    pub async fn manifest(
        &self,
        package_id: &str,
        timeout: Duration,
    ) -> Result<Option<PackageCandidate>, FetchError> {
        let mut url = self.base.clone();
        url.set_path(&format!("/v2/packages/{package_id}"));

        let body = match self.fetcher.get(url.as_str(), timeout).await {
            Ok(body) => body,
            Err(FetchError::Status { status: 404 }) => return Ok(None),
            Err(err) => return Err(err),
        };

        let response: PackageResponse = serde_json::from_str(&body).map_err(|err| {
            warn!(package_id, error = %err, "failed to parse manifest response");
            FetchError::InvalidResponse(err.to_string())
        })?;

        Ok(Some(response.package.into_candidate()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::fetch::RetryPolicy;
    use mockito::{Matcher, Server};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn api(base_url: &str) -> WingetApi {
        WingetApi::new(base_url, RetryingFetcher::new(RetryPolicy::default()))
    }

    #[tokio::test]
    async fn search_parses_candidates_with_optional_fields() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v2/packages")
            .match_query(Matcher::UrlEncoded("query".into(), "putty".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "Packages": [
                        {
                            "Id": "PuTTY.PuTTY",
                            "Versions": ["0.81", "0.80"],
                            "Latest": {
                                "Name": "PuTTY",
                                "Publisher": "Simon Tatham",
                                "Tags": ["ssh", "telnet"]
                            },
                            "SearchScore": 92.5
                        },
                        {
                            "Id": "TTYPlus.MTPutty"
                        }
                    ]
                }"#,
            )
            .create_async()
            .await;

        let result = api(&server.url())
            .search("putty", None, None, TIMEOUT)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "PuTTY.PuTTY");
        assert_eq!(result[0].display_name.as_deref(), Some("PuTTY"));
        assert_eq!(result[0].publisher.as_deref(), Some("Simon Tatham"));
        assert_eq!(result[0].tags, vec!["ssh", "telnet"]);
        assert_eq!(result[0].search_score, Some(92.5));
        assert!(!result[0].has_installer_detail());
        assert_eq!(result[1].id, "TTYPlus.MTPutty");
        assert!(result[1].display_name.is_none());
    }

    #[tokio::test]
    async fn search_passes_publisher_and_id_filters() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v2/packages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "putty".into()),
                Matcher::UrlEncoded("publisher".into(), "Simon Tatham".into()),
                Matcher::UrlEncoded("id".into(), "PuTTY.PuTTY".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Packages": []}"#)
            .create_async()
            .await;

        let result = api(&server.url())
            .search("putty", Some("Simon Tatham"), Some("PuTTY.PuTTY"), TIMEOUT)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn search_treats_404_as_empty_result() {
        let mut server = Server::new_async().await;

        server
            .mock("GET", "/v2/packages")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let result = api(&server.url())
            .search("nonexistent", None, None, TIMEOUT)
            .await
            .unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn search_reports_malformed_json_as_invalid_response() {
        let mut server = Server::new_async().await;

        server
            .mock("GET", "/v2/packages")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let result = api(&server.url()).search("putty", None, None, TIMEOUT).await;

        assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn manifest_parses_installers_and_normalizes_case() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v2/packages/PuTTY.PuTTY")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "Package": {
                        "Id": "PuTTY.PuTTY",
                        "Versions": ["0.81"],
                        "Latest": { "Name": "PuTTY" },
                        "Installers": [
                            { "Architecture": "X64", "InstallerType": "MSI", "Scope": "Machine" },
                            { "Arch": "x86", "InstallerType": "msi" },
                            { "Architecture": "sparc" }
                        ]
                    }
                }"#,
            )
            .create_async()
            .await;

        let result = api(&server.url())
            .manifest("PuTTY.PuTTY", TIMEOUT)
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        let installers = result.installers.unwrap();
        assert_eq!(installers.len(), 3);
        assert_eq!(installers[0].architecture, Some(Architecture::X64));
        assert_eq!(installers[0].installer_type, Some(InstallerType::Msi));
        assert_eq!(installers[0].scope, Some(Scope::Machine));
        assert_eq!(installers[1].architecture, Some(Architecture::X86));
        assert_eq!(installers[1].scope, None);
        // Unknown architecture strings are dropped, not errors
        assert_eq!(installers[2].architecture, None);
    }

    #[tokio::test]
    async fn manifest_returns_none_for_unknown_package() {
        let mut server = Server::new_async().await;

        server
            .mock("GET", "/v2/packages/Ghost.App")
            .with_status(404)
            .create_async()
            .await;

        let result = api(&server.url()).manifest("Ghost.App", TIMEOUT).await.unwrap();

        assert!(result.is_none());
    }
}
