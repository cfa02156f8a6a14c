//! Endpoint resolution for a NAS reachable over alternate base URLs.
//!
//! The same box is typically exposed twice (LAN address and QuickConnect
//! relay, or two reverse-proxy names), and either may be down at any moment.
//! Resolution probes candidates in priority order with a short bounded
//! timeout and takes the first one that answers the capability query. No
//! failure is remembered across calls: a later resolve re-probes from the
//! top, so a recovered primary is picked up automatically.

use std::time::Duration;

use tracing::{debug, warn};

use super::error::SynoError;
use super::responses::{Envelope, InfoData};

/// Default per-probe timeout. Kept short so a dead primary only delays the
/// first request by a few seconds before failover.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(4);

const PROBE_QUERY: &str =
    "/webapi/query.cgi?api=SYNO.API.Info&version=1&method=query&query=SYNO.API.Auth";

pub struct EndpointResolver {
    http: reqwest::Client,
    candidates: Vec<String>,
    probe_timeout: Duration,
}

impl EndpointResolver {
    /// `candidates` are base URLs in priority order, e.g.
    /// `["https://nas.local:5001", "https://example.quickconnect.to"]`.
    /// Trailing slashes are stripped so URL composition stays uniform.
    pub fn new(http: reqwest::Client, candidates: Vec<String>, probe_timeout: Duration) -> Self {
        let candidates = candidates
            .into_iter()
            .map(|c| c.trim_end_matches('/').to_string())
            .collect();
        Self {
            http,
            candidates,
            probe_timeout,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Return the first candidate that answers the capability probe.
    pub async fn resolve(&self) -> Result<String, SynoError> {
        self.resolve_skipping(None).await
    }

    /// Like [`resolve`](Self::resolve), but skip one base URL that just
    /// failed mid-request, so the failover retry lands somewhere else.
    pub async fn resolve_skipping(&self, skip: Option<&str>) -> Result<String, SynoError> {
        let mut tried = 0;
        for base in &self.candidates {
            if Some(base.as_str()) == skip {
                continue;
            }
            tried += 1;
            if self.probe(base).await {
                debug!(base = %base, "NAS endpoint resolved");
                return Ok(base.clone());
            }
            warn!(base = %base, "NAS endpoint did not answer capability probe");
        }
        Err(SynoError::Connectivity { tried })
    }

    /// One capability probe. Any transport error, non-2xx status, bad body,
    /// or `success: false` counts as unreachable.
    async fn probe(&self, base: &str) -> bool {
        let url = format!("{base}{PROBE_QUERY}");
        let response = match self
            .http
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(base = %base, error = %e, "probe transport failure");
                return false;
            }
        };
        if !response.status().is_success() {
            return false;
        }
        match response.json::<Envelope<InfoData>>().await {
            Ok(envelope) => envelope.success,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syno::testserver::{probe_ok, vendor_error, FakeNas};

    fn resolver(candidates: Vec<String>) -> EndpointResolver {
        EndpointResolver::new(
            reqwest::Client::new(),
            candidates,
            Duration::from_millis(500),
        )
    }

    #[tokio::test]
    async fn test_first_reachable_candidate_wins() {
        let nas = FakeNas::spawn(|_, _| probe_ok()).await;
        let r = resolver(vec![nas.base_url()]);
        assert_eq!(r.resolve().await.unwrap(), nas.base_url());
    }

    #[tokio::test]
    async fn test_failover_to_second_candidate() {
        let nas = FakeNas::spawn(|_, _| probe_ok()).await;
        // Port 1 is never listening.
        let r = resolver(vec!["http://127.0.0.1:1".into(), nas.base_url()]);
        assert_eq!(r.resolve().await.unwrap(), nas.base_url());
    }

    #[tokio::test]
    async fn test_all_down_is_connectivity_error() {
        let r = resolver(vec![
            "http://127.0.0.1:1".into(),
            "http://127.0.0.1:2".into(),
        ]);
        match r.resolve().await {
            Err(SynoError::Connectivity { tried }) => assert_eq!(tried, 2),
            other => panic!("expected Connectivity, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsuccessful_envelope_counts_as_down() {
        let nas = FakeNas::spawn(|_, _| vendor_error(102)).await;
        let r = resolver(vec![nas.base_url()]);
        assert!(matches!(
            r.resolve().await,
            Err(SynoError::Connectivity { tried: 1 })
        ));
    }

    #[tokio::test]
    async fn test_resolve_skipping_excludes_failed_base() {
        let nas1 = FakeNas::spawn(|_, _| probe_ok()).await;
        let nas2 = FakeNas::spawn(|_, _| probe_ok()).await;
        let r = resolver(vec![nas1.base_url(), nas2.base_url()]);
        let resolved = r
            .resolve_skipping(Some(nas1.base_url().as_str()))
            .await
            .unwrap();
        assert_eq!(resolved, nas2.base_url());
        // The skipped base must not have been probed.
        assert_eq!(nas1.hit_count("SYNO.API.Info"), 0);
    }

    #[tokio::test]
    async fn test_no_sticky_failure_memory() {
        // A candidate that fails once is re-probed on the next resolve.
        let nas = FakeNas::spawn(|_, _| probe_ok()).await;
        let r = resolver(vec!["http://127.0.0.1:1".into(), nas.base_url()]);
        r.resolve().await.unwrap();
        r.resolve().await.unwrap();
        // Both resolves went through the full list; the live NAS answered twice.
        assert_eq!(nas.hit_count("SYNO.API.Info"), 2);
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let r = resolver(vec!["http://nas.local:5000/".into()]);
        assert_eq!(r.candidates(), ["http://nas.local:5000"]);
    }
}
