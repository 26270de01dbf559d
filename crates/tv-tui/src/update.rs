//! Startup update check against a static release manifest.
//!
//! The manifest is a small JSON document published alongside releases:
//!
//! ```json
//!   { "version": "0.2.0", "url": "https://…/teletv-0.2.0.tar.gz", "notes": "…" }
//! ```
//!
//! No download is performed — when a newer version exists the UI offers to
//! copy the release URL to the clipboard.

use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInfo {
    pub version: String,
    pub url: String,
    #[serde(default)]
    pub notes: String,
}

/// Fetch the release manifest. Short timeout — this runs at startup and must
/// never hold the UI hostage on a bad network.
pub async fn fetch_manifest(manifest_url: &str) -> anyhow::Result<UpdateInfo> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(8))
        .build()?;
    let response = client.get(manifest_url).send().await?;
    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }
    Ok(response.json::<UpdateInfo>().await?)
}

/// Check for a newer release.  Returns `None` on any failure or when already
/// up to date — the caller never needs to surface errors for this.
pub async fn check_for_update(manifest_url: &str) -> Option<UpdateInfo> {
    match fetch_manifest(manifest_url).await {
        Ok(info) => {
            let current = env!("CARGO_PKG_VERSION");
            if is_newer(current, &info.version) {
                debug!("update check: {} → {} available", current, info.version);
                Some(info)
            } else {
                debug!("update check: {} is current", current);
                None
            }
        }
        Err(e) => {
            warn!("update check failed: {}", e);
            None
        }
    }
}

/// Compare dotted-number versions: is `candidate` strictly newer than
/// `current`?  Non-numeric segments count as zero; missing segments too,
/// so "1.2" == "1.2.0".
pub fn is_newer(current: &str, candidate: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.trim_start_matches('v')
            .split('.')
            .map(|s| s.trim().parse::<u64>().unwrap_or(0))
            .collect()
    };
    let cur = parse(current);
    let cand = parse(candidate);
    let len = cur.len().max(cand.len());
    for i in 0..len {
        let a = cur.get(i).copied().unwrap_or(0);
        let b = cand.get(i).copied().unwrap_or(0);
        if b != a {
            return b > a;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_versions_are_detected() {
        assert!(is_newer("0.1.0", "0.2.0"));
        assert!(is_newer("0.1.0", "0.1.1"));
        assert!(is_newer("0.9.9", "1.0.0"));
        assert!(is_newer("1.2", "1.2.1"));
    }

    #[test]
    fn equal_and_older_versions_are_not() {
        assert!(!is_newer("0.2.0", "0.2.0"));
        assert!(!is_newer("0.2.0", "0.1.9"));
        assert!(!is_newer("1.2.0", "1.2"));
        assert!(!is_newer("2.0.0", "1.99.99"));
    }

    #[test]
    fn v_prefix_and_garbage_segments_are_tolerated() {
        assert!(is_newer("0.1.0", "v0.2.0"));
        assert!(!is_newer("0.2.0", "0.x.0"));
    }

    #[test]
    fn manifest_json_shape() {
        let info: UpdateInfo = serde_json::from_str(
            r#"{"version":"0.3.0","url":"https://example.com/teletv.tar.gz"}"#,
        )
        .unwrap();
        assert_eq!(info.version, "0.3.0");
        assert!(info.notes.is_empty());
    }
}
