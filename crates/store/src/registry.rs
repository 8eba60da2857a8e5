//! Package-registry lookup for the architectures a build is expected to
//! be tested on.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::error::StoreError;

#[async_trait]
pub trait ArchLookup: Send + Sync {
    /// Space-joined architectures the registry lists for an NVR. A lookup
    /// miss is an empty string, not an error.
    async fn expected_archs(
        &self,
        name: &str,
        version: &str,
        release: &str,
    ) -> Result<String, StoreError>;
}

pub struct HttpArchLookup {
    client: reqwest::Client,
    base_url: String,
}

impl HttpArchLookup {
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl ArchLookup for HttpArchLookup {
    async fn expected_archs(
        &self,
        name: &str,
        version: &str,
        release: &str,
    ) -> Result<String, StoreError> {
        // Anchored exact-match query on all three NVR parts
        let url = format!(
            "{}/rest_api/v1/rpms/?name=^{}$&version=^{}$&release=^{}$",
            self.base_url, name, version, release
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            warn!(
                name = %name,
                version = %version,
                release = %release,
                status = %response.status(),
                "Registry does not know this NVR"
            );
            return Ok(String::new());
        }
        let body: Value = response.json().await?;
        Ok(join_archs(&body))
    }
}

/// Stand-in when no registry is configured.
pub struct NullArchLookup;

#[async_trait]
impl ArchLookup for NullArchLookup {
    async fn expected_archs(
        &self,
        _name: &str,
        _version: &str,
        _release: &str,
    ) -> Result<String, StoreError> {
        Ok(String::new())
    }
}

/// Every listed arch except the source pseudo-arch, space-joined. A body
/// without `results` means the NVR is unknown.
pub fn join_archs(body: &Value) -> String {
    let Some(results) = body.get("results").and_then(Value::as_array) else {
        return String::new();
    };
    results
        .iter()
        .filter_map(|r| r.get("arch").and_then(Value::as_str))
        .filter(|a| *a != "src")
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_archs_excludes_src() {
        let body = json!({
            "results": [
                {"arch": "x86_64"},
                {"arch": "src"},
                {"arch": "ppc64le"},
                {"arch": "s390x"}
            ]
        });
        assert_eq!(join_archs(&body), "x86_64 ppc64le s390x");
    }

    #[test]
    fn test_join_archs_handles_misses() {
        assert_eq!(join_archs(&json!({"results": []})), "");
        assert_eq!(join_archs(&json!({"count": 0})), "");
        assert_eq!(join_archs(&json!({"results": [{"name": "kernel"}]})), "");
    }
}
