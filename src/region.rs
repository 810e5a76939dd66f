//! Region resolution for sinks that talk to a regional endpoint
use log::debug;
use std::future::Future;
use std::time::Duration;

use crate::error::{MetricsError, Result};

/// Region used when nothing else resolves
pub const DEFAULT_REGION: &str = "us-east-1";

/// Instance metadata endpoint returning the availability zone, e.g. `eu-west-1a`
pub const AVAILABILITY_ZONE_URL: &str =
    "http://169.254.169.254/latest/meta-data/placement/availability-zone";

/// Upper bound on the metadata lookup
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(1);

/// Resolve the region from the process environment and instance metadata
pub async fn find_region() -> String {
    find_region_with(|key| std::env::var(key).ok(), lookup_availability_zone).await
}

/// Resolve the region from `env`, falling back to `lookup`
///
/// `AWS_REGION` wins over `AWS_DEFAULT_REGION`; empty values count as unset.
/// Without either, the availability zone returned by `lookup` has its zone
/// letter stripped. A lookup that fails or exceeds [`LOOKUP_TIMEOUT`] yields
/// [`DEFAULT_REGION`].
pub async fn find_region_with<E, L, F>(env: E, lookup: L) -> String
where
    E: Fn(&str) -> Option<String>,
    L: FnOnce() -> F,
    F: Future<Output = Result<String>>,
{
    for key in ["AWS_REGION", "AWS_DEFAULT_REGION"] {
        if let Some(region) = env(key).filter(|r| !r.is_empty()) {
            return region;
        }
    }

    let zone = match tokio::time::timeout(LOOKUP_TIMEOUT, lookup()).await {
        Ok(Ok(zone)) => zone,
        Ok(Err(e)) => {
            debug!("Availability zone lookup failed: {}", e);
            return DEFAULT_REGION.to_string();
        }
        Err(_) => {
            debug!("Availability zone lookup timed out after {:?}", LOOKUP_TIMEOUT);
            return DEFAULT_REGION.to_string();
        }
    };

    let mut region = zone.trim().to_string();
    region.pop();
    if region.is_empty() {
        DEFAULT_REGION.to_string()
    } else {
        region
    }
}

/// Fetch the availability zone from the instance metadata endpoint
pub async fn lookup_availability_zone() -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(LOOKUP_TIMEOUT)
        .build()
        .map_err(|e| MetricsError::Region(e.to_string()))?;

    client
        .get(AVAILABILITY_ZONE_URL)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| MetricsError::Region(e.to_string()))?
        .text()
        .await
        .map_err(|e| MetricsError::Region(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    async fn zone() -> Result<String> {
        Ok("eu-west-1a\n".to_string())
    }

    async fn unreachable() -> Result<String> {
        Err(MetricsError::Region("connection refused".to_string()))
    }

    #[tokio::test]
    async fn test_region_env_takes_precedence() {
        let region = find_region_with(
            env(&[("AWS_REGION", "ap-south-1"), ("AWS_DEFAULT_REGION", "eu-north-1")]),
            zone,
        )
        .await;
        assert_eq!(region, "ap-south-1");
    }

    #[tokio::test]
    async fn test_default_region_env() {
        let region = find_region_with(
            env(&[("AWS_REGION", ""), ("AWS_DEFAULT_REGION", "eu-north-1")]),
            zone,
        )
        .await;
        assert_eq!(region, "eu-north-1");
    }

    #[tokio::test]
    async fn test_zone_letter_is_stripped() {
        assert_eq!(find_region_with(env(&[]), zone).await, "eu-west-1");
    }

    #[tokio::test]
    async fn test_failed_lookup_falls_back() {
        assert_eq!(find_region_with(env(&[]), unreachable).await, DEFAULT_REGION);
        assert_eq!(
            find_region_with(env(&[]), || async { Ok("  ".to_string()) }).await,
            DEFAULT_REGION
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_lookup_falls_back() {
        let slow = || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("eu-west-1a".to_string())
        };
        assert_eq!(find_region_with(env(&[]), slow).await, DEFAULT_REGION);
    }
}
