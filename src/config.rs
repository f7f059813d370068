//! Deployment environment check.
//!
//! Cloud deployments expect a handful of environment variables. Their
//! absence is worth flagging at startup but must never halt a run: the
//! training job and the local serving path work fine without them.

use tracing::warn;

/// Variables a cloud deployment is expected to provide.
pub const REQUIRED_DEPLOYMENT_VARS: [&str; 3] = [
    "AZURE_CLIENT_ID",
    "AZURE_CLIENT_SECRET",
    "AZURE_TENANT_ID",
];

/// Which required variables are unset or empty in the process environment.
pub fn missing_deployment_vars() -> Vec<&'static str> {
    missing_from(|name| std::env::var(name).ok())
}

fn missing_from(lookup: impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
    REQUIRED_DEPLOYMENT_VARS
        .into_iter()
        .filter(|name| lookup(name).is_none_or(|value| value.is_empty()))
        .collect()
}

/// Warn about missing deployment variables. Returns whether the environment
/// is fully configured; callers proceed either way.
pub fn check_deployment_env() -> bool {
    let missing = missing_deployment_vars();
    if missing.is_empty() {
        true
    } else {
        warn!(?missing, "Missing deployment environment variables");
        false
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn reports_unset_and_empty_variables() {
        let env: HashMap<&str, &str> =
            HashMap::from([("AZURE_CLIENT_ID", "abc"), ("AZURE_TENANT_ID", "")]);
        let missing = missing_from(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(missing, vec!["AZURE_CLIENT_SECRET", "AZURE_TENANT_ID"]);
    }

    #[test]
    fn fully_configured_environment_reports_nothing() {
        let missing = missing_from(|_| Some("value".to_string()));
        assert!(missing.is_empty());
    }
}
