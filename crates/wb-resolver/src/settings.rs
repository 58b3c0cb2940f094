use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wb_core::BindError;

pub const DEFAULT_MAX_DEPTH: usize = 20;
pub const DEFAULT_DIAL_TIMEOUT_SECS: u64 = 30;

/// How declared schema names become target-language type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportPolicy {
    /// PascalCase every synthesized name so it is exported.
    #[default]
    ExportAll,
    /// Keep the declared spelling; only make it identifier-safe.
    PreserveCase,
}

/// What a lookup does when the namespace or name has no registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnresolvedPolicy {
    #[default]
    Synthesize,
    Error,
}

/// What discovery does when an external schema would nest deeper than
/// `max_depth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DepthLimitPolicy {
    #[default]
    Fail,
    Truncate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportSettings {
    pub insecure_skip_verify: bool,
    pub dial_timeout_secs: u64,
}

impl TransportSettings {
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_secs(self.dial_timeout_secs)
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            insecure_skip_verify: false,
            dial_timeout_secs: DEFAULT_DIAL_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverSettings {
    /// Import path prefix for every generated package.
    pub package_base: String,
    pub export_policy: ExportPolicy,
    pub unresolved_policy: UnresolvedPolicy,
    pub max_depth: usize,
    pub depth_limit_policy: DepthLimitPolicy,
    /// Substring replacements applied while deriving package paths from
    /// namespace URIs, in key order.
    pub package_replacements: BTreeMap<String, String>,
    pub transport: TransportSettings,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            package_base: String::new(),
            export_policy: ExportPolicy::default(),
            unresolved_policy: UnresolvedPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            depth_limit_policy: DepthLimitPolicy::default(),
            package_replacements: BTreeMap::from([("-".to_string(), String::new())]),
            transport: TransportSettings::default(),
        }
    }
}

impl ResolverSettings {
    pub fn from_json_str(raw: &str) -> Result<Self, BindError> {
        let settings: Self = serde_json::from_str(raw).map_err(|error| BindError::Config {
            message: error.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), BindError> {
        if self.max_depth == 0 {
            return Err(BindError::Config {
                message: "maxDepth must be at least 1".to_string(),
            });
        }
        if self.transport.dial_timeout_secs == 0 {
            return Err(BindError::Config {
                message: "transport.dialTimeoutSecs must be at least 1".to_string(),
            });
        }
        if self.package_replacements.contains_key("") {
            return Err(BindError::Config {
                message: "packageReplacements cannot replace the empty string".to_string(),
            });
        }
        Ok(())
    }
}
