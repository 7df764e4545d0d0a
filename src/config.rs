//! Runtime configuration, environment-driven with serde-friendly defaults.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// HTTP bind port.
    pub http_port: u16,
    /// ACL file name looked up under the persistent then data directory.
    pub acl_file: String,
    /// Instance-specific writable directory, searched first.
    pub persistent_dir: String,
    /// Shared installed-data directory, the fallback.
    pub data_dir: String,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            http_port: 7979,
            acl_file: "acl.json".to_string(),
            persistent_dir: "data".to_string(),
            data_dir: "share".to_string(),
        }
    }
}

impl WardenConfig {
    /// Collect configuration from `WARDEN_*` environment variables,
    /// falling back to the defaults above.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            http_port: std::env::var("WARDEN_HTTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.http_port),
            acl_file: std::env::var("WARDEN_ACL_FILE").unwrap_or(d.acl_file),
            persistent_dir: std::env::var("WARDEN_PERSISTENT_DIR").unwrap_or(d.persistent_dir),
            data_dir: std::env::var("WARDEN_DATA_DIR").unwrap_or(d.data_dir),
        }
    }
}
