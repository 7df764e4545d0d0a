use std::path::{Path, PathBuf};

use crate::config::WardenConfig;

/// Centralized helpers for where the gate looks for its ACL definition.
/// Instance-specific persistent data wins over shared installed data.
#[inline]
pub fn persistent_acl(config: &WardenConfig) -> PathBuf {
    Path::new(&config.persistent_dir).join(&config.acl_file)
}

#[inline]
pub fn data_acl(config: &WardenConfig) -> PathBuf {
    Path::new(&config.data_dir).join(&config.acl_file)
}

/// Resolve the ACL file per precedence; `None` when neither location has it.
pub fn acl_file(config: &WardenConfig) -> Option<PathBuf> {
    let primary = persistent_acl(config);
    if primary.exists() {
        return Some(primary);
    }
    let fallback = data_acl(config);
    if fallback.exists() { Some(fallback) } else { None }
}
