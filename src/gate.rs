//! The orchestrating security gate.
//!
//! One gate instance lives for the process: it owns the token codec (and
//! with it the secret key), shares the ACL with the contexts it hands out,
//! and carries the host-facing lifecycle. Request operations are
//! synchronous pure computation; the single I/O (loading the ACL) happens
//! in `initialize`, strictly before any request, and `deinitialize`
//! strictly after the last one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::acl::AccessControlList;
use crate::config::WardenConfig;
use crate::context::SecurityContext;
use crate::paths;
use crate::token::{SecretKey, TokenCodec, TokenError};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GateError {
    /// Credential payload exceeds the token length bound; recoverable by
    /// resubmitting a smaller payload.
    #[error("payload too large for token encoding")]
    PayloadTooLarge,
    /// Uniform outcome for any token that fails validation. Maps outward
    /// to a forbidden response; never says which check failed.
    #[error("invalid token")]
    InvalidToken,
}

pub struct SecurityGate {
    codec: TokenCodec,
    acl: Arc<AccessControlList>,
    active: AtomicBool,
}

impl SecurityGate {
    /// A gate starts inactive with an empty (deny-all) ACL. The key is
    /// injected so tests can fix it; production callers pass
    /// `SecretKey::generate()?`.
    pub fn new(key: SecretKey) -> Self {
        Self {
            codec: TokenCodec::new(key),
            acl: Arc::new(AccessControlList::new()),
            active: AtomicBool::new(false),
        }
    }

    /// Load the ACL per the configured path precedence and raise the
    /// security-active flag.
    ///
    /// Strict: an ACL file missing from both directories, or an unreadable
    /// one, fails activation and leaves the gate inactive and deny-all.
    /// Role diagnostics are startup warnings, never failures.
    pub fn initialize(&self, config: &WardenConfig) -> Result<()> {
        let path = paths::acl_file(config).with_context(|| {
            format!(
                "ACL file '{}' not found under '{}' or '{}'",
                config.acl_file, config.persistent_dir, config.data_dir
            )
        })?;
        let file = std::fs::File::open(&path)
            .with_context(|| format!("While opening ACL file {}", path.display()))?;
        let report = self
            .acl
            .load(file)
            .with_context(|| format!("While loading ACL file {}", path.display()))?;
        for role in &report.unreferenced {
            warn!(target: "startup", "Role: {} not referenced", role);
        }
        for role in &report.undefined {
            warn!(target: "startup", "Role: {} is undefined", role);
        }
        self.active.store(true, Ordering::Release);
        info!(
            target: "startup",
            "security gate active: {} roles loaded from {}",
            self.acl.role_count(),
            path.display()
        );
        Ok(())
    }

    /// Drop all ACL state and retract the security-active flag. Anything
    /// arriving afterwards sees a deny-all ACL, never freed state.
    pub fn deinitialize(&self) {
        self.active.store(false, Ordering::Release);
        self.acl.clear();
    }

    /// Whether `initialize` has completed and `deinitialize` has not.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Issue a signed token over caller-supplied credential bytes.
    pub fn create_token(&self, payload: &[u8]) -> Result<String, GateError> {
        self.codec.encode(payload).map_err(|e| match e {
            TokenError::PayloadTooLarge(_) => GateError::PayloadTooLarge,
            TokenError::Invalid => GateError::InvalidToken,
        })
    }

    /// Validate a presented token and bind its claims to the ACL.
    ///
    /// A token that decodes always yields a context, even when no claimed
    /// role resolves; denying specific operations is the holder's
    /// `is_authorized` check, not the gate's.
    pub fn authorize(&self, token: &str) -> Result<SecurityContext, GateError> {
        let payload = self.codec.decode(token).map_err(|_| GateError::InvalidToken)?;
        debug!(payload_len = payload.len(), "token verified");
        Ok(SecurityContext::new(Arc::clone(&self.acl), &payload))
    }

    /// Shared handle to the ACL, for status reporting and tests.
    pub fn acl(&self) -> &Arc<AccessControlList> {
        &self.acl
    }
}
