//! Walk configuration and cooperative cancellation.
//!
//! The configuration is built once by the caller and stays immutable for the
//! duration of a walk. The cancellation token is a separate, cloneable
//! handle: it is written only by the entity that initiated cancellation
//! (signal handler, UI action) and polled by the engine at its checkpoints.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::checksums::ChecksumAlgorithm;
use crate::pool::DigestPool;

type CancelListener = Box<dyn FnOnce() + Send>;

struct TokenInner {
    cancelled: AtomicBool,
    listener: Mutex<Option<CancelListener>>,
}

/// Shared, single-writer cancellation flag.
///
/// `cancel` is idempotent; only the first call fires the listener. The
/// engine never writes the flag, it only polls `is_cancelled`.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                listener: Mutex::new(None),
            }),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Relaxed)
    }

    /// Signal cancellation. The registered listener runs exactly once, on
    /// the thread making the first `cancel` call.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::Relaxed) {
            if let Ok(mut listener) = self.inner.listener.lock() {
                if let Some(notify) = listener.take() {
                    notify();
                }
            }
        }
    }

    /// Register the listener fired on the first transition to cancelled.
    /// Replaces any previously registered listener.
    pub fn set_listener(&self, listener: impl FnOnce() + Send + 'static) {
        if let Ok(mut slot) = self.inner.listener.lock() {
            *slot = Some(Box::new(listener));
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Configuration for one verification walk.
///
/// Flag fields are set directly; the digest pool is attached with
/// `with_digest_pool` and normalized by `init` before the walk starts.
pub struct CheckConfig {
    /// Compare byte lengths of same-named files
    pub check_size: bool,

    /// Compare content digests of same-sized files; `None` disables
    pub checksum: Option<ChecksumAlgorithm>,

    /// Stop scanning a directory at its first issue and skip all of its
    /// subdirectories
    pub fail_fast: bool,

    /// Extend fail-fast's early exit to the destination-only scan pass
    pub fail_on_destination: bool,

    pool: Option<DigestPool>,
}

impl CheckConfig {
    pub fn new() -> Self {
        CheckConfig {
            check_size: true,
            checksum: None,
            fail_fast: false,
            fail_on_destination: false,
            pool: None,
        }
    }

    /// Attach a digest pool; its presence enables parallel digesting of the
    /// two sides of each file pair.
    pub fn with_digest_pool(mut self, pool: DigestPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Resolve a checksum algorithm by name. An unresolvable name disables
    /// checksum verification instead of rejecting the configuration.
    pub fn resolve_checksum(&mut self, name: &str) {
        self.checksum = ChecksumAlgorithm::from_name(name);
        if self.checksum.is_none() {
            warn!(
                "unknown checksum algorithm {:?}, checksum verification disabled",
                name
            );
        }
    }

    /// Normalize the configuration before a walk: a pool that is already
    /// shut down cannot accept work, so parallel digesting is disabled.
    pub fn init(mut self) -> Self {
        if let Some(pool) = &self.pool {
            if pool.is_shutdown() {
                warn!("digest pool is shut down, parallel digesting disabled");
                self.pool = None;
            }
        }
        self
    }

    pub fn checksum_enabled(&self) -> bool {
        self.checksum.is_some()
    }

    pub fn pool(&self) -> Option<&DigestPool> {
        self.pool.as_ref()
    }

    /// Shut down the digest pool once the walk has finished, normally or
    /// abnormally.
    pub fn release(&self) {
        if let Some(pool) = &self.pool {
            pool.shutdown();
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self::new()
    }
}
