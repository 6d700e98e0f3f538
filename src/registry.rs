//! Registry mapping in-flight job ids to their cancellation flags
//!
//! One instance lives for the whole process, constructed by the host and
//! shared (by `Arc` or reference) between the transfer worker and whatever
//! control surface serves cancel requests. An entry exists exactly while a
//! transfer for that id is running; the registry keeps no history.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Process-wide cancel registry.
///
/// All operations serialize on one mutex, so a cancel landing between
/// registration and the worker's first chunk check is never lost. Critical
/// sections are a single map access, so the lock is a plain sync mutex and
/// the operations stay callable from drop paths.
#[derive(Debug, Default)]
pub struct CancelRegistry {
    active: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh unset flag for `id` and return it.
    ///
    /// Job ids are caller-managed; registering an id that is still active
    /// replaces the previous flag, which orphans the earlier transfer's
    /// cancel path. Callers must not reuse an id before its job finishes.
    pub fn register(&self, id: &str) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        let mut active = self.lock_active();
        if active.insert(id.to_string(), flag.clone()).is_some() {
            log::warn!("Job id {} re-registered while still active", id);
        }
        log::info!("Registered cancel flag for job {}", id);
        flag
    }

    /// Signal the flag for `id` if a transfer is in flight.
    ///
    /// Returns `false` when no such job is active - not an error; the job
    /// may never have started or may already be finished. Signalling twice
    /// is a no-op.
    pub fn cancel(&self, id: &str) -> bool {
        let active = self.lock_active();
        match active.get(id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                log::info!("Cancel requested for job {}", id);
                true
            }
            None => {
                log::info!("Cancel requested for unknown job {}", id);
                false
            }
        }
    }

    /// Drop the entry for `id`. Idempotent.
    pub fn remove(&self, id: &str) {
        let mut active = self.lock_active();
        if active.remove(id).is_some() {
            log::info!("Cleaned up cancel flag for job {}", id);
        }
    }

    /// Number of in-flight jobs. Test and diagnostics helper.
    pub fn active_count(&self) -> usize {
        self.lock_active().len()
    }

    /// Recover from poisoning instead of panicking: the map only ever holds
    /// id-to-flag pairs, so a writer that panicked mid-operation cannot
    /// leave it in a state worse than a stale entry.
    fn lock_active(&self) -> MutexGuard<'_, HashMap<String, Arc<AtomicBool>>> {
        self.active.lock().unwrap_or_else(|poisoned| {
            log::warn!("Cancel registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::CancelRegistry;
    use std::sync::atomic::Ordering;

    #[test]
    fn cancel_signals_registered_flag() {
        let registry = CancelRegistry::new();
        let flag = registry.register("job-1");

        assert!(registry.cancel("job-1"));
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn cancel_of_unknown_id_reports_not_found() {
        let registry = CancelRegistry::new();
        assert!(!registry.cancel("missing"));
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = CancelRegistry::new();
        registry.register("job-1");

        registry.remove("job-1");
        registry.remove("job-1");

        assert!(!registry.cancel("job-1"));
    }

    #[test]
    fn re_registering_replaces_the_flag() {
        let registry = CancelRegistry::new();
        let first = registry.register("job-1");
        let second = registry.register("job-1");

        assert!(registry.cancel("job-1"));
        assert!(!first.load(Ordering::SeqCst));
        assert!(second.load(Ordering::SeqCst));
        assert_eq!(registry.active_count(), 1);
    }
}
