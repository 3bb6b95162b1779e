//! Debug-only guard against strategies calling back into their map.
//!
//! A map operation may call user code mid-flight: the hash strategy while
//! addressing a bucket, the destroy strategy while a chain is being
//! relinked. Neither may call back into the same map. Each guarded section
//! is labelled with the operation that opened it, so in debug builds a
//! nested entry panics naming both the running operation and the one that
//! tried to start. In release builds the guard is a zero-sized no-op.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// Per-map tracker of the operation currently running. Operations open a
/// section with `let _g = self.reentrancy.enter("put");`.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    running: Cell<Option<&'static str>>,
    // Keeps the owning map !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            running: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Open the section for `op`. Panics in debug builds if another
    /// operation's section is still open.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> SectionGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.running.get() {
                panic!("ChainHashMap::{op} called from a strategy while ChainHashMap::{outer} is running");
            }
            self.running.set(Some(op));
            SectionGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            SectionGuard { _z: PhantomData }
        }
    }

    /// The operation whose section is open, if any. Always `None` in
    /// release builds.
    #[cfg(test)]
    pub(crate) fn running(&self) -> Option<&'static str> {
        #[cfg(debug_assertions)]
        {
            self.running.get()
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// Closes the section on drop, including during unwinding.
pub(crate) struct SectionGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for SectionGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.running.get().is_some());
            self.owner.running.set(None);
        }
    }
}
