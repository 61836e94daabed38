//! Atomic ownership handoff for one side of the shared pixel buffer.
//!
//! Each logical buffer side (the render-thread frame side, the UI-thread
//! image side) carries one `TransferState` word. A side may only touch the
//! buffer while it holds `RUNNING`, which is entered exclusively by
//! compare-and-swap from `WAITING`. `DISPOSING`/`DISPOSED` form the one-shot
//! teardown path; `DISPOSED` is terminal. The word is the only
//! synchronization on the buffer, so a failed `RUNNING -> WAITING` exit
//! means some other party mutated the state out from under the protocol and
//! the caller must treat it as a logic bug.

#[cfg(all(feature = "loom", test))]
use loom::sync::atomic::AtomicU32;
#[cfg(not(all(feature = "loom", test)))]
use std::sync::atomic::AtomicU32;

use std::sync::atomic::Ordering;

const WAITING: u32 = 0;
const RUNNING: u32 = 1;
const DISPOSING: u32 = 2;
const DISPOSED: u32 = 3;

/// Result of a single [`TransferState::try_enter_running`] attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterOutcome {
    /// The caller now owns the buffer side and must call `exit_running`.
    Entered,
    /// Another party holds the side right now; retry.
    Contended,
    /// The side has been (or is being) torn down; abort the operation.
    Disposed,
}

/// `exit_running` found the state was not `RUNNING`.
///
/// Success is guaranteed by the protocol, so this is an invariant breach:
/// abort in debug builds, log loudly and continue in release. The policy
/// lives at the call site; this crate only reports the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitError {
    /// The state word observed instead of `RUNNING`.
    pub observed: u32,
}

impl std::fmt::Display for ExitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "transfer state was mutated by an unexpected party (observed {} instead of RUNNING)",
            self.observed
        )
    }
}

impl std::error::Error for ExitError {}

/// One side of the buffer handoff protocol.
pub struct TransferState(AtomicU32);

impl TransferState {
    pub fn new() -> Self {
        Self(AtomicU32::new(WAITING))
    }

    /// Attempt `WAITING -> RUNNING` once.
    pub fn try_enter_running(&self) -> EnterOutcome {
        match self
            .0
            .compare_exchange(WAITING, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => EnterOutcome::Entered,
            Err(DISPOSING) | Err(DISPOSED) => EnterOutcome::Disposed,
            Err(_) => EnterOutcome::Contended,
        }
    }

    /// Spin until the side is entered, or return `false` if it is disposed.
    ///
    /// Contention is single-tick in duration (the other party is mid-copy or
    /// mid-publish), so the spin is bounded in practice.
    pub fn enter_running(&self) -> bool {
        loop {
            match self.try_enter_running() {
                EnterOutcome::Entered => return true,
                EnterOutcome::Disposed => return false,
                EnterOutcome::Contended => spin_hint(),
            }
        }
    }

    /// `RUNNING -> WAITING`. Must pair with a successful enter.
    pub fn exit_running(&self) -> Result<(), ExitError> {
        match self
            .0
            .compare_exchange(RUNNING, WAITING, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => Ok(()),
            Err(observed) => Err(ExitError { observed }),
        }
    }

    /// Spin the side from `WAITING` into `DISPOSING`, draining any in-flight
    /// enter/exit pair first. Returns `false` if the side is already disposed,
    /// in which case teardown must not run again.
    pub fn begin_dispose(&self) -> bool {
        loop {
            match self
                .0
                .compare_exchange(WAITING, DISPOSING, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return true,
                Err(DISPOSED) => return false,
                Err(_) => spin_hint(),
            }
        }
    }

    /// `DISPOSING -> DISPOSED`. Must follow a `begin_dispose` that returned
    /// `true`, after teardown has completed.
    pub fn finish_dispose(&self) {
        let swapped = self
            .0
            .compare_exchange(DISPOSING, DISPOSED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        debug_assert!(swapped, "finish_dispose without a matching begin_dispose");
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.0.load(Ordering::SeqCst), DISPOSING | DISPOSED)
    }
}

impl Default for TransferState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(feature = "loom", test))]
fn spin_hint() {
    loom::thread::yield_now();
}

#[cfg(not(all(feature = "loom", test)))]
#[inline]
fn spin_hint() {
    std::hint::spin_loop();
}
