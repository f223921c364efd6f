// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Invalid-Access Trap Binding
//!
//! Binds a [`FaultHandler`] to `SIGSEGV` for the rest of the process
//! lifetime. This is the only Linux signal code in the crate; everything
//! the callback does goes through the portable handler.
//!
//! The callback runs in signal context. It calls `mmap`/`munmap` and
//! computes square roots there, which POSIX does not promise is safe,
//! and it logs from there on the error paths.

use std::cell::UnsafeCell;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use libc::{c_int, c_void};
use spin::Once;

use super::fault::{FaultHandler, FaultOutcome, FaultStats, FaultStatsSnapshot};
use super::layout::{TableLayout, VAddr};
use super::mmap::AnonymousBacking;
use crate::err::{PagerError, Result};
use crate::{log_error, log_info};

/// Handler state reachable from the signal callback
struct TrapSlot {
    handler: UnsafeCell<FaultHandler<AnonymousBacking>>,
    previous: libc::sigaction,
    layout: TableLayout,
    stats: Arc<FaultStats>,
}

// SAFETY: `handler` is only touched from the callback, which runs on the
// single faulting thread while that thread is stopped.
unsafe impl Sync for TrapSlot {}

static TRAP: Once<TrapSlot> = Once::new();

/// Set while an `install` is between claiming the slot and filling it
static INSTALLING: AtomicBool = AtomicBool::new(false);

/// Register `handler` as the process-wide response to `SIGSEGV`
///
/// There is no uninstall. A second call fails with
/// [`PagerError::AlreadyInstalled`]. If registration itself fails nothing
/// is kept and a later call may try again.
pub fn install(handler: FaultHandler<AnonymousBacking>) -> Result<Arc<FaultStats>> {
    install_on(libc::SIGSEGV, handler)
}

fn install_on(signum: c_int, handler: FaultHandler<AnonymousBacking>) -> Result<Arc<FaultStats>> {
    if TRAP.is_completed()
        || INSTALLING
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
    {
        return Err(PagerError::AlreadyInstalled);
    }

    let previous = match register(signum) {
        Ok(previous) => previous,
        Err(err) => {
            INSTALLING.store(false, Ordering::Release);
            return Err(err);
        }
    };

    let stats = handler.stats();
    let layout = *handler.layout();
    TRAP.call_once(|| TrapSlot {
        handler: UnsafeCell::new(handler),
        previous,
        layout,
        stats: Arc::clone(&stats),
    });

    log_info!("SIGSEGV handler installed for {:#x}..{:#x}", layout.base, layout.end());
    Ok(stats)
}

/// Point `signum` at the callback and return the disposition it replaced
fn register(signum: c_int) -> Result<libc::sigaction> {
    let mut action: libc::sigaction = unsafe { mem::zeroed() };
    action.sa_sigaction = on_invalid_access as usize;
    action.sa_flags = libc::SA_SIGINFO;
    unsafe { libc::sigemptyset(&mut action.sa_mask) };

    let mut previous: libc::sigaction = unsafe { mem::zeroed() };
    if unsafe { libc::sigaction(signum, &action, &mut previous) } == -1 {
        return Err(PagerError::TrapInstall {
            source: std::io::Error::last_os_error(),
        });
    }
    Ok(previous)
}

/// Whether a handler has been installed
pub fn is_installed() -> bool {
    TRAP.is_completed()
}

/// Counters of the installed handler
pub fn stats() -> Option<FaultStatsSnapshot> {
    TRAP.get().map(|slot| slot.stats.snapshot())
}

/// Table serviced by the installed handler
pub fn layout() -> Option<TableLayout> {
    TRAP.get().map(|slot| slot.layout)
}

extern "C" fn on_invalid_access(_sig: c_int, info: *mut libc::siginfo_t, _ctx: *mut c_void) {
    // No slot yet means `install` has registered but not filled it; the
    // previous disposition is not known here, so fall back to the default.
    let Some(slot) = TRAP.get() else {
        unsafe { libc::signal(libc::SIGSEGV, libc::SIG_DFL) };
        return;
    };
    let addr = unsafe { (*info).si_addr() } as VAddr;

    // SAFETY: see `TrapSlot`; no other reference to the handler is live.
    let handler = unsafe { &mut *slot.handler.get() };
    match handler.handle_fault(addr) {
        Ok(FaultOutcome::Serviced) => {}
        Ok(FaultOutcome::Foreign) => {
            // Hand the fault back to whoever had SIGSEGV before us; the
            // instruction re-faults into them once we return.
            unsafe { libc::sigaction(libc::SIGSEGV, &slot.previous, ptr::null_mut()) };
        }
        Err(err) => {
            log_error!("Mapping in fault handler failed: {}", err);
            unsafe { libc::_exit(libc::EXIT_FAILURE) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::layout::page_size;
    use crate::vm::mmap::Placement;

    fn idle_handler() -> FaultHandler<AnonymousBacking> {
        let page = page_size();
        let layout = TableLayout::new(0x1000_0000, 1 << 10, page, page);
        FaultHandler::new(layout, AnonymousBacking::new(Placement::Exact))
    }

    #[test]
    fn test_failed_registration_keeps_nothing() {
        // SIGKILL cannot be caught, so sigaction refuses it.
        let err = install_on(libc::SIGKILL, idle_handler()).unwrap_err();
        assert!(matches!(err, PagerError::TrapInstall { .. }));
        assert!(!is_installed());
        assert_eq!(layout(), None);

        // Nothing is held, so another attempt is not AlreadyInstalled.
        let err = install_on(libc::SIGKILL, idle_handler()).unwrap_err();
        assert!(matches!(err, PagerError::TrapInstall { .. }));
        assert!(!INSTALLING.load(Ordering::Acquire));
    }
}
