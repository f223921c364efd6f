// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Page Fault Handler
//!
//! Services invalid-access faults inside the logical table by keeping
//! exactly one page of it backed at a time.
//!
//! # States
//!
//! - **Idle**: no page backed (before the first fault)
//! - **Backed**: one [`ActivePage`] present
//!
//! # Page Fault Handling Flow
//!
//! ```text
//! 1. Fault at addr inside the table
//! 2. Evict the active page (best effort)
//! 3. Map one read-write page at page_of(addr)
//! 4. Fill it from the oracle
//! 5. Record it as the active page and resume
//! ```
//!
//! The handler runs on the faulting thread with that thread stopped, so
//! it is the only writer of its state. Nothing here may touch an
//! unbacked part of the table; a nested fault on the same thread is not
//! supported.

use std::slice;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use super::layout::{Entry, TableLayout, VAddr};
use super::mmap::Backing;
use super::oracle;
use crate::err::Result;
use crate::{log_trace, log_warn};

/// ============================================================================
/// Fault Statistics
/// ============================================================================

/// Counters updated by the handler and readable from normal context
#[derive(Debug, Default)]
pub struct FaultStats {
    faults: AtomicU64,
    evictions: AtomicU64,
    failed_releases: AtomicU64,
    materialized: AtomicU64,
    active_page: AtomicUsize,
}

/// Point-in-time copy of [`FaultStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaultStatsSnapshot {
    /// Faults serviced
    pub faults: u64,

    /// Pages released before mapping a new one
    pub evictions: u64,

    /// Releases that failed and were forgotten anyway
    pub failed_releases: u64,

    /// Pages filled from the oracle
    pub materialized: u64,

    /// Start of the backed page, if any
    pub active_page: Option<VAddr>,
}

impl FaultStats {
    /// Take a snapshot
    pub fn snapshot(&self) -> FaultStatsSnapshot {
        let active = self.active_page.load(Ordering::Acquire);
        FaultStatsSnapshot {
            faults: self.faults.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            failed_releases: self.failed_releases.load(Ordering::Relaxed),
            materialized: self.materialized.load(Ordering::Relaxed),
            active_page: (active != 0).then_some(active),
        }
    }
}

/// ============================================================================
/// Fault Handler
/// ============================================================================

/// The single page currently backing part of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePage {
    /// Page-aligned start address
    pub start: VAddr,

    /// Length in bytes (one page)
    pub len: usize,
}

impl ActivePage {
    /// Whether `addr` lies on this page
    pub const fn contains(&self, addr: VAddr) -> bool {
        addr >= self.start && addr < self.start + self.len
    }
}

/// How a fault was dealt with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOutcome {
    /// A page was mapped and filled; the access can be retried
    Serviced,

    /// The fault is not a missing table page and belongs to someone else
    Foreign,
}

/// Evict / map / materialize state machine
#[derive(Debug)]
pub struct FaultHandler<B: Backing> {
    layout: TableLayout,
    backing: B,
    active: Option<ActivePage>,
    stats: Arc<FaultStats>,
}

impl<B: Backing> FaultHandler<B> {
    /// Create an idle handler for `layout`
    pub fn new(layout: TableLayout, backing: B) -> Self {
        Self {
            layout,
            backing,
            active: None,
            stats: Arc::new(FaultStats::default()),
        }
    }

    /// Table this handler services
    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Currently backed page
    pub fn active(&self) -> Option<ActivePage> {
        self.active
    }

    /// Shared handle on the counters
    pub fn stats(&self) -> Arc<FaultStats> {
        Arc::clone(&self.stats)
    }

    /// Service a fault at `addr`
    ///
    /// Returns [`FaultOutcome::Foreign`] without touching any state when
    /// `addr` is outside the table or already backed. An `Err` means the
    /// new page could not be mapped; the handler is then Idle.
    pub fn handle_fault(&mut self, addr: VAddr) -> Result<FaultOutcome> {
        if !self.layout.contains(addr) || self.active.is_some_and(|page| page.contains(addr)) {
            return Ok(FaultOutcome::Foreign);
        }
        self.stats.faults.fetch_add(1, Ordering::Relaxed);
        log_trace!("fault at {:#x} (index {})", addr, self.layout.index_of(addr));

        self.evict();

        let len = self.layout.page_size;
        let start = self.backing.commit(self.layout.page_of(addr), len)?;
        self.materialize(start, len);

        self.active = Some(ActivePage { start, len });
        self.stats.active_page.store(start, Ordering::Release);
        Ok(FaultOutcome::Serviced)
    }

    /// Release the active page, forgetting it even if the release fails
    fn evict(&mut self) {
        let Some(page) = self.active.take() else {
            return;
        };
        self.stats.active_page.store(0, Ordering::Release);

        match self.backing.release(page.start, page.len) {
            Ok(()) => {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.stats.failed_releases.fetch_add(1, Ordering::Relaxed);
                log_warn!("unmapping failed in fault handler: {}", err);
            }
        }
    }

    /// Fill the freshly mapped page at `start` from the oracle
    fn materialize(&mut self, start: VAddr, len: usize) {
        let first = self.layout.index_of(start);
        let count = len / core::mem::size_of::<Entry>();

        // SAFETY: `start..start + len` was just committed read-write and
        // nothing else refers to it.
        let page = unsafe { slice::from_raw_parts_mut(start as *mut Entry, count) };
        oracle::compute(first, page);
        self.stats.materialized.fetch_add(1, Ordering::Relaxed);
    }
}

impl<B: Backing> Drop for FaultHandler<B> {
    fn drop(&mut self) {
        self.evict();
    }
}
