// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Square Root Table
//!
//! The read side of the pager. [`SqrtTable::open`] runs the whole setup
//! sequence once; after that every [`SqrtTable::get`] is a plain load that
//! may trap into the fault handler and resume with the right value.

use std::sync::Arc;

use crate::config::TableConfig;
use crate::err::{PagerError, Result};
use crate::vm::fault::{FaultHandler, FaultStats, FaultStatsSnapshot};
use crate::vm::layout::{Entry, TableLayout};
use crate::vm::mmap::{self, AnonymousBacking};
use crate::vm::{reservation, trap};

/// Handle on the demand-paged table
#[derive(Debug, Clone)]
pub struct SqrtTable {
    layout: TableLayout,
    stats: Arc<FaultStats>,
}

impl SqrtTable {
    /// Reserve the table, apply the ceiling and install the fault handler
    ///
    /// Only one table can exist per process.
    pub fn open(config: &TableConfig) -> Result<Self> {
        if trap::is_installed() {
            return Err(PagerError::AlreadyInstalled);
        }
        let layout = reservation::setup_region(config)?;
        let handler = FaultHandler::new(layout, AnonymousBacking::new(config.placement));
        let stats = trap::install(handler)?;
        Ok(Self { layout, stats })
    }

    /// Where the table lives
    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.layout.entries
    }

    /// Whether the table has no entries; `open` never builds one
    pub fn is_empty(&self) -> bool {
        self.layout.entries == 0
    }

    /// Fault handler counters
    pub fn stats(&self) -> FaultStatsSnapshot {
        self.stats.snapshot()
    }

    /// Read entry `index`
    pub fn get(&self, index: usize) -> Result<Entry> {
        if index >= self.layout.entries {
            return Err(PagerError::OutOfRange {
                index,
                entries: self.layout.entries,
            });
        }
        // SAFETY: in range and aligned; the installed handler backs the page.
        Ok(unsafe { self.get_unchecked(index) })
    }

    /// Read entry `index` without a bounds check
    ///
    /// # Safety
    ///
    /// `index` must be below [`SqrtTable::len`]. Anything past the table
    /// is not serviced and faults like any other wild access.
    pub unsafe fn get_unchecked(&self, index: usize) -> Entry {
        mmap::read_volatile(self.layout.entry_addr(index))
    }
}
