// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Region Reservation
//!
//! Picks a base address for the whole logical table without keeping any
//! of it mapped, then lowers the address-space ceiling so the table could
//! never be backed eagerly.
//!
//! # Setup Flow
//!
//! ```text
//! 1. mmap(NULL, span, PROT_NONE)   -> base chosen by the OS
//! 2. munmap(base, span)            -> nothing held, base remembered
//! 3. setrlimit(RLIMIT_AS, ceiling) -> before any per-page mapping
//! ```

use super::layout::{page_size, TableLayout, VAddr};
use super::mmap;
use super::rlimit::AddressSpaceCeiling;
use crate::config::TableConfig;
use crate::err::{PagerError, Result};
use crate::{log_debug, log_info};

/// Find a free range of `len` bytes and return its base
///
/// The probe mapping is released before returning, so the range costs
/// nothing against the ceiling.
pub fn reserve(len: usize) -> Result<VAddr> {
    let base = mmap::reserve(len)?;
    log_debug!("address-space probe: {:#x} bytes at {:#x}", len, base);

    mmap::unmap(base, len).map_err(|err| match err {
        PagerError::Unmap { addr, source } => PagerError::ReleaseProbe { addr, source },
        other => other,
    })?;
    Ok(base)
}

/// Cap total virtual address-space usage at `bytes`
pub fn apply_ceiling(bytes: usize) -> Result<()> {
    let previous = AddressSpaceCeiling::current()?;
    if previous.is_unlimited() {
        log_debug!("address-space ceiling was unlimited");
    } else {
        log_debug!("address-space ceiling was {:#x} bytes", previous.soft);
    }
    AddressSpaceCeiling::fixed(bytes as u64).apply()?;
    log_info!("address-space ceiling set to {:#x} bytes", bytes);
    Ok(())
}

/// Reserve the table described by `config` and apply its ceiling
pub fn setup_region(config: &TableConfig) -> Result<TableLayout> {
    config.validate()?;

    let page = page_size();
    let span = config.span()?;
    let base = reserve(span)?;
    let layout = TableLayout::new(base, config.entries, config.guard(), page);
    log_info!(
        "sqrt table: {} entries at {:#x}..{:#x}",
        layout.entries,
        layout.base,
        layout.end()
    );

    if let Some(ceiling) = config.ceiling {
        apply_ceiling(ceiling)?;
    }
    Ok(layout)
}
