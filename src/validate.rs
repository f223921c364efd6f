// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Table Validation
//!
//! Reads the table the way any consumer would and checks what comes back.
//!
//! Every value is compared twice: bit-for-bit against the oracle, and
//! against an integer square root computed here by Newton iteration. The
//! second check does not share code with the oracle, so it still catches
//! a broken oracle.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::err::{PagerError, Result};
use crate::table::SqrtTable;
use crate::vm::layout::Entry;
use crate::vm::{mmap, oracle, residency};
use crate::{log_debug, log_info};

/// ============================================================================
/// Independent Reference
/// ============================================================================

/// Floor of the square root of `n`
pub fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = x / 2 + (x & 1);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// Whether `value` is an acceptable square root of `index`
///
/// Perfect squares must come back exact; everything else must sit
/// between consecutive integer roots and square back to `index` within a
/// few ulps.
pub fn reference_holds(index: usize, value: Entry) -> bool {
    let root = isqrt(index as u64);
    if root * root == index as u64 {
        return value == root as Entry;
    }
    let target = index as Entry;
    value >= root as Entry
        && value <= (root + 1) as Entry
        && (value * value - target).abs() <= 4.0 * Entry::EPSILON * target
}

/// Read `index` and check it against both references
pub fn check(table: &SqrtTable, index: usize) -> Result<Entry> {
    let observed = table.get(index)?;
    let expected = oracle::value(index);
    if observed.to_bits() != expected.to_bits() || !reference_holds(index, observed) {
        return Err(PagerError::Mismatch {
            index,
            expected,
            observed,
        });
    }
    Ok(observed)
}

/// ============================================================================
/// Random Walk
/// ============================================================================

/// Outcome of [`random_walk`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkReport {
    /// Values read and checked
    pub reads: usize,

    /// Faults serviced during the walk
    pub faults: u64,
}

/// Read `iterations` entries along a seeded walk
///
/// Even steps jump to a random index, odd steps move to the next one, so
/// both cold pages and neighbours of the active page are exercised.
pub fn random_walk(table: &SqrtTable, iterations: usize, seed: u64) -> Result<WalkReport> {
    log_info!("Validating square root table contents...");
    let mut rng = StdRng::seed_from_u64(seed);
    let entries = table.len();
    let jump_range = entries.saturating_sub(1).max(1);
    let faults_before = table.stats().faults;

    let mut pos = 0;
    for step in 0..iterations {
        pos = if step % 2 == 0 {
            rng.gen_range(0..jump_range)
        } else {
            (pos + 1) % entries
        };
        check(table, pos)?;
    }

    let report = WalkReport {
        reads: iterations,
        faults: table.stats().faults - faults_before,
    };
    log_debug!("walk of {} reads took {} faults", report.reads, report.faults);
    Ok(report)
}

/// ============================================================================
/// Residency
/// ============================================================================

/// Outcome of [`residency_walk`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResidencyReport {
    /// Distinct pages read
    pub pages: usize,

    /// Most bytes ever accessible inside the table
    pub max_accessible: usize,

    /// Faults serviced during the walk
    pub faults: u64,
}

/// Touch `pages` distinct pages spread over the table, checking after
/// each read that only one page of it is accessible
///
/// `pages` must be at least one.
///
/// Only the entries are inspected. The guard tail is where unrelated
/// mappings made after the probe tend to land.
pub fn residency_walk(table: &SqrtTable, pages: usize) -> Result<ResidencyReport> {
    if pages == 0 {
        return Err(PagerError::Config("residency walk needs at least one page".into()));
    }
    let layout = *table.layout();
    let per_page = layout.entries_per_page();
    let total_pages = layout.entries.div_ceil(per_page);
    let pages = pages.min(total_pages);
    let stride = (total_pages / pages).max(1);
    let faults_before = table.stats().faults;

    let mut max_accessible = 0;
    for k in 0..pages {
        let page = (k * stride) % total_pages;
        let index = (page * per_page + k % per_page).min(layout.entries - 1);
        check(table, index)?;

        let accessible = residency::accessible_bytes_within(layout.base, layout.end())?;
        max_accessible = max_accessible.max(accessible);
        if accessible > layout.page_size || !residency::is_resident(layout.entry_addr(index))? {
            return Err(PagerError::Residency {
                mapped: accessible,
                limit: layout.page_size,
            });
        }
    }

    Ok(ResidencyReport {
        pages,
        max_accessible,
        faults: table.stats().faults - faults_before,
    })
}

/// ============================================================================
/// Ceiling Probe
/// ============================================================================

/// Try to back the whole table span eagerly; succeed only if refused
pub fn probe_ceiling(table: &SqrtTable) -> Result<usize> {
    let len = table.layout().span();
    match mmap::map_anywhere(len) {
        Err(PagerError::Map { source, .. }) => {
            log_debug!("eager mapping of {:#x} bytes refused: {}", len, source);
            Ok(len)
        }
        Err(other) => Err(other),
        Ok(addr) => {
            let _ = mmap::unmap(addr, len);
            Err(PagerError::CeilingNotEnforced { len })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_isqrt_small() {
        let roots: Vec<u64> = (0..17).map(isqrt).collect();
        assert_eq!(roots, [0, 1, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 3, 4]);
    }

    #[test]
    fn test_isqrt_extremes() {
        assert_eq!(isqrt(u64::MAX), u32::MAX as u64);
        assert_eq!(isqrt((1 << 54) - 1), (1 << 27) - 1);
    }

    #[test]
    fn test_reference_catches_wrong_values() {
        assert!(reference_holds(0, 0.0));
        assert!(reference_holds(16, 4.0));
        assert!(!reference_holds(16, 4.000_000_1));
        assert!(!reference_holds(17, 17f64.sqrt() + 1e-9));
        assert!(!reference_holds(17, 17.0 / 2.0));
    }

    proptest! {
        #[test]
        fn prop_oracle_agrees_with_reference(index in 0usize..(1 << 27)) {
            prop_assert!(reference_holds(index, oracle::value(index)));
        }

        #[test]
        fn prop_isqrt_is_floor(n in any::<u64>()) {
            let r = isqrt(n) as u128;
            prop_assert!(r * r <= n as u128);
            prop_assert!((r + 1) * (r + 1) > n as u128);
        }
    }
}
