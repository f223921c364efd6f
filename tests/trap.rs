// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! In-process fault handling tests.
//!
//! The SIGSEGV handler is process-wide and cannot be removed, so this
//! binary holds exactly one test that opens one table and runs every
//! check against it in order. No ceiling is applied; the test harness
//! shares the process.

use sqrt_pager::validate::{self, reference_holds};
use sqrt_pager::vm::{oracle, residency, trap};
use sqrt_pager::{PagerError, SqrtTable, TableConfig};

const ENTRIES: usize = 1 << 22;

#[test]
fn test_demand_paged_table() {
    let config = TableConfig {
        entries: ENTRIES,
        ceiling: None,
        guard: Some(1 << 25),
        ..TableConfig::default()
    };
    let table = SqrtTable::open(&config).unwrap();
    let layout = *table.layout();
    let per_page = layout.entries_per_page();

    assert!(trap::is_installed());
    assert_eq!(trap::layout(), Some(layout));
    assert_eq!(table.stats().faults, 0);
    assert_eq!(residency::accessible_bytes_within(layout.base, layout.end()).unwrap(), 0);

    // First touch materializes the first page.
    assert_eq!(table.get(0).unwrap(), 0.0);
    let stats = table.stats();
    assert_eq!(stats.faults, 1);
    assert_eq!(stats.active_page, Some(layout.base));

    // Same page again: no trap, no oracle call.
    assert_eq!(table.get(1).unwrap(), 1.0);
    assert_eq!(table.get(per_page - 1).unwrap(), oracle::value(per_page - 1));
    assert_eq!(table.get(0).unwrap(), 0.0);
    let stats = table.stats();
    assert_eq!(stats.faults, 1);
    assert_eq!(stats.materialized, 1);

    // First index of the second page evicts the first.
    assert_eq!(table.get(per_page).unwrap(), (per_page as f64).sqrt());
    let stats = table.stats();
    assert_eq!(stats.faults, 2);
    assert_eq!(stats.evictions, 1);
    assert!(!residency::is_accessible(layout.base).unwrap());
    assert!(residency::is_resident(layout.entry_addr(per_page)).unwrap());
    assert_eq!(
        residency::accessible_bytes_within(layout.base, layout.end()).unwrap(),
        layout.page_size
    );

    // Last entry.
    let last = table.get(ENTRIES - 1).unwrap();
    assert_eq!(last, ((ENTRIES - 1) as f64).sqrt());
    assert!(reference_holds(ENTRIES - 1, last));

    // One past the end is rejected before any access.
    let faults = table.stats().faults;
    assert!(matches!(
        table.get(ENTRIES),
        Err(PagerError::OutOfRange { index: ENTRIES, entries: ENTRIES })
    ));
    assert_eq!(table.stats().faults, faults);

    // Only one table per process.
    assert!(matches!(SqrtTable::open(&config), Err(PagerError::AlreadyInstalled)));

    // Seeded walk, then spread-out pages with residency checked each time.
    let report = validate::random_walk(&table, 20_000, 0xDEAD_BEEF).unwrap();
    assert_eq!(report.reads, 20_000);
    assert!(report.faults > 0 && report.faults <= 20_000);

    assert!(matches!(
        validate::residency_walk(&table, 0),
        Err(PagerError::Config(_))
    ));
    let report = validate::residency_walk(&table, 128).unwrap();
    assert_eq!(report.pages, 128);
    assert_eq!(report.max_accessible, layout.page_size);

    let stats = table.stats();
    assert_eq!(stats.failed_releases, 0);
    assert_eq!(stats.faults, stats.materialized);
    assert_eq!(stats.evictions + 1, stats.faults);
}
