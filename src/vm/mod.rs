// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Demand-Paging Core
//!
//! # Organization
//!
//! - [`layout`] - Page and table geometry
//! - [`oracle`] - Reference values that fill each page
//! - [`mmap`] - Memory-mapping interface and the [`Backing`] seam
//! - [`rlimit`] - Address-space ceiling
//! - [`reservation`] - Base address probe and ceiling setup
//! - [`fault`] - Evict / map / materialize state machine
//! - [`trap`] - `SIGSEGV` binding for the fault handler
//! - [`residency`] - What is mapped and resident right now

pub mod layout;
pub mod oracle;
pub mod mmap;
pub mod rlimit;
pub mod reservation;
pub mod fault;
pub mod trap;
pub mod residency;

// Re-exports for convenience
pub use layout::{page_size, Entry, TableLayout, VAddr, ENTRY_SIZE};

pub use mmap::{AnonymousBacking, Backing, Placement, Protection};

pub use rlimit::AddressSpaceCeiling;

pub use fault::{ActivePage, FaultHandler, FaultOutcome, FaultStats, FaultStatsSnapshot};
