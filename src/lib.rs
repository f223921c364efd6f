// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Demand-Paged Square Root Table
//!
//! Exposes a table of `2^27` square roots as one contiguous region while
//! only ever backing a single page of it. The region's base is probed and
//! released up front, the address-space ceiling is lowered far below the
//! table size, and every access outside the current page traps into a
//! handler that evicts the old page, maps a new one at the fault and fills
//! it from the oracle.
//!
//! ```text
//! SqrtTable::open
//!   -> reservation::setup_region  (probe base, release, set ceiling)
//!   -> trap::install              (SIGSEGV -> FaultHandler)
//! SqrtTable::get
//!   -> load -> SIGSEGV -> FaultHandler::handle_fault -> oracle::compute
//! ```
//!
//! Linux only.

pub mod config;
pub mod debug;
pub mod err;
pub mod table;
pub mod validate;
pub mod vm;

pub use config::TableConfig;
pub use err::{PagerError, Result};
pub use table::SqrtTable;
