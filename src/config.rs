// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Table Configuration
//!
//! Sizes default to a 2^27-entry table under a 2^25-byte ceiling: the
//! table spans 1GB of address space while the whole process may map only
//! 32MB.

use clap::Args;

use crate::err::{PagerError, Result};
use crate::vm::layout::{page_size, ENTRY_SIZE};
use crate::vm::mmap::Placement;

/// Default log2 of the table entry count
pub const DEFAULT_ENTRIES_LOG2: u32 = 27;

/// Default log2 of the address-space ceiling in bytes
pub const DEFAULT_CEILING_LOG2: u32 = 25;

/// Default number of validation reads
pub const DEFAULT_ITERATIONS: usize = 500_000;

/// Default validation seed
pub const DEFAULT_SEED: u64 = 0xDEAD_BEEF;

/// Geometry and limits of the paged table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Logical entries in the table
    pub entries: usize,

    /// Address-space ceiling in bytes, or `None` to leave the limit alone
    pub ceiling: Option<usize>,

    /// Bytes reserved past the table; defaults to the ceiling size
    pub guard: Option<usize>,

    /// How fault-time pages are placed
    pub placement: Placement,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            entries: 1 << DEFAULT_ENTRIES_LOG2,
            ceiling: Some(1 << DEFAULT_CEILING_LOG2),
            guard: None,
            placement: Placement::default(),
        }
    }
}

impl TableConfig {
    /// Guard bytes appended to the reserved span
    pub fn guard(&self) -> usize {
        self.guard
            .or(self.ceiling)
            .unwrap_or(1 << DEFAULT_CEILING_LOG2)
    }

    /// Total bytes of address space to reserve
    pub fn span(&self) -> Result<usize> {
        self.entries
            .checked_mul(ENTRY_SIZE)
            .and_then(|bytes| bytes.checked_add(self.guard()))
            .ok_or_else(|| PagerError::Config(format!("{} entries overflow the address space", self.entries)))
    }

    /// Reject configurations that cannot be laid out
    pub fn validate(&self) -> Result<()> {
        if self.entries == 0 {
            return Err(PagerError::Config("table needs at least one entry".into()));
        }
        self.span()?;
        if let Some(ceiling) = self.ceiling {
            if ceiling < page_size() {
                return Err(PagerError::Config(format!(
                    "ceiling of {ceiling:#x} bytes is smaller than a page"
                )));
            }
        }
        Ok(())
    }
}

/// Command-line view of [`TableConfig`]
#[derive(Debug, Clone, Args)]
pub struct TableArgs {
    /// log2 of the number of table entries
    #[arg(long, default_value_t = DEFAULT_ENTRIES_LOG2, value_parser = clap::value_parser!(u32).range(0..=40))]
    pub entries_log2: u32,

    /// log2 of the address-space ceiling in bytes
    #[arg(long, default_value_t = DEFAULT_CEILING_LOG2, value_parser = clap::value_parser!(u32).range(12..=47))]
    pub ceiling_log2: u32,

    /// Leave the address-space ceiling untouched
    #[arg(long)]
    pub no_ceiling: bool,

    /// How pages are placed at the faulting address
    #[arg(long, value_enum, default_value_t = Placement::Exact)]
    pub placement: Placement,
}

impl TableArgs {
    /// Build the table configuration
    pub fn to_config(&self) -> TableConfig {
        let ceiling = 1usize << self.ceiling_log2;
        TableConfig {
            entries: 1usize << self.entries_log2,
            ceiling: (!self.no_ceiling).then_some(ceiling),
            guard: Some(ceiling),
            placement: self.placement,
        }
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal integer
pub fn parse_u64(s: &str) -> core::result::Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse(),
    };
    parsed.map_err(|err| format!("`{s}` is not a number: {err}"))
}
