// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Page and Table Geometry
//!
//! Page size is whatever the host reports; nothing here assumes 4KB.
//! [`TableLayout`] describes where the logical table lives once its base
//! has been chosen and how addresses inside it map to element indices.

use std::mem;

/// Virtual address type
pub type VAddr = usize;

/// Element stored in the table
pub type Entry = f64;

/// Size of one table element in bytes
pub const ENTRY_SIZE: usize = mem::size_of::<Entry>();

/// Host page size in bytes
pub fn page_size() -> usize {
    // sysconf(_SC_PAGESIZE) cannot fail on Linux
    unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}

/// Align an address down to a power-of-two boundary
#[inline]
pub const fn align_down(addr: usize, align: usize) -> usize {
    addr & !(align - 1)
}

/// Check if an address is aligned to a power-of-two boundary
#[inline]
pub const fn is_aligned(addr: usize, align: usize) -> bool {
    (addr & (align - 1)) == 0
}

/// ============================================================================
/// Table Layout
/// ============================================================================

/// Placement of the logical table in the address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    /// First byte of element 0
    pub base: VAddr,

    /// Number of logical entries
    pub entries: usize,

    /// Bytes reserved past the last entry
    pub guard: usize,

    /// Host page size
    pub page_size: usize,
}

impl TableLayout {
    /// Create a layout for a table at `base`
    pub const fn new(base: VAddr, entries: usize, guard: usize, page_size: usize) -> Self {
        Self {
            base,
            entries,
            guard,
            page_size,
        }
    }

    /// Bytes covered by the entries themselves
    pub const fn table_bytes(&self) -> usize {
        self.entries * ENTRY_SIZE
    }

    /// Bytes of address space the table spans, guard included
    pub const fn span(&self) -> usize {
        self.table_bytes() + self.guard
    }

    /// One past the last byte of the last entry
    pub const fn end(&self) -> VAddr {
        self.base + self.table_bytes()
    }

    /// Entries held by one page
    pub const fn entries_per_page(&self) -> usize {
        self.page_size / ENTRY_SIZE
    }

    /// Whether `addr` falls on a table entry
    pub const fn contains(&self, addr: VAddr) -> bool {
        addr >= self.base && addr < self.end()
    }

    /// Address of element `index`
    pub const fn entry_addr(&self, index: usize) -> VAddr {
        self.base + index * ENTRY_SIZE
    }

    /// Index of the element stored at `addr`
    pub const fn index_of(&self, addr: VAddr) -> usize {
        (addr - self.base) / ENTRY_SIZE
    }

    /// Start of the page holding `addr`
    pub const fn page_of(&self, addr: VAddr) -> VAddr {
        align_down(addr, self.page_size)
    }
}
