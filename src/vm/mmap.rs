// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Memory-Mapping Interface
//!
//! Reserve, release and commit ranges of the process address space. All
//! mappings are private and anonymous.
//!
//! The fault handler only ever sees the [`Backing`] trait, so the
//! evict/map/materialize logic does not depend on how pages are obtained.

use std::ptr;

use bitflags::bitflags;
use clap::ValueEnum;

use super::layout::VAddr;
use crate::err::{PagerError, Result};
use crate::log_warn;

bitflags! {
    /// Access permissions of a mapping
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Protection: i32 {
        /// Readable
        const READ = libc::PROT_READ;

        /// Writable
        const WRITE = libc::PROT_WRITE;
    }
}

impl Protection {
    /// Address space only, no access
    pub const NONE: Self = Self::empty();

    /// Read + Write
    pub const RW: Self = Self::READ.union(Self::WRITE);
}

/// How a page address is passed to the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Placement {
    /// Demand the exact address, refusing to replace an existing mapping
    #[default]
    Exact,

    /// Pass the address as a hint only
    Hint,
}

impl Placement {
    fn map_flags(self) -> i32 {
        let base = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
        match self {
            Placement::Exact => base | libc::MAP_FIXED_NOREPLACE,
            Placement::Hint => base,
        }
    }
}

fn mmap_raw(addr: VAddr, len: usize, prot: Protection, flags: i32) -> std::io::Result<VAddr> {
    let ptr = unsafe { libc::mmap(addr as *mut libc::c_void, len, prot.bits(), flags, -1, 0) };
    if ptr == libc::MAP_FAILED {
        return Err(std::io::Error::last_os_error());
    }
    Ok(ptr as VAddr)
}

/// Reserve `len` bytes with no access and let the OS pick the base
pub fn reserve(len: usize) -> Result<VAddr> {
    mmap_raw(0, len, Protection::NONE, libc::MAP_PRIVATE | libc::MAP_ANONYMOUS)
        .map_err(|source| PagerError::Reserve { len, source })
}

/// Map `len` read-write bytes wherever the OS likes
pub fn map_anywhere(len: usize) -> Result<VAddr> {
    mmap_raw(0, len, Protection::RW, libc::MAP_PRIVATE | libc::MAP_ANONYMOUS)
        .map_err(|source| PagerError::Map { addr: 0, source })
}

/// Map `len` read-write bytes at `addr`
///
/// The address must be page aligned. A placement other than the one
/// requested is undone and reported as [`PagerError::Misplaced`].
pub fn map_at(addr: VAddr, len: usize, placement: Placement) -> Result<VAddr> {
    let placed = mmap_raw(addr, len, Protection::RW, placement.map_flags())
        .map_err(|source| PagerError::Map { addr, source })?;

    if placed != addr {
        if let Err(err) = unmap(placed, len) {
            log_warn!("unmapping misplaced page failed: {}", err);
        }
        return Err(PagerError::Misplaced {
            requested: addr,
            placed,
        });
    }
    Ok(placed)
}

/// Release `len` bytes at `addr`
pub fn unmap(addr: VAddr, len: usize) -> Result<()> {
    if unsafe { libc::munmap(addr as *mut libc::c_void, len) } == -1 {
        return Err(PagerError::Unmap {
            addr,
            source: std::io::Error::last_os_error(),
        });
    }
    Ok(())
}

/// ============================================================================
/// Backing Interface
/// ============================================================================

/// Source of the memory that backs a faulting page
pub trait Backing {
    /// Commit `len` read-write bytes at exactly `addr`
    fn commit(&mut self, addr: VAddr, len: usize) -> Result<VAddr>;

    /// Give back a range obtained from [`Backing::commit`]
    fn release(&mut self, addr: VAddr, len: usize) -> Result<()>;
}

/// Anonymous private mappings
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousBacking {
    placement: Placement,
}

impl AnonymousBacking {
    /// Create a backing using `placement` for every commit
    pub const fn new(placement: Placement) -> Self {
        Self { placement }
    }
}

impl Backing for AnonymousBacking {
    fn commit(&mut self, addr: VAddr, len: usize) -> Result<VAddr> {
        map_at(addr, len, self.placement)
    }

    fn release(&mut self, addr: VAddr, len: usize) -> Result<()> {
        unmap(addr, len)
    }
}

/// Read one element without letting the compiler cache or elide it
///
/// # Safety
///
/// `addr` must be aligned for `T` and either readable or covered by an
/// installed fault handler that will make it readable.
#[inline]
pub unsafe fn read_volatile<T: Copy>(addr: VAddr) -> T {
    ptr::read_volatile(addr as *const T)
}
