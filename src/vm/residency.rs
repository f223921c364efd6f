// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Resident-Memory Accounting
//!
//! Reads `/proc/self/maps` to see what is mapped inside a range and uses
//! `mincore` to ask whether a page is physically present. Allocates, so
//! never call it from the fault handler.

use std::fs;

use super::layout::{align_down, page_size, VAddr};
use crate::err::Result;

/// One line of `/proc/self/maps`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    /// First byte
    pub start: VAddr,

    /// One past the last byte
    pub end: VAddr,

    /// Permission string, e.g. `rw-p`
    pub perms: String,
}

impl Mapping {
    /// Whether any access is permitted
    pub fn is_accessible(&self) -> bool {
        self.perms.bytes().take(3).any(|b| b != b'-')
    }

    /// Bytes shared with `start..end`
    pub fn overlap(&self, start: VAddr, end: VAddr) -> usize {
        self.end.min(end).saturating_sub(self.start.max(start))
    }

    fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let (start, end) = fields.next()?.split_once('-')?;
        let perms = fields.next()?.to_string();
        Some(Self {
            start: usize::from_str_radix(start, 16).ok()?,
            end: usize::from_str_radix(end, 16).ok()?,
            perms,
        })
    }
}

/// Parse a maps listing
pub fn parse_maps(text: &str) -> Vec<Mapping> {
    text.lines().filter_map(Mapping::parse).collect()
}

/// Current mappings of this process
pub fn mappings() -> Result<Vec<Mapping>> {
    Ok(parse_maps(&fs::read_to_string("/proc/self/maps")?))
}

/// Bytes of accessible mappings inside `start..end`
pub fn accessible_bytes_within(start: VAddr, end: VAddr) -> Result<usize> {
    Ok(mappings()?
        .iter()
        .filter(|m| m.is_accessible())
        .map(|m| m.overlap(start, end))
        .sum())
}

/// Whether the page holding `addr` may be accessed
pub fn is_accessible(addr: VAddr) -> Result<bool> {
    Ok(mappings()?
        .iter()
        .any(|m| m.is_accessible() && m.start <= addr && addr < m.end))
}

/// Whether the page holding `addr` is mapped and physically present
pub fn is_resident(addr: VAddr) -> Result<bool> {
    let page = page_size();
    let start = align_down(addr, page);
    let mut vec = [0u8; 1];
    let ret = unsafe { libc::mincore(start as *mut libc::c_void, page, vec.as_mut_ptr() as *mut libc::c_uchar) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return match err.raw_os_error() {
            Some(libc::ENOMEM) => Ok(false),
            _ => Err(err.into()),
        };
    }
    Ok(vec[0] & 1 == 1)
}
