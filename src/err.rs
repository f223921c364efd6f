// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Pager Error Codes
//!
//! This module provides the error type used throughout the pager.
//! Every failed OS call keeps the `errno` it produced as its source.

use std::io;

use thiserror::Error;

/// Result type for pager operations
pub type Result<T> = core::result::Result<T, PagerError>;

/// Pager errors
#[derive(Debug, Error)]
pub enum PagerError {
    /// The address-space probe found no free range of the requested size
    #[error("couldn't mmap() region for sqrt table ({len:#x} bytes): {source}")]
    Reserve {
        len: usize,
        #[source]
        source: io::Error,
    },

    /// The probe reservation could not be handed back
    #[error("couldn't munmap() region for sqrt table at {addr:#x}: {source}")]
    ReleaseProbe {
        addr: usize,
        #[source]
        source: io::Error,
    },

    /// The OS rejected the address-space ceiling
    #[error("couldn't set rlimit on RLIMIT_AS to {bytes:#x}: {source}")]
    Ceiling {
        bytes: usize,
        #[source]
        source: io::Error,
    },

    /// The trap callback could not be registered
    #[error("couldn't set up SIGSEGV handler: {source}")]
    TrapInstall {
        #[source]
        source: io::Error,
    },

    /// A trap callback is already registered for this process
    #[error("SIGSEGV handler is already installed")]
    AlreadyInstalled,

    /// A page of memory could not be committed
    #[error("mapping page at {addr:#x} failed: {source}")]
    Map {
        addr: usize,
        #[source]
        source: io::Error,
    },

    /// A page of memory could not be released
    #[error("unmapping page at {addr:#x} failed: {source}")]
    Unmap {
        addr: usize,
        #[source]
        source: io::Error,
    },

    /// The OS placed a page somewhere other than where it was asked to
    #[error("page requested at {requested:#x} was placed at {placed:#x}")]
    Misplaced { requested: usize, placed: usize },

    /// Read outside the logical table
    #[error("index {index} is outside the table ({entries} entries)")]
    OutOfRange { index: usize, entries: usize },

    /// The table disagreed with a reference value
    #[error("square root is incorrect at index {index}: expected {expected}, got {observed}")]
    Mismatch {
        index: usize,
        expected: f64,
        observed: f64,
    },

    /// More than one page was mapped inside the table span
    #[error("{mapped:#x} bytes mapped inside the table, limit is {limit:#x}")]
    Residency { mapped: usize, limit: usize },

    /// An eager mapping of the whole table was allowed under the ceiling
    #[error("mapping {len:#x} bytes succeeded despite the address-space ceiling")]
    CeilingNotEnforced { len: usize },

    /// Rejected configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Any other I/O failure
    #[error(transparent)]
    Io(#[from] io::Error),
}
