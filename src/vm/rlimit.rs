// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Address-Space Ceiling
//!
//! Get and set `RLIMIT_AS`, the cap on total virtual bytes a process may
//! have mapped.

use crate::err::{PagerError, Result};

/// Soft and hard limits on virtual address-space bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSpaceCeiling {
    /// Limit enforced on mappings
    pub soft: u64,

    /// Highest value the soft limit may be raised to
    pub hard: u64,
}

impl AddressSpaceCeiling {
    /// Ceiling with soft and hard limits equal
    pub const fn fixed(bytes: u64) -> Self {
        Self {
            soft: bytes,
            hard: bytes,
        }
    }

    /// Whether the soft limit is unbounded
    pub const fn is_unlimited(&self) -> bool {
        self.soft == libc::RLIM_INFINITY as u64
    }

    /// Read the current ceiling
    pub fn current() -> Result<Self> {
        let mut lim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        if unsafe { libc::getrlimit(libc::RLIMIT_AS, &mut lim) } == -1 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(Self {
            soft: lim.rlim_cur as u64,
            hard: lim.rlim_max as u64,
        })
    }

    /// Install this ceiling for the whole process
    pub fn apply(&self) -> Result<()> {
        let lim = libc::rlimit {
            rlim_cur: self.soft as libc::rlim_t,
            rlim_max: self.hard as libc::rlim_t,
        };
        if unsafe { libc::setrlimit(libc::RLIMIT_AS, &lim) } == -1 {
            return Err(PagerError::Ceiling {
                bytes: self.soft as usize,
                source: std::io::Error::last_os_error(),
            });
        }
        Ok(())
    }
}
