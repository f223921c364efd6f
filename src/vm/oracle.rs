// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Square Root Oracle
//!
//! Reference values for the table. The fault handler fills pages with it
//! and the validator compares against it, so a bug here is invisible to
//! that comparison; see `validate::reference_holds` for the independent
//! check.

use super::layout::Entry;

/// Fill `out` with the square roots of `start..start + out.len()`
pub fn compute(start: usize, out: &mut [Entry]) {
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = ((start + i) as Entry).sqrt();
    }
}

/// Reference value for a single index
#[inline]
pub fn value(index: usize) -> Entry {
    let mut out = [0.0];
    compute(index, &mut out);
    out[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_small_values() {
        let mut out = [f64::NAN; 5];
        compute(0, &mut out);
        assert_eq!(out, [0.0, 1.0, 2f64.sqrt(), 3f64.sqrt(), 2.0]);
    }

    #[test]
    fn test_empty_buffer() {
        let mut out: [f64; 0] = [];
        compute(123, &mut out);
    }

    proptest! {
        #[test]
        fn prop_batch_matches_single(start in 0usize..(1 << 27), len in 1usize..64) {
            let mut out = vec![0.0; len];
            compute(start, &mut out);
            for (i, v) in out.iter().enumerate() {
                prop_assert_eq!(*v, value(start + i));
            }
        }

        #[test]
        fn prop_perfect_squares_are_exact(root in 0usize..(1 << 13)) {
            prop_assert_eq!(value(root * root), root as f64);
        }
    }
}
