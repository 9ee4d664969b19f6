/* ************************************************************************ **
** This file is part of hgauss, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of hgauss is provided under this permissive        **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

use ::hgauss_comm::Rank;
use ::std::ops::Range;

/// Assignment of `0..len` to workers as contiguous, rank-ordered ranges.
///
/// Every worker can compute the same partition from `len` and the group size alone,
/// so the partition itself never needs to be sent anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    // bounds[p]..bounds[p + 1] belongs to worker p.
    bounds: Vec<usize>,
}

impl Partition {
    /// Split `len` items between `workers` workers as evenly as possible.
    ///
    /// Worker `r` gets `len / workers` items, plus one more if `r < len % workers`.
    /// When there are more workers than items, the last ones get empty ranges.
    ///
    /// # Panics
    /// Panics if `workers == 0`.
    pub fn contiguous(len: usize, workers: usize) -> Self {
        assert!(workers > 0, "cannot partition among zero workers");

        let base = len / workers;
        let extra = len % workers;

        let mut bounds = Vec::with_capacity(workers + 1);
        bounds.push(0);
        for rank in 0..workers {
            let size = base + (rank < extra) as usize;
            let start = bounds[rank];
            bounds.push(start + size);
        }
        debug_assert_eq!(bounds[workers], len);

        Partition { bounds }
    }

    pub fn num_parts(&self) -> usize { self.bounds.len() - 1 }

    /// Total number of items.
    pub fn len(&self) -> usize { self.bounds[self.num_parts()] }

    pub fn range(&self, rank: Rank) -> Range<usize>
    { self.bounds[rank]..self.bounds[rank + 1] }

    pub fn ranges(&self) -> impl Iterator<Item=Range<usize>> + '_
    { self.bounds.windows(2).map(|w| w[0]..w[1]) }

    /// The worker that owns item `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn owner_of(&self, index: usize) -> Rank {
        assert!(index < self.len(), "index {} out of range for partition of {}", index, self.len());
        // first part whose end lies past the index
        self.bounds[1..].partition_point(|&end| end <= index)
    }
}
