/* ********************************************************************** **
**  This file is part of hgauss.                                          **
**                                                                        **
**  hgauss is free software: you can redistribute it and/or modify it     **
**  under the terms of the GNU General Public License as published by the **
**  Free Software Foundation, either version 3 of the License, or (at     **
**  your option) any later version.                                       **
**                                                                        **
**      http://www.gnu.org/licenses/                                      **
**                                                                        **
** Do note that, while the whole of hgauss is licensed under the GPL,     **
** many parts of it are licensed under more permissive terms.             **
** ********************************************************************** */

//! Gaussian elimination, on one thread or spread over the rows of a worker group.
//!
//! Both solvers are thin drivers around the routines in `elimination`; the distributed
//! solver only decides *who* eliminates which rows, never *how*, so that its answer is
//! identical to the sequential one (not merely close).

use crate::FailResult;
use crate::task_data::{self, LinearSystemData, InvalidPayload};
use ::hgauss_comm::{Broadcast, Communicator, Rank};
use ::hgauss_tasks_config as cfg;
use ::rand::Rng;

pub use self::elimination::AugmentedSystem;
mod elimination;

pub use self::sequential::SequentialGauss;
mod sequential;

pub use self::distributed::DistributedGauss;
mod distributed;

/// How the pivot row is chosen at each step of forward elimination.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PivotStrategy {
    /// Row `k` is the pivot row at step `k`.  No rows are ever exchanged, and a zero on
    /// the diagonal produces infinities and NaNs instead of an error.
    Natural,
    /// Before step `k`, exchange row `k` with the row at or below it that has the largest
    /// magnitude in column `k`.
    Partial,
}

impl Default for PivotStrategy {
    fn default() -> Self { PivotStrategy::Natural }
}

impl From<cfg::Pivoting> for PivotStrategy {
    fn from(pivoting: cfg::Pivoting) -> Self {
        match pivoting {
            cfg::Pivoting::Natural => PivotStrategy::Natural,
            cfg::Pivoting::Partial => PivotStrategy::Partial,
        }
    }
}

impl PivotStrategy {
    fn code(self) -> u32 {
        match self {
            PivotStrategy::Natural => 0,
            PivotStrategy::Partial => 1,
        }
    }

    fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(PivotStrategy::Natural),
            1 => Some(PivotStrategy::Partial),
            _ => None,
        }
    }
}

impl Broadcast for PivotStrategy {
    fn broadcast<C: Communicator>(comm: &C, root: Rank, value: Option<Self>) -> FailResult<Self>
    {
        let code: u32 = Broadcast::broadcast(comm, root, value.map(PivotStrategy::code))?;
        PivotStrategy::from_code(code)
            .ok_or_else(|| format_err!("received unknown pivot strategy code {}", code))
    }
}

/// Check a linear system payload and get its dimension.
///
/// Nothing is read from the buffers; only their lengths are inspected.
pub(crate) fn system_dim(data: &LinearSystemData<'_>) -> Result<usize, InvalidPayload> {
    task_data::check_buffer_counts(data, 2, 1)?;

    let n = data.inputs_count[0];
    if n == 0 {
        return Err(InvalidPayload::EmptySystem);
    }

    // (saturating; no real buffer is that long)
    let n_squared = n.checked_mul(n).unwrap_or(::std::usize::MAX);
    let n_bytes = n.checked_mul(::std::mem::size_of::<f64>()).unwrap_or(::std::usize::MAX);

    let (matrix, rhs) = (data.inputs[0], data.inputs[1]);
    if matrix.len() != n_squared {
        return Err(InvalidPayload::InputLength { index: 0, expected: n_squared, found: matrix.len() });
    }
    if rhs.len() != n {
        return Err(InvalidPayload::InputLength { index: 1, expected: n, found: rhs.len() });
    }
    if data.outputs_count[0] != n_bytes {
        return Err(InvalidPayload::DeclaredOutputSize { expected: n_bytes, found: data.outputs_count[0] });
    }
    if data.outputs[0].len() < n {
        return Err(InvalidPayload::OutputCapacity { needed: n, found: data.outputs[0].len() });
    }
    Ok(n)
}

/// A dense system with entries drawn uniformly from `[lo, hi)`.
///
/// Returns the row-major matrix and the right-hand side.
pub fn random_system<R: Rng>(rng: &mut R, dim: usize, (lo, hi): (f64, f64)) -> (Vec<f64>, Vec<f64>) {
    let matrix = (0..dim * dim).map(|_| rng.gen_range(lo, hi)).collect();
    let rhs = (0..dim).map(|_| rng.gen_range(lo, hi)).collect();
    (matrix, rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dim_of_good_payload() {
        let matrix = [1.0; 9];
        let rhs = [1.0; 3];
        let mut out = [0.0; 4]; // extra room is fine
        let data = LinearSystemData::linear_system(&matrix, &rhs, &mut out);
        assert_eq!(system_dim(&data), Ok(3));
    }

    #[test]
    fn dim_of_bad_payloads() {
        let matrix = [1.0; 9];
        let rhs = [1.0; 3];

        let mut out = [0.0; 3];
        let data = LinearSystemData::linear_system(&[], &[], &mut out);
        assert_eq!(system_dim(&data), Err(InvalidPayload::EmptySystem));

        let mut out = [0.0; 3];
        let data = LinearSystemData::linear_system(&matrix[..8], &rhs, &mut out);
        assert_eq!(system_dim(&data), Err(InvalidPayload::InputLength { index: 0, expected: 9, found: 8 }));

        let mut out = [0.0; 3];
        let data = LinearSystemData::linear_system(&matrix, &rhs, &mut out)
            .with_input_count(7); // only the first count matters
        assert_eq!(system_dim(&data), Ok(3));

        let mut out = [0.0; 3];
        let mut data = LinearSystemData::linear_system(&matrix, &rhs, &mut out);
        data.inputs_count[0] = 2;
        assert_eq!(system_dim(&data), Err(InvalidPayload::InputLength { index: 0, expected: 4, found: 9 }));

        let mut out = [0.0; 3];
        let mut data = LinearSystemData::linear_system(&matrix, &rhs, &mut out);
        data.outputs_count[0] = 3;
        assert_eq!(system_dim(&data), Err(InvalidPayload::DeclaredOutputSize { expected: 24, found: 3 }));

        let mut out = [0.0; 2];
        let mut data = LinearSystemData::linear_system(&matrix, &rhs, &mut out);
        data.outputs_count[0] = 24;
        assert_eq!(system_dim(&data), Err(InvalidPayload::OutputCapacity { needed: 3, found: 2 }));

        let data = LinearSystemData::new().with_input(&matrix).with_input(&rhs).with_input_count(3);
        assert_eq!(system_dim(&data), Err(InvalidPayload::OutputBuffers { expected: 1, found: 0 }));
    }

    #[test]
    fn strategy_is_broadcast() {
        let results = ::hgauss_comm::LocalGroup::new(3).run(|comm| {
            let value = match comm.is_coordinator() {
                true => Some(PivotStrategy::Partial),
                false => None,
            };
            PivotStrategy::broadcast(&comm, 0, value).unwrap()
        });
        assert_eq!(results, vec![PivotStrategy::Partial; 3]);
    }
}
