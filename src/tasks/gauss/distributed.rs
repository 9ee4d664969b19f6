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

//! Gaussian elimination with the rows of the system divided among a group of workers.
//!
//! Each worker holds a contiguous block of augmented rows (see `Partition`).  At step `k`
//! the owner of the pivot row broadcasts it, and every worker eliminates column `k` from
//! the rows it owns below `k`.  The coordinator then gathers all of the rows back and does
//! the back substitution by itself.
//!
//! With partial pivoting, step `k` begins by gathering each worker's best candidate at the
//! coordinator, which picks the winner and broadcasts its index.  The winning row is then
//! the one that gets published, and the row it displaces from slot `k` is sent (if need be)
//! to the worker that owns the winner's old slot.

use super::{system_dim, elimination, AugmentedSystem, PivotStrategy};
use crate::FailResult;
use crate::partition::Partition;
use crate::task::{self, Task, Phase, Lifecycle, Role};
use crate::task_data::LinearSystemData;
use ::hgauss_comm::{Broadcast, Communicator, Rank, COORDINATOR};
use ::std::ops::Range;

/// Solves a linear system together with the other members of a worker group.
///
/// Every rank of the group must construct one of these and drive it through all four
/// phases in step with the others.  Only rank [`COORDINATOR`] has a payload; it also
/// decides the pivot strategy for everybody.
#[derive(Debug)]
pub struct DistributedGauss<'a, C> {
    comm: &'a C,
    role: Role<LinearSystemData<'a>>,
    strategy: PivotStrategy,
    lifecycle: Lifecycle,
    // coordinator only
    system: Option<AugmentedSystem>,
    solution: Option<Vec<f64>>,
}

impl<'a, C: Communicator> DistributedGauss<'a, C> {
    pub fn new(comm: &'a C, role: Role<LinearSystemData<'a>>) -> Self
    { Self::with_strategy(comm, role, PivotStrategy::default()) }

    /// The strategy only has an effect on the coordinator.
    pub fn with_strategy(comm: &'a C, role: Role<LinearSystemData<'a>>, strategy: PivotStrategy) -> Self {
        DistributedGauss {
            comm, role, strategy,
            lifecycle: Lifecycle::default(),
            system: None,
            solution: None,
        }
    }

    /// The solution, once `run` has succeeded on the coordinator.  Always `None` elsewhere.
    pub fn solution(&self) -> Option<&[f64]>
    { self.solution.as_ref().map(|x| &x[..]) }

    fn solve(&mut self) -> FailResult<()>
    {Ok({
        let comm = self.comm;
        let rank = comm.rank();

        let header = match &self.system {
            Some(system) => Some((system.dim(), self.strategy)),
            None => None,
        };
        if self.role.is_coordinator() && header.is_none() {
            bail!("the coordinator has no system to distribute");
        }
        let (n, strategy): (usize, PivotStrategy) = Broadcast::broadcast(comm, COORDINATOR, header)?;

        let partition = Partition::contiguous(n, comm.size());
        let mut rows = self.scatter(&partition, n)?;
        debug!("rank {} holds rows {:?} of {}", rank, rows.range, n);

        for k in 0..n {
            let source = match strategy {
                PivotStrategy::Natural => k,
                PivotStrategy::Partial => choose_pivot(comm, &rows, k)?,
            };
            let pivot = PublishedPivot::publish(comm, &partition, &rows, source, k)?;
            if source != k {
                trace!("step {}: pivot row comes from row {}", k, source);
                rows.displace(comm, &partition, &pivot, source)?;
            }
            rows.eliminate_below(&pivot);
        }

        if let Some(parts) = comm.gather(COORDINATOR, &rows.data)? {
            let data = parts.concat();
            ensure!(
                data.len() == n * (n + 1),
                "gathered {} elements, expected {}", data.len(), n * (n + 1),
            );
            let system = AugmentedSystem::from_rows(n, data);
            self.solution = Some(system.back_substitute());
        }
    })}

    // Hand out the rows of the system; the coordinator keeps its own.
    fn scatter(&self, partition: &Partition, n: usize) -> FailResult<LocalRows>
    {Ok({
        let comm = self.comm;
        let width = n + 1;
        let range = partition.range(comm.rank());

        let data = match &self.system {
            Some(system) => {
                for dest in (0..comm.size()).filter(|&r| r != comm.rank()) {
                    let theirs = partition.range(dest);
                    comm.send(dest, system.rows(theirs.start, theirs.end))?;
                }
                system.rows(range.start, range.end).to_vec()
            },
            None => {
                let data = comm.receive::<f64>(COORDINATOR)?;
                ensure!(
                    data.len() == range.len() * width,
                    "rank {} received {} elements for rows {:?}", comm.rank(), data.len(), range,
                );
                data
            },
        };
        LocalRows { range, width, data }
    })}
}

/// The augmented rows owned by one worker.
#[derive(Debug)]
struct LocalRows {
    // global indices of the rows
    range: Range<usize>,
    width: usize,
    data: Vec<f64>,
}

impl LocalRows {
    fn owns(&self, i: usize) -> bool { self.range.contains(&i) }

    fn row(&self, i: usize) -> &[f64] {
        let local = i - self.range.start;
        &self.data[local * self.width..(local + 1) * self.width]
    }

    fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let local = i - self.range.start;
        &mut self.data[local * self.width..(local + 1) * self.width]
    }

    /// Eliminate the pivot column from every owned row below the pivot.
    ///
    /// Requiring a `PublishedPivot` means this can only ever use a pivot row that every
    /// worker has received.
    fn eliminate_below(&mut self, pivot: &PublishedPivot) {
        let first = usize::max(self.range.start, pivot.step + 1);
        for i in first..self.range.end {
            elimination::eliminate_row(self.row_mut(i), &pivot.row, pivot.step);
        }
    }

    /// Move the winner of a partial pivot search into slot `pivot.step`, and the row
    /// that was there into the winner's old slot `source`.
    fn displace<C: Communicator>(
        &mut self,
        comm: &C,
        partition: &Partition,
        pivot: &PublishedPivot,
        source: usize,
    ) -> FailResult<()>
    {Ok({
        let k = pivot.step;
        let source_owner = partition.owner_of(source);

        if self.owns(k) {
            let displaced = self.row(k).to_vec();
            self.row_mut(k).copy_from_slice(&pivot.row);
            match self.owns(source) {
                true => self.row_mut(source).copy_from_slice(&displaced),
                false => comm.send(source_owner, &displaced)?,
            }
        } else if self.owns(source) {
            let displaced = comm.receive::<f64>(partition.owner_of(k))?;
            ensure!(
                displaced.len() == self.width,
                "displaced row has {} elements, expected {}", displaced.len(), self.width,
            );
            self.row_mut(source).copy_from_slice(&displaced);
        }
    })}
}

/// A pivot row that has been broadcast to the whole group.
#[derive(Debug)]
struct PublishedPivot {
    step: usize,
    row: Vec<f64>,
}

impl PublishedPivot {
    /// Broadcast row `source` from its owner, to serve as the pivot row for step `step`.
    fn publish<C: Communicator>(
        comm: &C,
        partition: &Partition,
        rows: &LocalRows,
        source: usize,
        step: usize,
    ) -> FailResult<Self>
    {Ok({
        let owner: Rank = partition.owner_of(source);
        let value = match rows.owns(source) {
            true => Some(rows.row(source).to_vec()),
            false => None,
        };
        let row = comm.broadcast(owner, value)?;
        ensure!(
            row.len() == rows.width,
            "pivot row has {} elements, expected {}", row.len(), rows.width,
        );
        PublishedPivot { step, row }
    })}
}

/// Agree on the row that will supply the pivot for step `k`.
fn choose_pivot<C: Communicator>(comm: &C, rows: &LocalRows, k: usize) -> FailResult<usize>
{
    let first = usize::max(rows.range.start, k);
    let local = elimination::best_candidate((first..rows.range.end).map(|i| (i, rows.row(i)[k])));

    let indices = local.iter().map(|&(i, _)| i).collect::<Vec<usize>>();
    let magnitudes = local.iter().map(|&(_, x)| x).collect::<Vec<f64>>();
    let indices = comm.gather(COORDINATOR, &indices)?;
    let magnitudes = comm.gather(COORDINATOR, &magnitudes)?;

    let choice = match (indices, magnitudes) {
        (Some(indices), Some(magnitudes)) => {
            // rank order is row order, so ties still go to the first row
            let candidates = indices.into_iter().flatten().zip(magnitudes.into_iter().flatten());
            match elimination::best_candidate(candidates) {
                Some((best, _)) => Some(best),
                None => bail!("no worker holds a candidate for pivot {}", k),
            }
        },
        _ => None,
    };
    Broadcast::broadcast(comm, COORDINATOR, choice)
}

impl<'a, C: Communicator> Task for DistributedGauss<'a, C> {
    fn validate(&mut self) -> bool {
        self.lifecycle.begin(Phase::Validation);
        self.system = None;
        self.solution = None;

        let ok = task::check_role(self.comm, &self.role) && match self.role.payload() {
            None => true,
            Some(data) => match system_dim(data) {
                Ok(_) => true,
                Err(e) => {
                    warn!("invalid linear system: {}", e);
                    false
                },
            },
        };
        self.lifecycle.finish(Phase::Validation, ok)
    }

    fn pre_process(&mut self) -> bool {
        if !self.lifecycle.begin(Phase::PreProcessing) {
            return false;
        }
        if let Some(data) = self.role.payload() {
            let n = data.inputs_count[0];
            self.system = Some(AugmentedSystem::new(&data.inputs[0][..n * n], &data.inputs[1][..n]));
        }
        self.lifecycle.finish(Phase::PreProcessing, true)
    }

    fn run(&mut self) -> bool {
        if !self.lifecycle.begin(Phase::Run) {
            return false;
        }
        let ok = match self.solve() {
            Ok(()) => true,
            Err(e) => {
                error!("rank {}: {}", self.comm.rank(), e);
                false
            },
        };
        self.lifecycle.finish(Phase::Run, ok)
    }

    fn post_process(&mut self) -> bool {
        if !self.lifecycle.begin(Phase::PostProcessing) {
            return false;
        }
        let ok = match (self.role.payload_mut(), &self.solution) {
            (None, _) => true,
            (Some(data), Some(solution)) => {
                data.outputs[0][..solution.len()].copy_from_slice(solution);
                true
            },
            (Some(_), None) => false,
        };
        self.lifecycle.finish(Phase::PostProcessing, ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gauss::{random_system, SequentialGauss};
    use crate::task::{drive, PhaseFailed};
    use ::hgauss_comm::{LocalComm, LocalGroup};
    use ::rand::{SeedableRng, rngs::StdRng};

    fn solve_sequential(matrix: &[f64], rhs: &[f64], strategy: PivotStrategy) -> Vec<f64> {
        let mut out = vec![0.0; rhs.len()];
        {
            let data = LinearSystemData::linear_system(matrix, rhs, &mut out);
            drive(&mut SequentialGauss::with_strategy(data, strategy)).unwrap();
        }
        out
    }

    // Run one participant.  Only the coordinator returns the solution.
    fn participate(comm: &LocalComm, matrix: &[f64], rhs: &[f64], strategy: PivotStrategy) -> Option<Vec<f64>> {
        match comm.rank() {
            COORDINATOR => {
                let mut out = vec![0.0; rhs.len()];
                {
                    let data = LinearSystemData::linear_system(matrix, rhs, &mut out);
                    let mut task = DistributedGauss::with_strategy(comm, Role::Coordinator(data), strategy);
                    drive(&mut task).unwrap();
                }
                Some(out)
            },
            _ => {
                let mut task = DistributedGauss::new(comm, Role::Worker);
                drive(&mut task).unwrap();
                assert_eq!(task.solution(), None);
                None
            },
        }
    }

    fn solve_distributed(workers: usize, matrix: &[f64], rhs: &[f64], strategy: PivotStrategy) -> Vec<f64> {
        let mut results = LocalGroup::new(workers).run(|comm| participate(&comm, matrix, rhs, strategy));
        assert!(results[1..].iter().all(Option::is_none));
        results.swap_remove(0).unwrap()
    }

    #[test]
    fn small_system() {
        let matrix = [2.0, 1.0, 0.0, -3.0, -1.0, 2.0, 0.0, 1.0, 2.0];
        let rhs = [8.0, -11.0, -3.0];
        for workers in 1..=4 {
            let x = solve_distributed(workers, &matrix, &rhs, PivotStrategy::Natural);
            assert_close!(abs=1e-9, x, vec![8.0, -8.0, 2.5], "workers = {}", workers);
        }
    }

    #[test]
    fn agrees_with_sequential() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for &dim in &[1, 2, 3, 5, 8, 13] {
            let (matrix, rhs) = random_system(&mut rng, dim, (-100.0, 100.0));
            for &strategy in &[PivotStrategy::Natural, PivotStrategy::Partial] {
                let expected = solve_sequential(&matrix, &rhs, strategy);
                for workers in 1..=5 {
                    let actual = solve_distributed(workers, &matrix, &rhs, strategy);
                    assert_close!(
                        abs=1e-10, actual.clone(), expected.clone(),
                        "dim = {}, workers = {}, {:?}", dim, workers, strategy,
                    );
                    // the same arithmetic happens in the same order
                    assert_eq!(actual, expected);
                }
            }
        }
    }

    #[test]
    fn more_workers_than_rows() {
        let x = solve_distributed(6, &[4.0, 1.0, 2.0, 3.0], &[1.0, 2.0], PivotStrategy::Natural);
        assert_close!(abs=1e-12, x, vec![0.1, 0.6]);
    }

    #[test]
    fn partial_pivoting() {
        for workers in 1..=3 {
            let x = solve_distributed(workers, &[0.0, 1.0, 1.0, 0.0], &[2.0, 3.0], PivotStrategy::Partial);
            assert_eq!(x, vec![3.0, 2.0]);
        }
    }

    #[test]
    fn coordinator_decides_the_strategy() {
        let matrix = [0.0, 1.0, 1.0, 0.0];
        let rhs = [2.0, 3.0];
        let results = LocalGroup::new(2).run(|comm| match comm.rank() {
            COORDINATOR => participate(&comm, &matrix, &rhs, PivotStrategy::Partial),
            _ => {
                // a worker's own strategy is ignored
                let mut task = DistributedGauss::with_strategy(&comm, Role::Worker, PivotStrategy::Natural);
                drive(&mut task).unwrap();
                None
            },
        });
        assert_eq!(results[0], Some(vec![3.0, 2.0]));
    }

    #[test]
    fn idempotent() {
        let mut rng = StdRng::seed_from_u64(7);
        let (matrix, rhs) = random_system(&mut rng, 9, (-1.0, 1.0));
        let first = solve_distributed(3, &matrix, &rhs, PivotStrategy::Natural);
        let second = solve_distributed(3, &matrix, &rhs, PivotStrategy::Natural);
        assert_eq!(first, second);
    }

    #[test]
    fn workers_validate_vacuously() {
        let results = LocalGroup::new(3).run(|comm| {
            if comm.is_coordinator() {
                return true;
            }
            let mut task = DistributedGauss::new(&comm, Role::Worker);
            task.validate() && task.pre_process()
        });
        assert_eq!(results, vec![true; 3]);
    }

    #[test]
    fn roles_must_match_ranks() {
        let matrix = [1.0];
        let rhs = [1.0];
        let results = LocalGroup::new(2).run(|comm| {
            let mut out = [0.0];
            let role = match comm.rank() {
                COORDINATOR => Role::Worker,
                _ => Role::Coordinator(LinearSystemData::linear_system(&matrix, &rhs, &mut out)),
            };
            DistributedGauss::new(&comm, role).validate()
        });
        assert_eq!(results, vec![false, false]);
    }

    #[test]
    fn empty_coordinator_fails_and_releases_workers() {
        let results = LocalGroup::new(3).run(|comm| {
            let mut out = [0.0; 0];
            match comm.rank() {
                COORDINATOR => {
                    let data = LinearSystemData::linear_system(&[], &[], &mut out);
                    let mut task = DistributedGauss::new(&comm, Role::Coordinator(data));
                    drive(&mut task)
                },
                _ => {
                    // the coordinator never shows up to the first broadcast
                    let mut task = DistributedGauss::new(&comm, Role::Worker);
                    drive(&mut task)
                },
            }
        });
        assert_eq!(results, vec![
            Err(PhaseFailed(Phase::Validation)),
            Err(PhaseFailed(Phase::Run)),
            Err(PhaseFailed(Phase::Run)),
        ]);
    }

    #[test]
    fn phases_out_of_order() {
        let results = LocalGroup::new(1).run(|comm| {
            let mut out = [0.0];
            let data = LinearSystemData::linear_system(&[2.0], &[1.0], &mut out);
            let mut task = DistributedGauss::new(&comm, Role::Coordinator(data));
            let early = task.run() || task.post_process();
            let ok = drive(&mut task).is_ok();
            (early, ok, task.solution().map(|x| x.to_vec()))
        });
        assert_eq!(results, vec![(false, true, Some(vec![0.5]))]);
    }
}
