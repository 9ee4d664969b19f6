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

//! Counting sign changes between adjacent elements of a sequence.
//!
//! A pair counts when one element is negative and the other is positive.
//! Zero has no sign, so a pair involving a zero never counts.

use crate::FailResult;
use crate::partition::Partition;
use crate::task::{self, Task, Phase, Lifecycle, Role};
use crate::task_data::{self, SequenceData, InvalidPayload};
use ::hgauss_comm::{Broadcast, Communicator, COORDINATOR};
use ::std::convert::TryFrom;

pub(crate) fn count_alternations(xs: &[i32]) -> usize {
    xs.windows(2)
        .filter(|w| w[0].signum() * w[1].signum() < 0)
        .count()
}

fn sequence_len(data: &SequenceData<'_>) -> Result<usize, InvalidPayload> {
    task_data::check_buffer_counts(data, 1, 1)?;

    let len = data.inputs_count[0];
    if data.inputs[0].len() != len {
        return Err(InvalidPayload::InputLength { index: 0, expected: len, found: data.inputs[0].len() });
    }
    if data.outputs_count[0] != 1 {
        return Err(InvalidPayload::DeclaredOutputSize { expected: 1, found: data.outputs_count[0] });
    }
    if data.outputs[0].is_empty() {
        return Err(InvalidPayload::OutputCapacity { needed: 1, found: 0 });
    }
    Ok(len)
}

fn write_count(data: &mut SequenceData<'_>, count: usize) -> bool {
    match i32::try_from(count) {
        Ok(count) => {
            data.outputs[0][0] = count;
            true
        },
        Err(_) => {
            error!("{} alternations do not fit in the output", count);
            false
        },
    }
}

fn validate_payload(data: &SequenceData<'_>) -> bool {
    match sequence_len(data) {
        Ok(_) => true,
        Err(e) => {
            warn!("invalid sequence: {}", e);
            false
        },
    }
}

//--------------------------------------------------------

/// Counts sign alternations on the calling thread.
#[derive(Debug)]
pub struct SequentialAlternations<'a> {
    data: SequenceData<'a>,
    lifecycle: Lifecycle,
    sequence: Vec<i32>,
    count: Option<usize>,
}

impl<'a> SequentialAlternations<'a> {
    pub fn new(data: SequenceData<'a>) -> Self {
        SequentialAlternations {
            data,
            lifecycle: Lifecycle::default(),
            sequence: vec![],
            count: None,
        }
    }

    pub fn count(&self) -> Option<usize> { self.count }
}

impl<'a> Task for SequentialAlternations<'a> {
    fn validate(&mut self) -> bool {
        self.lifecycle.begin(Phase::Validation);
        self.count = None;
        let ok = validate_payload(&self.data);
        self.lifecycle.finish(Phase::Validation, ok)
    }

    fn pre_process(&mut self) -> bool {
        if !self.lifecycle.begin(Phase::PreProcessing) {
            return false;
        }
        self.sequence = self.data.inputs[0].to_vec();
        self.lifecycle.finish(Phase::PreProcessing, true)
    }

    fn run(&mut self) -> bool {
        if !self.lifecycle.begin(Phase::Run) {
            return false;
        }
        self.count = Some(count_alternations(&self.sequence));
        self.lifecycle.finish(Phase::Run, true)
    }

    fn post_process(&mut self) -> bool {
        if !self.lifecycle.begin(Phase::PostProcessing) {
            return false;
        }
        let ok = match self.count {
            Some(count) => write_count(&mut self.data, count),
            None => false,
        };
        self.lifecycle.finish(Phase::PostProcessing, ok)
    }
}

//--------------------------------------------------------

/// Counts sign alternations with the sequence divided among a group of workers.
///
/// Each worker receives its share of the sequence plus the first element of the next
/// share, so that the pairs straddling a boundary are counted exactly once.
#[derive(Debug)]
pub struct DistributedAlternations<'a, C> {
    comm: &'a C,
    role: Role<SequenceData<'a>>,
    lifecycle: Lifecycle,
    // coordinator only
    sequence: Option<Vec<i32>>,
    count: Option<usize>,
}

impl<'a, C: Communicator> DistributedAlternations<'a, C> {
    pub fn new(comm: &'a C, role: Role<SequenceData<'a>>) -> Self {
        DistributedAlternations {
            comm, role,
            lifecycle: Lifecycle::default(),
            sequence: None,
            count: None,
        }
    }

    /// The total, once `run` has succeeded on the coordinator.
    pub fn count(&self) -> Option<usize> { self.count }

    fn solve(&mut self) -> FailResult<()>
    {Ok({
        let comm = self.comm;

        let len = match (&self.sequence, self.role.is_coordinator()) {
            (Some(sequence), _) => Some(sequence.len()),
            (None, true) => bail!("the coordinator has no sequence to distribute"),
            (None, false) => None,
        };
        let len: usize = Broadcast::broadcast(comm, COORDINATOR, len)?;
        let partition = Partition::contiguous(len, comm.size());

        let chunk = match &self.sequence {
            Some(sequence) => {
                for dest in (0..comm.size()).filter(|&r| r != comm.rank()) {
                    comm.send(dest, &sequence[with_lookahead(&partition, dest)])?;
                }
                sequence[with_lookahead(&partition, comm.rank())].to_vec()
            },
            None => {
                let chunk = comm.receive::<i32>(COORDINATOR)?;
                let expected = with_lookahead(&partition, comm.rank()).len();
                ensure!(
                    chunk.len() == expected,
                    "rank {} received {} elements, expected {}", comm.rank(), chunk.len(), expected,
                );
                chunk
            },
        };

        let local = count_alternations(&chunk) as u64;
        trace!("rank {}: {} alternations in {} elements", comm.rank(), local, chunk.len());

        if let Some(counts) = comm.gather(COORDINATOR, &[local])? {
            let total: u64 = counts.iter().flatten().sum();
            self.count = Some(total as usize);
        }
    })}
}

// A worker's share of the sequence, extended by one element into the next share.
fn with_lookahead(partition: &Partition, rank: usize) -> ::std::ops::Range<usize> {
    let range = partition.range(rank);
    match range.is_empty() {
        true => range,
        false => range.start..usize::min(range.end + 1, partition.len()),
    }
}

impl<'a, C: Communicator> Task for DistributedAlternations<'a, C> {
    fn validate(&mut self) -> bool {
        self.lifecycle.begin(Phase::Validation);
        self.sequence = None;
        self.count = None;

        let ok = task::check_role(self.comm, &self.role) && match self.role.payload() {
            None => true,
            Some(data) => validate_payload(data),
        };
        self.lifecycle.finish(Phase::Validation, ok)
    }

    fn pre_process(&mut self) -> bool {
        if !self.lifecycle.begin(Phase::PreProcessing) {
            return false;
        }
        self.sequence = self.role.payload().map(|data| data.inputs[0].to_vec());
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
        let ok = match (self.role.payload_mut(), self.count) {
            (None, _) => true,
            (Some(data), Some(count)) => write_count(data, count),
            (Some(_), None) => false,
        };
        self.lifecycle.finish(Phase::PostProcessing, ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::drive;
    use ::hgauss_comm::LocalGroup;
    use ::rand::{Rng, SeedableRng, rngs::StdRng};

    fn count_sequential(input: &[i32]) -> i32 {
        let mut out = [-1];
        drive(&mut SequentialAlternations::new(SequenceData::sequence(input, &mut out))).unwrap();
        out[0]
    }

    fn count_distributed(workers: usize, input: &[i32]) -> i32 {
        let results = LocalGroup::new(workers).run(|comm| {
            let mut out = [-1];
            let role = match comm.rank() {
                COORDINATOR => Role::Coordinator(SequenceData::sequence(input, &mut out)),
                _ => Role::Worker,
            };
            drive(&mut DistributedAlternations::new(&comm, role)).unwrap();
            out[0]
        });
        // workers never touch their (nonexistent) output
        assert!(results[1..].iter().all(|&x| x == -1));
        results[0]
    }

    #[test]
    fn sequential() {
        assert_eq!(count_sequential(&[1, -2, 3, -4, 5]), 4);
        assert_eq!(count_sequential(&[1, 2, 3, 4, 5]), 0);
        assert_eq!(count_sequential(&[-1, -2, -3, -4, -5]), 0);
        assert_eq!(count_sequential(&[]), 0);
        assert_eq!(count_sequential(&[-7]), 0);
        assert_eq!(count_sequential(&[1, 0, -1, 0, 1]), 0);
        assert_eq!(count_sequential(&[::std::i32::MAX, ::std::i32::MIN]), 1);

        let alternating = (0..1000).map(|i| if i % 2 == 0 { 1 } else { -1 }).collect::<Vec<_>>();
        assert_eq!(count_sequential(&alternating), 999);
    }

    #[test]
    fn distributed_agrees_with_sequential() {
        let mut rng = StdRng::seed_from_u64(12345);
        for &len in &[0, 1, 2, 3, 10, 101] {
            let input = (0..len).map(|_| rng.gen_range(-5, 6)).collect::<Vec<i32>>();
            let expected = count_sequential(&input);
            for workers in 1..=5 {
                assert_eq!(count_distributed(workers, &input), expected, "len = {}, workers = {}", len, workers);
            }
        }
    }

    #[test]
    fn distributed_examples() {
        assert_eq!(count_distributed(2, &[1, -2, 3, -4, 5]), 4);
        assert_eq!(count_distributed(4, &[1, -2]), 1);

        let alternating = (0..1000).map(|i| if i % 2 == 0 { 1 } else { -1 }).collect::<Vec<_>>();
        assert_eq!(count_distributed(3, &alternating), 999);
    }

    #[test]
    fn lookahead_ranges() {
        let partition = Partition::contiguous(5, 3);
        let ranges = (0..3).map(|r| with_lookahead(&partition, r)).collect::<Vec<_>>();
        assert_eq!(ranges, vec![0..3, 2..5, 4..5]);

        let partition = Partition::contiguous(1, 3);
        let ranges = (0..3).map(|r| with_lookahead(&partition, r)).collect::<Vec<_>>();
        assert_eq!(ranges, vec![0..1, 1..1, 1..1]);
    }

    #[test]
    fn bad_payloads() {
        let input = [1, -1, 1];

        let mut out = [0];
        let mut data = SequenceData::sequence(&input, &mut out);
        data.inputs_count[0] = 4;
        assert!(!SequentialAlternations::new(data).validate());

        let mut out = [0];
        let mut data = SequenceData::sequence(&input, &mut out);
        data.outputs_count[0] = 2;
        assert!(!SequentialAlternations::new(data).validate());

        let mut out = [0; 0];
        let data = SequenceData::sequence(&input, &mut out);
        assert!(!SequentialAlternations::new(data).validate());

        let data = SequenceData::new().with_input(&input).with_input_count(3);
        assert!(!SequentialAlternations::new(data).validate());
    }
}
