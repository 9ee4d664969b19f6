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

//! The work done by the `hgauss` binary once its arguments are parsed.

use crate::FailResult;
use crate::filetypes::{SystemFile, SolutionFile};
use crate::gauss::{random_system, DistributedGauss, SequentialGauss, PivotStrategy};
use crate::task::{drive, Role};
use crate::task_data::LinearSystemData;

use ::hgauss_comm::Communicator;
use ::hgauss_tasks_config::Settings;
use ::rand::{rngs::StdRng, SeedableRng};
use ::std::path::Path;

/// A flattened system, ready to be lent to a task.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct System {
    pub matrix: Vec<f64>,
    pub rhs: Vec<f64>,
}

impl System {
    pub fn dim(&self) -> usize { self.rhs.len() }

    /// Read a system file, or make up a system as described by the config.
    pub fn obtain(settings: &Settings, path: Option<&Path>) -> FailResult<System>
    {Ok({
        let (matrix, rhs) = match path {
            Some(path) => {
                info!("Reading system from {}", path.display());
                SystemFile::load(path)?.into_flat()?
            },
            None => {
                let cfg = &settings.random_system;
                let mut rng = match cfg.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                info!("Generating a random system of dimension {}", cfg.dim);
                random_system(&mut rng, cfg.dim, cfg.range)
            },
        };
        System { matrix, rhs }
    })}
}

/// Take part in a distributed solve.
///
/// Every rank of `comm` must call this; only the coordinator passes a system, and only the
/// coordinator gets back a result.
pub(crate) fn solve<C: Communicator>(
    comm: &C,
    settings: &Settings,
    system: Option<&System>,
) -> FailResult<Option<SolutionFile>>
{Ok({
    let strategy = PivotStrategy::from(settings.pivoting);

    let system = match system {
        None => {
            ensure!(!comm.is_coordinator(), "the coordinator was not given a system");
            drive(&mut DistributedGauss::with_strategy(comm, Role::Worker, strategy))?;
            return Ok(None);
        },
        Some(system) => system,
    };
    ensure!(comm.is_coordinator(), "rank {} was given a system", comm.rank());

    let dim = system.dim();
    let mut solution = vec![0.0; dim];
    {
        let data = LinearSystemData::linear_system(&system.matrix, &system.rhs, &mut solution);
        let mut task = DistributedGauss::with_strategy(comm, Role::Coordinator(data), strategy);
        drive(&mut task)?;
    }
    info!("Solved a system of dimension {} on {} worker(s)", dim, comm.size());

    let max_deviation = match settings.verify.enabled {
        false => None,
        true => {
            let expected = solve_sequential(system, strategy)?;
            let deviation = max_deviation(&solution, &expected);
            info!("Largest deviation from the sequential solution: {:e}", deviation);
            ensure!(
                deviation <= settings.verify.tolerance,
                "distributed solution deviates from the sequential one by {:e} (tolerance: {:e})",
                deviation, settings.verify.tolerance,
            );
            Some(deviation)
        },
    };

    Some(SolutionFile {
        solution,
        dim,
        workers: comm.size(),
        pivoting: settings.pivoting,
        max_deviation,
    })
})}

fn solve_sequential(system: &System, strategy: PivotStrategy) -> FailResult<Vec<f64>>
{Ok({
    let mut solution = vec![0.0; system.dim()];
    {
        let data = LinearSystemData::linear_system(&system.matrix, &system.rhs, &mut solution);
        drive(&mut SequentialGauss::with_strategy(data, strategy))?;
    }
    solution
})}

// NaN anywhere makes the whole thing NaN, which then fails any tolerance check.
fn max_deviation(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, |acc, d| if d.is_nan() || acc.is_nan() { ::std::f64::NAN } else { acc.max(d) })
}

/// Write the result where the user asked, or log it.
pub(crate) fn report(result: &SolutionFile, output: Option<&Path>) -> FailResult<()>
{Ok({
    match output {
        Some(path) => {
            result.save(path)?;
            info!("Wrote solution to {}", path.display());
        },
        None => info!("Solution: {:?}", result.solution),
    }
})}
