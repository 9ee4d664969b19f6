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

use super::{system_dim, AugmentedSystem, PivotStrategy};
use crate::task::{Task, Phase, Lifecycle};
use crate::task_data::LinearSystemData;

/// Solves a linear system on the calling thread.
///
/// This is the reference that the distributed solver must agree with.
#[derive(Debug)]
pub struct SequentialGauss<'a> {
    data: LinearSystemData<'a>,
    strategy: PivotStrategy,
    lifecycle: Lifecycle,
    dim: usize,
    system: Option<AugmentedSystem>,
    solution: Option<Vec<f64>>,
}

impl<'a> SequentialGauss<'a> {
    pub fn new(data: LinearSystemData<'a>) -> Self
    { Self::with_strategy(data, PivotStrategy::default()) }

    pub fn with_strategy(data: LinearSystemData<'a>, strategy: PivotStrategy) -> Self {
        SequentialGauss {
            data, strategy,
            lifecycle: Lifecycle::default(),
            dim: 0,
            system: None,
            solution: None,
        }
    }

    /// The solution, once `run` has succeeded.
    pub fn solution(&self) -> Option<&[f64]>
    { self.solution.as_ref().map(|x| &x[..]) }
}

impl<'a> Task for SequentialGauss<'a> {
    fn validate(&mut self) -> bool {
        self.lifecycle.begin(Phase::Validation);
        self.system = None;
        self.solution = None;

        let ok = match system_dim(&self.data) {
            Ok(dim) => {
                self.dim = dim;
                true
            },
            Err(e) => {
                warn!("invalid linear system: {}", e);
                false
            },
        };
        self.lifecycle.finish(Phase::Validation, ok)
    }

    fn pre_process(&mut self) -> bool {
        if !self.lifecycle.begin(Phase::PreProcessing) {
            return false;
        }
        let n = self.dim;
        let matrix = &self.data.inputs[0][..n * n];
        let rhs = &self.data.inputs[1][..n];
        self.system = Some(AugmentedSystem::new(matrix, rhs));
        self.lifecycle.finish(Phase::PreProcessing, true)
    }

    fn run(&mut self) -> bool {
        if !self.lifecycle.begin(Phase::Run) {
            return false;
        }
        let ok = match self.system.as_mut() {
            Some(system) => {
                trace!("eliminating a system of dimension {}", system.dim());
                system.forward_eliminate(self.strategy);
                self.solution = Some(system.back_substitute());
                true
            },
            None => false,
        };
        self.lifecycle.finish(Phase::Run, ok)
    }

    fn post_process(&mut self) -> bool {
        if !self.lifecycle.begin(Phase::PostProcessing) {
            return false;
        }
        let ok = match self.solution.as_ref() {
            Some(solution) => {
                self.data.outputs[0][..solution.len()].copy_from_slice(solution);
                true
            },
            None => false,
        };
        self.lifecycle.finish(Phase::PostProcessing, ok)
    }
}
