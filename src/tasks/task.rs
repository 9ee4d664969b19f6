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

//! The four-phase protocol shared by every task.

use ::hgauss_comm::{Communicator, COORDINATOR};
use ::std::fmt;

/// A unit of work that is validated, prepared, run, and then asked for its results.
///
/// Each phase reports success as a plain `bool`; the reasons for a failure are logged,
/// not returned.  The phases must be called in order, and a caller must stop at the
/// first one that returns `false`.  Implementations in this crate enforce this by
/// refusing (returning `false` from) any phase whose predecessor has not succeeded.
/// `validate` may be called at any time, and starts over from the beginning.
///
/// [`drive`] runs all four phases in order.
pub trait Task {
    /// Check the shape of the payload.  Nothing is read from the buffers yet.
    fn validate(&mut self) -> bool;

    /// Copy the inputs into working storage owned by the task.
    fn pre_process(&mut self) -> bool;

    fn run(&mut self) -> bool;

    /// Write the results into the caller's output buffers.
    fn post_process(&mut self) -> bool;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Phase {
    Validation,
    PreProcessing,
    Run,
    PostProcessing,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Validation,
        Phase::PreProcessing,
        Phase::Run,
        Phase::PostProcessing,
    ];

    /// The phase that must have completed before this one can start.
    pub fn prerequisite(self) -> Option<Phase> {
        match self {
            Phase::Validation => None,
            Phase::PreProcessing => Some(Phase::Validation),
            Phase::Run => Some(Phase::PreProcessing),
            Phase::PostProcessing => Some(Phase::Run),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(match self {
            Phase::Validation => "validation",
            Phase::PreProcessing => "pre-processing",
            Phase::Run => "run",
            Phase::PostProcessing => "post-processing",
        }, f)
    }
}

#[derive(Debug, Fail, Copy, Clone, PartialEq, Eq)]
#[fail(display = "task failed during {}", _0)]
pub struct PhaseFailed(pub Phase);

/// Run all four phases of a task, stopping at the first failure.
pub fn drive<T: Task + ?Sized>(task: &mut T) -> Result<(), PhaseFailed> {
    for &phase in &Phase::ALL {
        let ok = match phase {
            Phase::Validation => task.validate(),
            Phase::PreProcessing => task.pre_process(),
            Phase::Run => task.run(),
            Phase::PostProcessing => task.post_process(),
        };
        if !ok {
            return Err(PhaseFailed(phase));
        }
    }
    Ok(())
}

/// Remembers the last phase that succeeded, to reject phases called out of order.
#[derive(Debug, Default, Clone)]
pub(crate) struct Lifecycle {
    completed: Option<Phase>,
}

impl Lifecycle {
    /// Check whether `phase` may start now.
    pub(crate) fn begin(&mut self, phase: Phase) -> bool {
        match phase.prerequisite() {
            None => {
                self.completed = None;
                true
            },
            Some(needed) if self.completed == Some(needed) => true,
            Some(needed) => {
                error!("{} was attempted before {} succeeded", phase, needed);
                false
            },
        }
    }

    /// Record the outcome of `phase`, and pass it through.
    ///
    /// A failure sends the task back to the start.
    pub(crate) fn finish(&mut self, phase: Phase, ok: bool) -> bool {
        self.completed = match ok {
            true => Some(phase),
            false => None,
        };
        ok
    }
}

/// Which part a participant plays in a distributed task.
///
/// The payload only exists on the coordinator; everybody else joins in with nothing.
#[derive(Debug)]
pub enum Role<P> {
    Coordinator(P),
    Worker,
}

impl<P> Role<P> {
    pub fn is_coordinator(&self) -> bool {
        match self {
            Role::Coordinator(_) => true,
            Role::Worker => false,
        }
    }

    pub fn payload(&self) -> Option<&P> {
        match self {
            Role::Coordinator(payload) => Some(payload),
            Role::Worker => None,
        }
    }

    pub fn payload_mut(&mut self) -> Option<&mut P> {
        match self {
            Role::Coordinator(payload) => Some(payload),
            Role::Worker => None,
        }
    }
}

/// Check that a role agrees with the rank it is being played on.
pub(crate) fn check_role<C: Communicator, P>(comm: &C, role: &Role<P>) -> bool {
    match (role.is_coordinator(), comm.rank() == COORDINATOR) {
        (true, true) | (false, false) => true,
        (true, false) => {
            warn!("rank {} was given the coordinator role, but only rank {} may coordinate", comm.rank(), COORDINATOR);
            false
        },
        (false, true) => {
            warn!("rank {} must coordinate, but was given no payload", COORDINATOR);
            false
        },
    }
}
