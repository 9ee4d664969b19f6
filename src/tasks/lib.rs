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

//! Dense linear solvers built on the four-phase [`Task`] protocol.
//!
//! * [`SequentialGauss`] solves a system on the calling thread.
//! * [`DistributedGauss`] splits the rows of the system across a group of workers
//!   (see `hgauss_comm`) and produces the same answer.
//! * [`SequentialAlternations`] and [`DistributedAlternations`] count sign changes in an
//!   integer sequence, using the same protocol and payload carrier.
//!
//! The `entry_points` module holds the `main` functions of the binaries.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate clap;
#[cfg(feature = "mpi-support")]
extern crate mpi;

#[cfg(test)]
#[macro_use]
extern crate hgauss_assert_close;

pub type FailResult<T> = Result<T, ::failure::Error>;

pub use crate::task::{Task, Phase, PhaseFailed, Role, drive};
mod task;

pub use crate::task_data::{TaskData, LinearSystemData, SequenceData, InvalidPayload};
mod task_data;

pub use crate::partition::Partition;
mod partition;

pub use crate::gauss::{PivotStrategy, SequentialGauss, DistributedGauss, AugmentedSystem, random_system};
mod gauss;

pub use crate::alternations::{SequentialAlternations, DistributedAlternations};
mod alternations;

pub mod filetypes;
pub mod entry_points;

mod cmd;
mod env;

mod ui {
    pub mod logging;
    pub mod cfg_merging;
}
