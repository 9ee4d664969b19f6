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

//! Message passing between the members of a fixed group of workers.
//!
//! Everything a distributed task needs from its environment goes through the
//! [`Communicator`] trait: "who am I", "how many of us are there", point-to-point
//! messages, and the two collectives built on top of them (broadcast and gather).
//!
//! Two implementations exist:
//!
//! * [`LocalGroup`], which runs every rank as a scoped thread of the current process and
//!   connects them with channels.  This is what the tests use, and what the CLI uses
//!   unless told otherwise.
//! * `MpiWorld` (behind the `mpi-support` feature), which talks to the MPI world communicator.
//!
//! # Blocking
//!
//! Every receive blocks until the matching send has happened.  Broadcast and gather are
//! built out of these receives, so no rank can return from a collective before the data
//! it is supposed to obtain from it has actually arrived.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[cfg(feature = "mpi-support")]
extern crate mpi;

pub type FailResult<T> = Result<T, ::failure::Error>;

/// Ordinal identity of a worker within its group.  Ranks of a group of size `n` are `0..n`.
pub type Rank = usize;

/// The rank that holds the authoritative inputs and assembles final results.
pub const COORDINATOR: Rank = 0;

pub use crate::broadcast::Broadcast;
mod broadcast;

pub use crate::local::{LocalGroup, LocalComm};
mod local;

#[cfg(feature = "mpi-support")]
pub use crate::mpi_world::MpiWorld;
#[cfg(feature = "mpi-support")]
mod mpi_world;

/// Plain-old-data element types that may be sent between ranks.
#[cfg(not(feature = "mpi-support"))]
pub trait Datum: Copy + Default + Send + 'static {}

/// Plain-old-data element types that may be sent between ranks.
///
/// With MPI support enabled these must also have an MPI datatype.
#[cfg(feature = "mpi-support")]
pub trait Datum: Copy + Default + Send + 'static + ::mpi::datatype::Equivalence {}

macro_rules! impl_datum {
    ($($T:ident)*) => {$( impl Datum for $T {} )*};
}
impl_datum! {
    i32 i64 u32 u64 usize
    f64 bool
}

/// A handle on one member of a fixed-size group of workers.
///
/// The methods here are all called with the same arguments-in-spirit on every
/// participating rank (in the style of MPI); e.g. every rank must call `broadcast` with
/// the same `root`, and only the root's `value` matters.
///
/// Messages between any ordered pair of ranks are received in the order they were sent.
pub trait Communicator {
    fn rank(&self) -> Rank;

    fn size(&self) -> usize;

    fn is_coordinator(&self) -> bool
    { self.rank() == COORDINATOR }

    /// Send a message to a single rank.
    fn send<T: Datum>(&self, dest: Rank, data: &[T]) -> FailResult<()>;

    /// Block until a message arrives from `source`.
    ///
    /// Fails if `source` can no longer send anything (e.g. its worker has exited).
    fn receive<T: Datum>(&self, source: Rank) -> FailResult<Vec<T>>;

    /// Distribute a vector from `root` to all ranks.
    ///
    /// `value` is ignored on non-root ranks, and must be `Some` on the root.
    /// Every rank (the root included) receives the root's vector.
    fn broadcast<T: Datum>(&self, root: Rank, value: Option<Vec<T>>) -> FailResult<Vec<T>>
    {Ok({
        if self.rank() == root {
            let value = match value {
                Some(value) => value,
                None => bail!("rank {} is the root of a broadcast but did not provide a value", root),
            };
            for dest in (0..self.size()).filter(|&r| r != root) {
                self.send(dest, &value)?;
            }
            value
        } else {
            self.receive(root)?
        }
    })}

    /// Collect one vector from every rank onto `root`.
    ///
    /// On the root this returns `Some` with the contributions ordered by rank;
    /// on every other rank it returns `None`.
    fn gather<T: Datum>(&self, root: Rank, data: &[T]) -> FailResult<Option<Vec<Vec<T>>>>
    {Ok({
        if self.rank() == root {
            let mut parts = Vec::with_capacity(self.size());
            for source in 0..self.size() {
                match source == root {
                    true => parts.push(data.to_vec()),
                    false => parts.push(self.receive(source)?),
                }
            }
            Some(parts)
        } else {
            self.send(root, data)?;
            None
        }
    })}
}

impl<'a, C: Communicator> Communicator for &'a C {
    fn rank(&self) -> Rank { (**self).rank() }
    fn size(&self) -> usize { (**self).size() }

    fn send<T: Datum>(&self, dest: Rank, data: &[T]) -> FailResult<()>
    { (**self).send(dest, data) }

    fn receive<T: Datum>(&self, source: Rank) -> FailResult<Vec<T>>
    { (**self).receive(source) }

    fn broadcast<T: Datum>(&self, root: Rank, value: Option<Vec<T>>) -> FailResult<Vec<T>>
    { (**self).broadcast(root, value) }

    fn gather<T: Datum>(&self, root: Rank, data: &[T]) -> FailResult<Option<Vec<Vec<T>>>>
    { (**self).gather(root, data) }
}
