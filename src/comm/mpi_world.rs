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

//! `Communicator` for the MPI world.
//!
//! Unlike the in-process group, a failed collective here is not reported; MPI aborts the
//! whole job instead.  (so if the coordinator bails out between collectives, the other
//! processes will sit in their next receive until the job is killed)

use crate::{Communicator, Datum, FailResult, Rank};

use ::mpi::topology::SystemCommunicator;
// (imported anonymously; our own `Communicator` owns the name)
use ::mpi::traits::{Communicator as _, Destination as _, Root as _, Source as _};

/// The MPI world communicator.
///
/// `mpi::initialize` must have been called (and its `Universe` must still be alive)
/// for as long as this is in use.
pub struct MpiWorld {
    world: SystemCommunicator,
}

impl MpiWorld {
    pub fn new() -> Self
    { MpiWorld { world: SystemCommunicator::world() } }

    fn process(&self, rank: Rank) -> ::mpi::topology::Process<'_, SystemCommunicator>
    { self.world.process_at_rank(rank as ::mpi::topology::Rank) }
}

impl Communicator for MpiWorld {
    fn rank(&self) -> Rank { self.world.rank() as Rank }

    fn size(&self) -> usize { self.world.size() as usize }

    fn send<T: Datum>(&self, dest: Rank, data: &[T]) -> FailResult<()>
    {Ok({
        trace!("rank {} -> rank {}: {} items", self.rank(), dest, data.len());
        self.process(dest).send(data);
    })}

    fn receive<T: Datum>(&self, source: Rank) -> FailResult<Vec<T>>
    {Ok({
        let (data, _status) = self.process(source).receive_vec::<T>();
        trace!("rank {} <- rank {}: {} items", self.rank(), source, data.len());
        data
    })}

    // Uses the native broadcast rather than the default fan-out of sends.
    //
    // This differs from the `mpi` crate's own `Root::broadcast_into::<[T]>` in that
    // it can resize the vectors to match.
    fn broadcast<T: Datum>(&self, root: Rank, value: Option<Vec<T>>) -> FailResult<Vec<T>>
    {Ok({
        let is_root = self.rank() == root;
        if is_root && value.is_none() {
            bail!("rank {} is the root of a broadcast but did not provide a value", root);
        }

        let mut buf = value.unwrap_or_else(Vec::new);
        let root_process = self.process(root);

        let mut size = buf.len();
        root_process.broadcast_into(&mut size);

        if !is_root {
            buf.resize(size, T::default());
        }
        root_process.broadcast_into(&mut buf[..]);
        buf
    })}
}
