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

//! An in-process worker group.
//!
//! Each rank is a scoped thread.  Every ordered pair of ranks `(src, dest)` gets its own
//! channel, so messages from one sender are never overtaken by later messages from the
//! same sender (the same guarantee MPI gives), and a receive from a particular rank
//! never has to sift through messages from anybody else.
//!
//! Nothing is shared between the threads except these channels; whatever a rank wants
//! another rank to see, it has to send.

use crate::{Communicator, Datum, FailResult, Rank};

use ::std::any::Any;
use ::std::panic;
use ::std::sync::mpsc::{self, Receiver, Sender};
use ::std::thread;

type Parcel = Box<dyn Any + Send>;

/// A fixed number of ranks that will run as threads of this process.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LocalGroup {
    size: usize,
}

impl LocalGroup {
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "a worker group needs at least one member");
        LocalGroup { size }
    }

    pub fn size(&self) -> usize { self.size }

    /// Run `body` once on every rank, each on its own thread, and wait for all of them.
    ///
    /// The results are returned in rank order.
    ///
    /// # Panics
    ///
    /// If any rank panics, the panic is resumed on the calling thread once all ranks have
    /// stopped.  Ranks that were waiting on the panicked rank observe it as a hang-up
    /// (an `Err` from `receive`) rather than blocking forever.
    pub fn run<R, F>(&self, body: F) -> Vec<R>
    where
        F: Fn(LocalComm) -> R + Sync,
        R: Send,
    {
        let body = &body;
        let comms = self.connect();

        thread::scope(|scope| {
            let handles: Vec<_> = comms.into_iter().map(|comm| {
                thread::Builder::new()
                    .name(format!("rank-{}", comm.rank))
                    .spawn_scoped(scope, move || body(comm))
                    .expect("failed to spawn worker thread")
            }).collect();

            handles.into_iter()
                .map(|handle| match handle.join() {
                    Ok(value) => value,
                    Err(payload) => panic::resume_unwind(payload),
                })
                .collect()
        })
    }

    fn connect(&self) -> Vec<LocalComm> {
        let size = self.size;
        let mut outboxes: Vec<Vec<Sender<Parcel>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut inboxes: Vec<Vec<Receiver<Parcel>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();

        // (src-major order makes inboxes[dest] come out indexed by src)
        for src in 0..size {
            for dest in 0..size {
                let (tx, rx) = mpsc::channel();
                outboxes[src].push(tx);
                inboxes[dest].push(rx);
            }
        }

        outboxes.into_iter().zip(inboxes).enumerate()
            .map(|(rank, (outboxes, inboxes))| LocalComm { rank, size, outboxes, inboxes })
            .collect()
    }
}

/// One rank's view of a `LocalGroup`.
///
/// Dropping it hangs up all of its channels.
#[derive(Debug)]
pub struct LocalComm {
    rank: Rank,
    size: usize,
    /// Indexed by destination rank.
    outboxes: Vec<Sender<Parcel>>,
    /// Indexed by source rank.
    inboxes: Vec<Receiver<Parcel>>,
}

impl LocalComm {
    fn check_rank(&self, other: Rank) -> FailResult<()> {
        ensure!(
            other < self.size,
            "rank {} does not exist in a group of size {}", other, self.size,
        );
        Ok(())
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> Rank { self.rank }

    fn size(&self) -> usize { self.size }

    fn send<T: Datum>(&self, dest: Rank, data: &[T]) -> FailResult<()>
    {Ok({
        self.check_rank(dest)?;
        trace!("rank {} -> rank {}: {} items", self.rank, dest, data.len());

        let parcel: Parcel = Box::new(data.to_vec());
        if self.outboxes[dest].send(parcel).is_err() {
            bail!("rank {} tried to send to rank {}, which has already left the group", self.rank, dest);
        }
    })}

    fn receive<T: Datum>(&self, source: Rank) -> FailResult<Vec<T>>
    {
        self.check_rank(source)?;

        let parcel = match self.inboxes[source].recv() {
            Ok(parcel) => parcel,
            Err(_) => bail!("rank {} hung up while rank {} was waiting on it", source, self.rank),
        };
        match parcel.downcast::<Vec<T>>() {
            Ok(data) => {
                trace!("rank {} <- rank {}: {} items", self.rank, source, data.len());
                Ok(*data)
            },
            Err(_) => bail!("rank {} received a message of the wrong type from rank {}", self.rank, source),
        }
    }
}
