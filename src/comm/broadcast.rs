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

use crate::{Communicator, FailResult, Rank};

/// Helper trait to broadcast data from the root to all ranks,
/// including scalars and vectors of unknown length.
pub trait Broadcast: Sized {
    /// Broadcast a value from the root to other ranks.
    ///
    /// The value of `value` is ignored on non-root ranks, and must be `Some` on the
    /// root rank.
    //
    // NOTE: The signature is `Option<Self> -> Self` rather than `&mut Self` because
    //       that works for types with no sensible default.
    fn broadcast<C: Communicator>(comm: &C, root: Rank, value: Option<Self>) -> FailResult<Self>;
}

// impl for scalars, which travel as one-element vectors
macro_rules! impl_broadcast_for_scalar {
    ($($T:ident)*) => {$(
        impl Broadcast for $T {
            fn broadcast<C: Communicator>(comm: &C, root: Rank, value: Option<$T>) -> FailResult<$T>
            { expect_single(comm.broadcast(root, value.map(|x| vec![x]))?) }
        }

        impl Broadcast for Vec<$T> {
            fn broadcast<C: Communicator>(comm: &C, root: Rank, value: Option<Vec<$T>>) -> FailResult<Vec<$T>>
            { comm.broadcast(root, value) }
        }
    )*};
}

impl_broadcast_for_scalar! {
    i32 i64 u32 u64 usize
    f64 bool
}

impl<A: Broadcast, B: Broadcast> Broadcast for (A, B) {
    fn broadcast<C: Communicator>(comm: &C, root: Rank, value: Option<(A, B)>) -> FailResult<(A, B)>
    {
        let (a, b) = match value {
            Some((a, b)) => (Some(a), Some(b)),
            None => (None, None),
        };
        let a = Broadcast::broadcast(comm, root, a)?;
        let b = Broadcast::broadcast(comm, root, b)?;
        Ok((a, b))
    }
}

fn expect_single<T: Copy>(values: Vec<T>) -> FailResult<T> {
    ensure!(
        values.len() == 1,
        "expected a scalar broadcast, received {} values", values.len(),
    );
    Ok(values[0])
}
