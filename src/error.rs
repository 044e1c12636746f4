//! Conversion errors
//!
//! Every failure carries a static diagnostic naming the site that raised it.
//! Nothing here allocates, so tearing down after an error cannot itself fail.

use thiserror::Error;

/// Build a static diagnostic string that points at the raising source line.
#[macro_export]
macro_rules! site {
    ($msg:literal) => {
        concat!("File: ", file!(), " Line: ", line!(), ": ", $msg)
    };
}

/// A fatal conversion failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// An arena, table or stack could not grow
    #[error("{0}")]
    OutOfMemory(&'static str),
    /// Attaching a child, setting a namespace or setting the root failed
    #[error("{0}")]
    Structure(&'static str),
    /// The walk met a source node it cannot convert
    #[error("{0}")]
    UnknownNode(&'static str),
    /// A required namespace binding could not be provided
    #[error("{0}")]
    Namespace(&'static str),
    /// A host-supplied source tree was malformed
    #[error("{0}")]
    Decode(&'static str),
}

impl ConvertError {
    /// The static diagnostic for this failure
    pub fn message(&self) -> &'static str {
        match *self {
            ConvertError::OutOfMemory(msg)
            | ConvertError::Structure(msg)
            | ConvertError::UnknownNode(msg)
            | ConvertError::Namespace(msg)
            | ConvertError::Decode(msg) => msg,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Reserve room for one more element in an arena, reporting failure instead of aborting.
#[inline]
pub(crate) fn reserve_one<T>(v: &mut Vec<T>, on_fail: &'static str) -> Result<()> {
    #[cfg(test)]
    failpoint::check(on_fail)?;
    v.try_reserve(1).map_err(|_| ConvertError::OutOfMemory(on_fail))
}

/// Id of the next slot in an arena of `len` entries; ids are `u32`.
#[inline]
pub(crate) fn next_id(len: usize, on_fail: &'static str) -> Result<u32> {
    u32::try_from(len).map_err(|_| ConvertError::OutOfMemory(on_fail))
}

/// Test-only allocation fail-point.
///
/// Arms a per-thread budget of successful reservations; the reservation after
/// the budget is spent fails as if the allocator had returned null.
#[cfg(test)]
pub(crate) mod failpoint {
    use super::{ConvertError, Result};
    use std::cell::Cell;

    thread_local! {
        static BUDGET: Cell<Option<usize>> = const { Cell::new(None) };
    }

    /// Disarms the fail-point when dropped
    pub struct Armed;

    impl Drop for Armed {
        fn drop(&mut self) {
            BUDGET.with(|b| b.set(None));
        }
    }

    #[must_use]
    pub fn arm(successes: usize) -> Armed {
        BUDGET.with(|b| b.set(Some(successes)));
        Armed
    }

    pub fn check(site: &'static str) -> Result<()> {
        BUDGET.with(|b| match b.get() {
            None => Ok(()),
            Some(0) => Err(ConvertError::OutOfMemory(site)),
            Some(n) => {
                b.set(Some(n - 1));
                Ok(())
            }
        })
    }
}
