//! Classification of [`Command`] and [`Query`] errors.

use derive_more::Display;
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::{Command, Query};

/// Kind of an error, letting outer layers map outcomes uniformly.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// Referenced entity does not exist.
    #[display("NOT_FOUND")]
    NotFound,

    /// Provided input is malformed or violates a business rule.
    #[display("INVALID_INPUT")]
    InvalidInput,

    /// Initiator is not allowed to perform the operation.
    #[display("NOT_AUTHORIZED")]
    NotAuthorized,

    /// Operation conflicts with the current state.
    #[display("CONFLICT")]
    Conflict,

    /// Anything else, not caused by the caller.
    #[display("INTERNAL")]
    Internal,
}

/// Helper trait for classifying errors into [`ErrorKind`]s.
pub trait Classify {
    /// Returns [`ErrorKind`] of this error.
    fn kind(&self) -> ErrorKind;
}

impl<E: Classify> Classify for Traced<E> {
    fn kind(&self) -> ErrorKind {
        self.as_ref().kind()
    }
}

impl Classify for database::Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}
