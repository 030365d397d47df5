//! [`Database`]-related implementations.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// Names of the unique constraints the [`Database`] enforces.
pub mod constraint {
    /// Plot numbers are unique across all plots.
    pub const PLOT_NUMBER: &str = "plots_number_key";

    /// Installment numbers are unique per plot.
    pub const INSTALLMENT_NUMBER: &str = "installments_plot_id_number_key";

    /// Single milestone document per plot, threshold and document kind.
    pub const MILESTONE_DOCUMENT: &str =
        "milestone_documents_plot_id_threshold_kind_key";

    /// Single active delinquency per plot.
    pub const ACTIVE_DELINQUENCY: &str = "delinquencies_active_plot_id_key";
}

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(any(test, feature = "memory"))]
    /// [`Memory`] error.
    Memory(memory::Error),

    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

impl Error {
    /// Checks whether this [`Error`] is a violation of the provided unique
    /// [`constraint`] (or any, if [`None`]).
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            #[cfg(any(test, feature = "memory"))]
            Self::Memory(e) => e.is_unique_violation(constraint),
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(constraint),
        }
    }
}
