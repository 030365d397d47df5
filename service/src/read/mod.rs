//! Read entities definitions.

pub mod delinquency;
pub mod document;
pub mod installment;
pub mod plot;

pub use self::{installment::Schedule, plot::Progress};
