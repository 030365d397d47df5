//! Domain definitions.

pub mod delinquency;
pub mod document;
pub mod initiator;
pub mod installment;
pub mod milestone;
pub mod plot;
pub mod purchaser;
pub mod service_provider;

pub use self::{
    delinquency::Delinquency, document::Document, initiator::Initiator,
    installment::Installment, milestone::Milestone, plot::Plot,
};
