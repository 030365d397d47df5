//! Background [`Task`]s definitions.

mod background;
pub mod mark_overdue_installments;

pub use common::Handler as Task;

pub use self::{
    background::{Background, TaskError},
    mark_overdue_installments::MarkOverdueInstallments,
};
