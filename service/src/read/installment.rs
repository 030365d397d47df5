//! [`Installment`] read definitions.

use common::Money;

use crate::domain::{installment, plot, Installment};
#[cfg(doc)]
use crate::domain::Plot;

/// Payment schedule entry of a [`Plot`].
///
/// Projection of an [`Installment`] exposing its planned part only.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Schedule {
    /// ID of the projected [`Installment`].
    pub id: installment::Id,

    /// ID of the [`Plot`] this [`Schedule`] entry belongs to.
    pub plot_id: plot::Id,

    /// Number of this [`Schedule`] entry.
    pub installment_number: installment::Number,

    /// Planned amount.
    pub amount: Money,

    /// Due date.
    pub due_date: installment::DueDateTime,

    /// [`installment::Status`] of the projected [`Installment`].
    pub status: installment::Status,
}

impl From<&Installment> for Schedule {
    fn from(i: &Installment) -> Self {
        Self {
            id: i.id,
            plot_id: i.plot_id,
            installment_number: i.number,
            amount: i.amount,
            due_date: i.due_at,
            status: i.status,
        }
    }
}

/// Selector of unpaid [`Installment`]s whose due date is before the provided
/// moment.
#[derive(Clone, Copy, Debug)]
pub struct PastDue(pub installment::DueDateTime);
