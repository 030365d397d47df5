//! [`Document`] read definitions.

use crate::domain::{plot, Milestone};
#[cfg(doc)]
use crate::domain::{Document, Plot};

/// Selector of a [`Document`] issued for a [`Plot`] at a [`Milestone`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OfMilestone {
    /// ID of the [`Plot`] the [`Document`] is issued for.
    pub plot_id: plot::Id,

    /// [`Milestone`] the [`Document`] is issued at.
    pub milestone: Milestone,
}
