//! [`Details`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Percent};

use crate::domain::{
    document,
    milestone::{DocumentKind, Milestone, MILESTONES},
    plot,
};
#[cfg(doc)]
use crate::domain::{Document, Plot};

/// Milestone [`Document`] references issued for a [`Plot`].
///
/// Created once the [`Plot`] is reserved. Every slot is set at most once and
/// never cleared.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Details {
    /// ID of the [`Plot`] these [`Details`] belong to.
    pub plot_id: plot::Id,

    /// Reference of the issued allotment letter, if any.
    pub allotment: Option<document::Reference>,

    /// Reference of the issued allocation letter, if any.
    pub allocation: Option<document::Reference>,

    /// Reference of the issued possession letter, if any.
    pub possession: Option<document::Reference>,

    /// Reference of the issued clearance certificate, if any.
    pub clearance: Option<document::Reference>,

    /// [`DateTime`] when these [`Details`] were created.
    pub created_at: CreationDateTime,
}

impl Details {
    /// Creates new empty [`Details`] of the provided [`Plot`].
    #[must_use]
    pub fn new(plot_id: plot::Id, created_at: CreationDateTime) -> Self {
        Self {
            plot_id,
            allotment: None,
            allocation: None,
            possession: None,
            clearance: None,
            created_at,
        }
    }

    /// Returns the slot of the provided [`DocumentKind`].
    #[must_use]
    pub fn reference(&self, kind: DocumentKind) -> Option<&document::Reference> {
        match kind {
            DocumentKind::Allotment => self.allotment.as_ref(),
            DocumentKind::Allocation => self.allocation.as_ref(),
            DocumentKind::Possession => self.possession.as_ref(),
            DocumentKind::Clearance => self.clearance.as_ref(),
        }
    }

    /// Returns the mutable slot of the provided [`DocumentKind`].
    pub fn reference_mut(
        &mut self,
        kind: DocumentKind,
    ) -> &mut Option<document::Reference> {
        match kind {
            DocumentKind::Allotment => &mut self.allotment,
            DocumentKind::Allocation => &mut self.allocation,
            DocumentKind::Possession => &mut self.possession,
            DocumentKind::Clearance => &mut self.clearance,
        }
    }

    /// Returns the [`Milestone`]s reached at the provided payment completion
    /// [`Percent`] whose [`Document`]s are not issued yet, in ascending
    /// threshold order.
    #[must_use]
    pub fn due_milestones(&self, progress: Percent) -> Vec<Milestone> {
        MILESTONES
            .into_iter()
            .filter(|m| m.is_reached_at(progress))
            .filter(|m| self.reference(m.document).is_none())
            .collect()
    }
}

/// [`DateTime`] when [`Details`] were created.
pub type CreationDateTime = DateTimeOf<(Details, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::{DateTime, Percent};

    use crate::domain::{
        document,
        milestone::{DocumentKind, Milestone},
        plot,
    };

    use super::Details;

    fn details() -> Details {
        Details::new(plot::Id::new(), DateTime::now().coerce())
    }

    fn kinds(milestones: Vec<Milestone>) -> Vec<DocumentKind> {
        milestones.into_iter().map(|m| m.document).collect()
    }

    #[test]
    fn nothing_is_due_below_first_threshold() {
        assert!(details().due_milestones(Percent::ZERO).is_empty());
        assert!(details().due_milestones(Percent::from(9)).is_empty());
    }

    #[test]
    fn crossed_thresholds_are_due_in_order() {
        use DocumentKind as K;

        assert_eq!(
            kinds(details().due_milestones(Percent::from(10))),
            [K::Allotment],
        );
        assert_eq!(
            kinds(details().due_milestones(Percent::from(80))),
            [K::Allotment, K::Allocation, K::Possession],
        );
        assert_eq!(
            kinds(details().due_milestones(Percent::from(120))),
            [K::Allotment, K::Allocation, K::Possession, K::Clearance],
        );
    }

    #[test]
    fn issued_slots_are_never_due_again() {
        use DocumentKind as K;

        let mut details = details();
        _ = details
            .reference_mut(K::Allotment)
            .replace(document::Reference::generate(K::Allotment));

        assert_eq!(
            kinds(details.due_milestones(Percent::from(50))),
            [K::Allocation],
        );
        assert!(details.reference(K::Allotment).is_some());
        assert!(details.reference(K::Clearance).is_none());
    }
}
