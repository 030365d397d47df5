//! [`Milestone`] definitions.

use common::{define_kind, Percent};
use derive_more::{Display, Into};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::{Document, Plot};

define_kind! {
    #[doc = "Kind of a [`Document`] issued once a [`Milestone`] is reached."]
    enum DocumentKind {
        #[doc = "Allotment letter, issued at 10% paid."]
        Allotment = 1,

        #[doc = "Allocation letter, issued at 50% paid."]
        Allocation = 2,

        #[doc = "Possession letter, issued at 75% paid."]
        Possession = 3,

        #[doc = "Clearance certificate, issued once fully paid."]
        Clearance = 4,
    }
}

/// Payment completion [`Percent`] gating a [`Milestone`].
///
/// Only the thresholds listed in [`MILESTONES`] are representable.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(into = "u8")]
pub struct Threshold(u8);

impl Threshold {
    /// Returns the [`Threshold`] of the provided percentage, if any
    /// [`Milestone`] is gated by it.
    #[must_use]
    pub fn new(percentage: u8) -> Option<Self> {
        MILESTONES
            .iter()
            .map(|m| m.threshold)
            .find(|t| t.0 == percentage)
    }

    /// Returns this [`Threshold`] as a [`Percent`].
    #[must_use]
    pub fn percent(self) -> Percent {
        Percent::from(self.0)
    }
}

impl TryFrom<u8> for Threshold {
    type Error = &'static str;

    fn try_from(percentage: u8) -> Result<Self, Self::Error> {
        Self::new(percentage).ok_or("not a milestone threshold")
    }
}

impl<'de> Deserialize<'de> for Threshold {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        Self::try_from(u8::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

/// Payment completion milestone of a [`Plot`], gating issuance of a
/// [`DocumentKind`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Milestone {
    /// [`Threshold`] at which this [`Milestone`] is reached.
    pub threshold: Threshold,

    /// [`DocumentKind`] issued once this [`Milestone`] is reached.
    pub document: DocumentKind,
}

/// All the [`Milestone`]s, in ascending [`Threshold`] order.
pub const MILESTONES: [Milestone; 4] = [
    Milestone {
        threshold: Threshold(10),
        document: DocumentKind::Allotment,
    },
    Milestone {
        threshold: Threshold(50),
        document: DocumentKind::Allocation,
    },
    Milestone {
        threshold: Threshold(75),
        document: DocumentKind::Possession,
    },
    Milestone {
        threshold: Threshold(100),
        document: DocumentKind::Clearance,
    },
];

impl Milestone {
    /// Returns the [`Milestone`] gated by the provided [`Threshold`].
    #[must_use]
    pub fn of_threshold(threshold: Threshold) -> Self {
        MILESTONES
            .into_iter()
            .find(|m| m.threshold == threshold)
            .unwrap_or_else(|| unreachable!("`Threshold` is always listed"))
    }

    /// Returns the [`Milestone`] issuing the provided [`DocumentKind`].
    #[must_use]
    pub fn of_document(document: DocumentKind) -> Self {
        MILESTONES
            .into_iter()
            .find(|m| m.document == document)
            .unwrap_or_else(|| unreachable!("`DocumentKind` is always listed"))
    }

    /// Returns the [`Milestone`] of the provided percentage and
    /// [`DocumentKind`], if the percentage is a [`Threshold`].
    ///
    /// The pair is not required to be listed in [`MILESTONES`].
    #[must_use]
    pub fn recorded(percentage: u8, document: DocumentKind) -> Option<Self> {
        Some(Self {
            threshold: Threshold::new(percentage)?,
            document,
        })
    }

    /// Indicates whether this [`Milestone`] is reached at the provided
    /// payment completion [`Percent`].
    #[must_use]
    pub fn is_reached_at(&self, progress: Percent) -> bool {
        progress >= self.threshold.percent()
    }
}

#[cfg(test)]
mod spec {
    use common::Percent;
    use rust_decimal::Decimal;

    use super::{DocumentKind, Milestone, Threshold, MILESTONES};

    #[test]
    fn table_is_ascending() {
        assert!(MILESTONES.windows(2).all(|w| w[0].threshold < w[1].threshold));
        assert_eq!(
            MILESTONES.map(|m| m.document).as_slice(),
            DocumentKind::ALL,
        );
    }

    #[test]
    fn only_listed_thresholds_exist() {
        for p in [10, 50, 75, 100] {
            assert_eq!(u8::from(Threshold::new(p).unwrap()), p);
        }
        for p in [0, 9, 11, 25, 99, 101, 255] {
            assert_eq!(Threshold::new(p), None);
        }
    }

    #[test]
    fn recorded_requires_threshold_only() {
        assert_eq!(
            Milestone::recorded(50, DocumentKind::Allocation),
            Some(Milestone::of_document(DocumentKind::Allocation)),
        );
        assert_eq!(
            Milestone::recorded(50, DocumentKind::Clearance),
            Some(Milestone {
                threshold: Threshold::new(50).unwrap(),
                document: DocumentKind::Clearance,
            }),
        );
        assert_eq!(Milestone::recorded(60, DocumentKind::Allocation), None);
    }

    #[test]
    fn reached_at_threshold_inclusive() {
        let allotment = Milestone::of_document(DocumentKind::Allotment);

        assert!(!allotment.is_reached_at(Percent::new(Decimal::new(999, 2)).unwrap()));
        assert!(allotment.is_reached_at(Percent::from(10)));
        assert!(allotment.is_reached_at(Percent::from(11)));
    }

    #[test]
    fn document_kind_parses_upper_case() {
        assert_eq!(
            "ALLOTMENT".parse::<DocumentKind>(),
            Ok(DocumentKind::Allotment),
        );
        assert!("DEED".parse::<DocumentKind>().is_err());
    }
}
