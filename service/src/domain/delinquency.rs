//! [`Delinquency`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, define_text, unit, DateTimeOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{plot, service_provider};
#[cfg(doc)]
use crate::domain::Plot;

/// Failed payment for a [`Plot`], possibly escalated into a legal [`Case`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Delinquency {
    /// ID of this [`Delinquency`].
    pub id: Id,

    /// ID of the [`Plot`] the payment failed for.
    pub plot_id: plot::Id,

    /// Amount which failed to be paid.
    pub amount: Money,

    /// [`Description`] of this [`Delinquency`], if any.
    pub description: Option<Description>,

    /// [`Status`] of this [`Delinquency`].
    pub status: Status,

    /// [`DateTime`] until which the purchaser may still settle the payment
    /// before a [`Case`] can be filed.
    pub grace_period_ends_at: GracePeriodEndDateTime,

    /// Legal [`Case`] filed upon this [`Delinquency`], if any.
    pub case: Option<Case>,

    /// [`DateTime`] when this [`Delinquency`] was recorded.
    pub recorded_at: RecordDateTime,
}

impl Delinquency {
    /// Indicates whether this [`Delinquency`] is not resolved or closed yet.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Files the provided legal [`Case`] upon this [`Delinquency`].
    ///
    /// # Errors
    ///
    /// - If a [`Case`] is filed already, or this [`Delinquency`] is not
    ///   active.
    /// - If the grace period has not ended by the filing time.
    pub fn file(&mut self, case: Case) -> Result<(), FilingError> {
        if self.status != Status::Recorded || self.case.is_some() {
            return Err(FilingError::AlreadyFiled(self.status));
        }
        if case.filed_at.coerce::<()>()
            < self.grace_period_ends_at.coerce::<()>()
        {
            return Err(FilingError::GracePeriodNotEnded(
                self.grace_period_ends_at,
            ));
        }
        self.status = Status::Filed;
        self.case = Some(case);
        Ok(())
    }

    /// Moves this [`Delinquency`] according to the provided [`Outcome`].
    ///
    /// Returns the [`plot::Status`] an on-hold [`Plot`] should be released
    /// into, if any.
    ///
    /// # Errors
    ///
    /// If this [`Delinquency`] is not active anymore.
    pub fn resolve(
        &mut self,
        outcome: Outcome,
    ) -> Result<Option<plot::Status>, InactiveError> {
        if !self.is_active() {
            return Err(InactiveError(self.status));
        }
        let (status, release) = match outcome {
            Outcome::InProgress => (Status::InProgress, None),
            Outcome::Resolved => (Status::Resolved, Some(plot::Status::Sold)),
            Outcome::Closed => (Status::Closed, Some(plot::Status::Available)),
        };
        self.status = status;
        Ok(release)
    }
}

/// ID of a [`Delinquency`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Status of a [`Delinquency`]."]
    enum Status {
        #[doc = "Failed payment is recorded, grace period is running."]
        Recorded = 1,

        #[doc = "Legal [`Case`] is filed."]
        Filed = 2,

        #[doc = "Legal [`Case`] is being heard."]
        InProgress = 3,

        #[doc = "Debt is settled."]
        Resolved = 4,

        #[doc = "Sale is cancelled."]
        Closed = 5,
    }
}

impl Status {
    /// Indicates whether a [`Delinquency`] in this [`Status`] is active.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Recorded | Self::Filed | Self::InProgress)
    }
}

define_kind! {
    #[doc = "Outcome of a legal [`Case`] hearing."]
    enum Outcome {
        #[doc = "[`Case`] is being heard."]
        InProgress = 1,

        #[doc = "Debt is settled, the [`Plot`] stays sold to the purchaser."]
        Resolved = 2,

        #[doc = "Sale is cancelled, the [`Plot`] goes back on sale."]
        Closed = 3,
    }
}

/// Legal case filed upon a [`Delinquency`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Case {
    /// [`CaseId`] assigned on filing.
    pub id: CaseId,

    /// [`DateTime`] of the court hearing, if scheduled.
    pub court_date: Option<CourtDateTime>,

    /// [`ChargeCode`] of this [`Case`], if any.
    pub charge_code: Option<ChargeCode>,

    /// Amount charged by this [`Case`], if any.
    pub amount_charged: Option<Money>,

    /// ID of the service provider who filed this [`Case`], if any.
    pub filed_by: Option<service_provider::Id>,

    /// [`DateTime`] when this [`Case`] was filed.
    pub filed_at: FilingDateTime,
}

define_text! {
    #[doc = "Human-readable ID of a [`Case`] (`CASE-1A2B3C4D`)."]
    struct CaseId(max_len = 32);
}

impl CaseId {
    /// Generates a new random [`CaseId`].
    #[must_use]
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self(format!("CASE-{}", uuid[..8].to_ascii_uppercase()))
    }
}

define_text! {
    #[doc = "Charge code of a [`Case`]."]
    struct ChargeCode(max_len = 64);
}

define_text! {
    #[doc = "Free-form description of a [`Delinquency`]."]
    struct Description(max_len = 4096);
}

/// Error of filing a [`Case`] upon a [`Delinquency`].
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum FilingError {
    /// [`Case`] is filed already.
    #[display("`Case` is already filed, `Delinquency` is `{_0}`")]
    AlreadyFiled(#[error(not(source))] Status),

    /// Grace period has not ended yet.
    #[display("grace period ends at {}", _0.to_rfc3339())]
    GracePeriodNotEnded(#[error(not(source))] GracePeriodEndDateTime),
}

/// Error of moving an inactive [`Delinquency`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`Delinquency` is `{_0}` already")]
pub struct InactiveError(#[error(not(source))] pub Status);

/// Marker type indicating a [`Delinquency`] record.
#[derive(Clone, Copy, Debug)]
pub struct Record;

/// [`DateTime`] when a [`Delinquency`] was recorded.
pub type RecordDateTime = DateTimeOf<(Delinquency, Record)>;

/// Marker type indicating the end of a [`Delinquency`] grace period.
#[derive(Clone, Copy, Debug)]
pub struct GracePeriodEnd;

/// [`DateTime`] when a [`Delinquency`] grace period ends.
pub type GracePeriodEndDateTime = DateTimeOf<(Delinquency, GracePeriodEnd)>;

/// Marker type indicating a court hearing.
#[derive(Clone, Copy, Debug)]
pub struct Court;

/// [`DateTime`] of a [`Case`] court hearing.
pub type CourtDateTime = DateTimeOf<(Case, Court)>;

/// [`DateTime`] when a [`Case`] was filed.
pub type FilingDateTime = DateTimeOf<(Case, unit::Creation)>;

#[cfg(test)]
pub(crate) mod spec {
    use std::time::Duration;

    use common::{Currency, DateTime, Money};

    use crate::domain::plot;

    use super::{
        Case, CaseId, Delinquency, FilingError, Id, Outcome, Status,
    };

    /// Creates a recorded [`Delinquency`] whose grace period ends after the
    /// provided offset from now.
    pub(crate) fn delinquency(
        plot_id: plot::Id,
        grace_ends_in: Option<Duration>,
    ) -> Delinquency {
        let now = DateTime::now();
        Delinquency {
            id: Id::new(),
            plot_id,
            amount: Money {
                amount: 5000.into(),
                currency: Currency::Pkr,
            },
            description: None,
            status: Status::Recorded,
            grace_period_ends_at: match grace_ends_in {
                Some(d) => (now + d).coerce(),
                None => (now - Duration::from_secs(1)).coerce(),
            },
            case: None,
            recorded_at: now.coerce(),
        }
    }

    fn case() -> Case {
        Case {
            id: CaseId::generate(),
            court_date: None,
            charge_code: None,
            amount_charged: None,
            filed_by: None,
            filed_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn case_id_format() {
        let id = CaseId::generate();
        let id = id.as_ref();

        assert_eq!(id.len(), 13);
        assert!(id.starts_with("CASE-"));
        assert!(id[5..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn files_only_after_grace_period() {
        let mut early = delinquency(
            plot::Id::new(),
            Some(Duration::from_secs(86_400)),
        );
        assert!(matches!(
            early.file(case()),
            Err(FilingError::GracePeriodNotEnded(_)),
        ));
        assert_eq!(early.status, Status::Recorded);

        let mut due = delinquency(plot::Id::new(), None);
        due.file(case()).unwrap();
        assert_eq!(due.status, Status::Filed);
        assert!(matches!(
            due.file(case()),
            Err(FilingError::AlreadyFiled(Status::Filed)),
        ));
    }

    #[test]
    fn resolution_releases_plot() {
        let mut d = delinquency(plot::Id::new(), None);
        assert_eq!(d.resolve(Outcome::InProgress).unwrap(), None);
        assert!(d.is_active());
        assert_eq!(
            d.resolve(Outcome::Resolved).unwrap(),
            Some(plot::Status::Sold),
        );
        assert!(!d.is_active());
        assert!(d.resolve(Outcome::Closed).is_err());

        let mut d = delinquency(plot::Id::new(), None);
        assert_eq!(
            d.resolve(Outcome::Closed).unwrap(),
            Some(plot::Status::Available),
        );
    }
}
