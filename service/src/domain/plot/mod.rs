//! [`Plot`] definitions.

pub mod details;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, define_text, unit, DateTimeOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{purchaser, service_provider};

pub use self::details::Details;

/// Plot of land on sale.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Plot {
    /// ID of this [`Plot`].
    pub id: Id,

    /// [`Number`] of this [`Plot`] in the inventory.
    pub number: Number,

    /// [`Area`] of this [`Plot`], if known.
    pub area: Option<Area>,

    /// [`Location`] of this [`Plot`], if known.
    pub location: Option<Location>,

    /// Total contracted value of this [`Plot`].
    pub total_value: Money,

    /// [`Status`] of this [`Plot`].
    pub status: Status,

    /// ID of the purchaser who reserved this [`Plot`], if any.
    pub purchaser_id: Option<purchaser::Id>,

    /// ID of the service provider selling this [`Plot`], if any.
    pub service_provider_id: Option<service_provider::Id>,

    /// [`DateTime`] when this [`Plot`] was reserved, if it was.
    pub reserved_at: Option<ReservationDateTime>,

    /// [`DateTime`] when this [`Plot`] was created.
    pub created_at: CreationDateTime,
}

impl Plot {
    /// Moves this [`Plot`] into the provided [`Status`].
    ///
    /// Moving into the current [`Status`] is a no-op.
    ///
    /// # Errors
    ///
    /// If the transition is not allowed, leaving this [`Plot`] untouched.
    pub fn transition(&mut self, to: Status) -> Result<(), TransitionError> {
        if !self.status.can_become(to) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// ID of a [`Plot`].
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
    Ord,
    PartialEq,
    PartialOrd,
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

define_text! {
    #[doc = "Inventory number of a [`Plot`], unique across all plots."]
    struct Number(max_len = 64);
}

define_text! {
    #[doc = "Free-form area of a [`Plot`] (`5 Marla`, `1 Kanal`)."]
    struct Area(max_len = 128);
}

define_text! {
    #[doc = "Free-form location of a [`Plot`] (block, street, sector)."]
    struct Location(max_len = 512);
}

define_kind! {
    #[doc = "Status of a [`Plot`]."]
    enum Status {
        #[doc = "[`Plot`] is on sale."]
        Available = 1,

        #[doc = "[`Plot`] is reserved by a purchaser who pays installments."]
        Reserved = 2,

        #[doc = "[`Plot`] is fully paid."]
        Sold = 3,

        #[doc = "[`Plot`] sale is suspended by a legal case."]
        OnHold = 4,
    }
}

impl Status {
    /// Indicates whether a [`Plot`] in this [`Status`] may move into the
    /// `next` one.
    ///
    /// Sale progresses monotonically along `available → reserved → sold`.
    /// Filing a legal case suspends a reserved or sold [`Plot`], and resolving
    /// the case releases it either back on sale or as sold.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        use Status as S;

        matches!(
            (self, next),
            (S::Available, S::Available | S::Reserved)
                | (S::Reserved, S::Reserved | S::Sold | S::OnHold)
                | (S::Sold, S::Sold | S::OnHold)
                | (S::OnHold, S::OnHold | S::Available | S::Sold)
        )
    }
}

/// Error of a disallowed [`Plot`] [`Status`] transition.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`Plot` cannot become `{to}` from `{from}`")]
pub struct TransitionError {
    /// [`Status`] the [`Plot`] is in.
    pub from: Status,

    /// [`Status`] the [`Plot`] was asked to move into.
    pub to: Status,
}

/// [`DateTime`] when a [`Plot`] was created.
pub type CreationDateTime = DateTimeOf<(Plot, unit::Creation)>;

/// Marker type indicating [`Plot`] reservation.
#[derive(Clone, Copy, Debug)]
pub struct Reservation;

/// [`DateTime`] when a [`Plot`] was reserved.
pub type ReservationDateTime = DateTimeOf<(Plot, Reservation)>;
