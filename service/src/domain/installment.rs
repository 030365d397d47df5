//! [`Installment`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{document, plot};
#[cfg(doc)]
use crate::domain::Plot;

/// Scheduled payment towards the total value of a [`Plot`].
///
/// Holds both the planned part (amount, due date) and the ledger part (amount
/// paid, balance) of the payment.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Installment {
    /// ID of this [`Installment`].
    pub id: Id,

    /// ID of the [`Plot`] this [`Installment`] is paid for.
    pub plot_id: plot::Id,

    /// [`Number`] of this [`Installment`] in the schedule of its [`Plot`].
    pub number: Number,

    /// Planned amount of this [`Installment`].
    pub amount: Money,

    /// Cumulative amount paid towards this [`Installment`].
    pub amount_paid: Money,

    /// Remaining amount to be paid, never negative.
    pub balance: Money,

    /// [`Status`] of this [`Installment`].
    pub status: Status,

    /// [`DateTime`] when this [`Installment`] is due.
    pub due_at: DueDateTime,

    /// [`DateTime`] of the last payment towards this [`Installment`].
    pub paid_at: Option<PaymentDateTime>,

    /// Reference of the last payment proof provided by the purchaser.
    pub proof: Option<document::Reference>,

    /// Reference of the receipt issued for the last payment.
    pub receipt: Option<document::Reference>,

    /// [`DateTime`] when this [`Installment`] was created.
    pub created_at: CreationDateTime,
}

impl Installment {
    /// Creates a new [`Status::Pending`] [`Installment`] with nothing paid.
    #[must_use]
    pub fn pending(
        plot_id: plot::Id,
        number: Number,
        amount: Money,
        due_at: DueDateTime,
        created_at: CreationDateTime,
    ) -> Self {
        Self {
            id: Id::new(),
            plot_id,
            number,
            amount,
            amount_paid: Money::zero(amount.currency),
            balance: amount,
            status: Status::Pending,
            due_at,
            paid_at: None,
            proof: None,
            receipt: None,
            created_at,
        }
    }

    /// Applies the provided payment to this [`Installment`], issuing a fresh
    /// receipt.
    ///
    /// Payments accumulate: an overpaid [`Installment`] keeps the whole sum in
    /// its `amount_paid`, while its `balance` floors at zero.
    ///
    /// # Errors
    ///
    /// If the payment is not positive, is in another currency, or overflows.
    /// This [`Installment`] is left untouched then.
    pub fn apply_payment(
        &mut self,
        payment: Money,
        proof: Option<document::Reference>,
        at: PaymentDateTime,
    ) -> Result<(), PaymentError> {
        use PaymentError as E;

        if payment.currency != self.amount.currency {
            return Err(E::CurrencyMismatch);
        }
        if !payment.is_positive() {
            return Err(E::NotPositive);
        }

        let amount_paid =
            self.amount_paid.checked_add(payment).ok_or(E::Overflow)?;
        let remaining =
            self.amount.checked_sub(amount_paid).ok_or(E::Overflow)?;

        self.amount_paid = amount_paid;
        self.balance = remaining.max_zero();
        self.status = if remaining.is_positive() {
            Status::Partial
        } else {
            Status::Paid
        };
        self.paid_at = Some(at);
        if let Some(proof) = proof {
            self.proof = Some(proof);
        }
        self.receipt = Some(document::Reference::receipt());

        Ok(())
    }

    /// Indicates whether this [`Installment`] is unpaid and its due date has
    /// passed by the provided moment.
    #[must_use]
    pub fn is_past_due(&self, now: DueDateTime) -> bool {
        matches!(self.status, Status::Pending | Status::Partial)
            && self.due_at < now
    }

    /// Marks this [`Installment`] as [`Status::Overdue`] if it's past due.
    ///
    /// Returns whether this [`Installment`] was changed.
    pub fn mark_overdue(&mut self, now: DueDateTime) -> bool {
        if !self.is_past_due(now) {
            return false;
        }
        self.status = Status::Overdue;
        true
    }

    /// Indicates whether the `amount_paid` of this [`Installment`] counts
    /// towards the payment progress of its [`Plot`].
    #[must_use]
    pub fn counts_towards_progress(&self) -> bool {
        matches!(self.status, Status::Paid | Status::Partial)
    }
}

/// ID of an [`Installment`].
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

/// Number of an [`Installment`] in the schedule of its [`Plot`].
pub type Number = u16;

define_kind! {
    #[doc = "Status of an [`Installment`]."]
    enum Status {
        #[doc = "Nothing is paid yet."]
        Pending = 1,

        #[doc = "Fully paid."]
        Paid = 2,

        #[doc = "Due date has passed while not fully paid."]
        Overdue = 3,

        #[doc = "Paid in part."]
        Partial = 4,

        #[doc = "Payment has failed."]
        Failed = 5,
    }
}

/// Error of applying a payment to an [`Installment`].
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum PaymentError {
    /// Payment is in a currency other than the [`Installment`] one.
    #[display("payment currency differs from the `Installment` one")]
    CurrencyMismatch,

    /// Payment amount is zero or negative.
    #[display("payment amount must be positive")]
    NotPositive,

    /// Paid amount overflows.
    #[display("paid amount overflows")]
    Overflow,
}

/// [`DateTime`] when an [`Installment`] was created.
pub type CreationDateTime = DateTimeOf<(Installment, unit::Creation)>;

/// Marker type indicating [`Installment`] due date.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// [`DateTime`] when an [`Installment`] is due.
pub type DueDateTime = DateTimeOf<(Installment, Due)>;

/// Marker type indicating [`Installment`] payment.
#[derive(Clone, Copy, Debug)]
pub struct Payment;

/// [`DateTime`] when an [`Installment`] was paid.
pub type PaymentDateTime = DateTimeOf<(Installment, Payment)>;
