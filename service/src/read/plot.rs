//! [`Plot`] read definitions.

use common::{Currency, Money, Percent};
use rust_decimal::Decimal;

use crate::domain::{Installment, Plot};

/// Payment progress of a [`Plot`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Progress {
    /// Paid part of the total value, not clamped to `100`.
    pub percentage: Percent,

    /// Total amount paid.
    pub total_paid: Decimal,

    /// Total value of the [`Plot`].
    pub total_value: Decimal,

    /// [`Currency`] of the amounts, if the [`Plot`] exists.
    pub currency: Option<Currency>,
}

impl Progress {
    /// [`Progress`] of a missing or worthless [`Plot`].
    pub const ZERO: Self = Self {
        percentage: Percent::ZERO,
        total_paid: Decimal::ZERO,
        total_value: Decimal::ZERO,
        currency: None,
    };

    /// Computes [`Progress`] of the provided [`Plot`] from its
    /// [`Installment`]s.
    ///
    /// Only [`Installment`]s counting towards progress are summed. A missing
    /// [`Plot`], or one with a non-positive total value, yields
    /// [`Progress::ZERO`].
    #[must_use]
    pub fn compute(plot: Option<&Plot>, installments: &[Installment]) -> Self {
        let Some(plot) = plot.filter(|p| p.total_value.is_positive()) else {
            return Self::ZERO;
        };
        let value = plot.total_value;

        let paid = installments
            .iter()
            .filter(|i| i.plot_id == plot.id && i.counts_towards_progress())
            .map(|i| i.amount_paid)
            .filter(|m| m.currency == value.currency)
            .try_fold(Money::zero(value.currency), Money::checked_add);
        let Some(paid) = paid else {
            return Self::ZERO;
        };

        Self {
            percentage: Percent::of(paid, value).unwrap_or_default(),
            total_paid: paid.amount,
            total_value: value.amount,
            currency: Some(value.currency),
        }
    }

    /// Returns the total amount paid as [`Money`], if the [`Plot`] exists.
    #[must_use]
    pub fn paid(&self) -> Option<Money> {
        self.currency.map(|currency| Money {
            amount: self.total_paid,
            currency,
        })
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Percent};
    use rust_decimal::Decimal;

    use crate::domain::{
        installment::{self, spec::pkr},
        plot,
    };

    use super::Progress;

    #[test]
    fn missing_or_worthless_plot_is_zero() {
        assert_eq!(Progress::compute(None, &[]), Progress::ZERO);

        let plot = plot::spec::plot("0");
        assert_eq!(Progress::compute(Some(&plot), &[]), Progress::ZERO);
    }

    #[test]
    fn sums_paid_and_partial_only() {
        let plot = plot::spec::plot("100000");
        let mut paid = installment::spec::installment(plot.id, 1, "10000");
        paid.apply_payment(pkr("10000"), None, common::DateTime::now().coerce())
            .unwrap();
        let mut partial = installment::spec::installment(plot.id, 2, "10000");
        partial
            .apply_payment(pkr("5000"), None, common::DateTime::now().coerce())
            .unwrap();
        let mut overdue = installment::spec::installment(plot.id, 3, "10000");
        overdue.amount_paid = pkr("3000");
        overdue.status = installment::Status::Overdue;
        let pending = installment::spec::installment(plot.id, 4, "10000");

        let progress = Progress::compute(
            Some(&plot),
            &[paid, partial, overdue, pending],
        );

        assert_eq!(progress.percentage, Percent::from(15));
        assert_eq!(progress.total_paid, Decimal::from(15000));
        assert_eq!(progress.total_value, Decimal::from(100_000));
        assert_eq!(progress.currency, Some(Currency::Pkr));
        assert_eq!(progress.paid(), Some(pkr("15000")));
    }

    #[test]
    fn overpaid_is_not_clamped() {
        let plot = plot::spec::plot("1000");
        let mut inst = installment::spec::installment(plot.id, 1, "1000");
        inst.apply_payment(pkr("1500"), None, common::DateTime::now().coerce())
            .unwrap();

        let progress = Progress::compute(Some(&plot), &[inst]);

        assert_eq!(progress.percentage, Percent::from(150));
        assert_eq!(progress.percentage.clamped(), Percent::HUNDRED);
    }
}
