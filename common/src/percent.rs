//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

use crate::Money;

/// Fixed-point non-negative percentage.
///
/// Not bounded from above: a ledger which was overpaid yields a value greater
/// than `100`. Use [`Percent::clamped()`] for presentation.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(transparent)
)]
pub struct Percent(Decimal);

impl Percent {
    /// Zero [`Percent`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// One hundred [`Percent`].
    pub const HUNDRED: Self = Self(Decimal::ONE_HUNDRED);

    /// Creates a new [`Percent`] by checking the provided value is not
    /// negative.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (val >= Decimal::ZERO).then_some(Self(val))
    }

    /// Calculates which [`Percent`] the `part` is of the `whole`.
    ///
    /// [`None`] is returned if the currencies differ, the `whole` is not
    /// positive, the `part` is negative, or on overflow.
    #[must_use]
    pub fn of(part: Money, whole: Money) -> Option<Self> {
        if part.currency != whole.currency || !whole.is_positive() {
            return None;
        }
        part.amount
            .checked_div(whole.amount)?
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(Self::new)
    }

    /// Returns the inner [`Decimal`] value of this [`Percent`].
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Returns this [`Percent`] limited to [`Percent::HUNDRED`].
    #[must_use]
    pub fn clamped(self) -> Self {
        self.min(Self::HUNDRED)
    }
}

impl From<u8> for Percent {
    fn from(val: u8) -> Self {
        Self(Decimal::from(val))
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use crate::{money::Currency, Money};

    use super::Percent;

    fn pkr(s: &str) -> Money {
        Money {
            amount: s.parse().unwrap(),
            currency: Currency::Pkr,
        }
    }

    #[test]
    fn of() {
        assert_eq!(
            Percent::of(pkr("10000"), pkr("100000")),
            Some(Percent::from(10)),
        );
        assert_eq!(
            Percent::of(pkr("100000"), pkr("100000")),
            Some(Percent::HUNDRED),
        );
        assert_eq!(
            Percent::of(pkr("1"), pkr("3")).map(Percent::value),
            Decimal::from(1)
                .checked_div(Decimal::from(3))
                .and_then(|d| d.checked_mul(Decimal::ONE_HUNDRED)),
        );
        assert_eq!(Percent::of(pkr("1"), pkr("0")), None);
        assert_eq!(Percent::of(pkr("-1"), pkr("10")), None);
    }

    #[test]
    fn is_not_clamped_unless_asked() {
        let overpaid = Percent::of(pkr("110"), pkr("100")).unwrap();

        assert_eq!(overpaid, Percent::from(110));
        assert_eq!(overpaid.clamped(), Percent::HUNDRED);
        assert_eq!(Percent::from(50).clamped(), Percent::from(50));
    }

    #[test]
    fn from_str() {
        assert_eq!("75".parse::<Percent>(), Ok(Percent::from(75)));
        assert!("-1".parse::<Percent>().is_err());
        assert!("abc".parse::<Percent>().is_err());
    }
}
