//! [`Money`]-related definitions.

use std::{cmp::Ordering, fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize)
)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a zero [`Money`] amount in the provided [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Indicates whether this [`Money`] amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Adds the `other` [`Money`] to this one.
    ///
    /// [`None`] is returned if the [`Currency`]s differ or on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        (self.currency == other.currency).then_some(())?;
        Some(Self {
            amount: self.amount.checked_add(other.amount)?,
            currency: self.currency,
        })
    }

    /// Subtracts the `other` [`Money`] from this one.
    ///
    /// The result may be negative. [`None`] is returned if the [`Currency`]s
    /// differ or on overflow.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        (self.currency == other.currency).then_some(())?;
        Some(Self {
            amount: self.amount.checked_sub(other.amount)?,
            currency: self.currency,
        })
    }

    /// Returns this [`Money`] floored at zero.
    #[must_use]
    pub fn max_zero(self) -> Self {
        Self {
            amount: self.amount.max(Decimal::ZERO),
            currency: self.currency,
        }
    }

    /// Compares this [`Money`] with the `other` one.
    ///
    /// [`None`] is returned if the [`Currency`]s differ.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        (self.currency == other.currency)
            .then(|| self.amount.cmp(&other.amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        let code = currency.as_ref().to_ascii_uppercase();
        match amount.is_integer().then(|| amount.to_i128()).flatten() {
            Some(int) => write!(f, "{int}{code}"),
            None => write!(f, "{}{code}", amount.normalize()),
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "Pakistani Rupee."]
        Pkr = 1,

        #[doc = "US Dollar."]
        Usd = 2,

        #[doc = "Euro."]
        Eur = 3,
    }
}

#[cfg(test)]
mod spec {
    use std::{cmp::Ordering, str::FromStr as _};

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn pkr(s: &str) -> Money {
        Money {
            amount: decimal(s),
            currency: Currency::Pkr,
        }
    }

    #[test]
    fn from_str() {
        assert_eq!(Money::from_str("123.45PKR").unwrap(), pkr("123.45"));
        assert_eq!(
            Money::from_str("10usd").unwrap(),
            Money {
                amount: decimal("10"),
                currency: Currency::Usd,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Pk").is_err());
        assert!(Money::from_str("123.45Rupees").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(pkr("123.45").to_string(), "123.45PKR");
        assert_eq!(pkr("123.00").to_string(), "123PKR");
        assert_eq!(pkr("100000").to_string(), "100000PKR");
        assert_eq!(pkr("0.50").to_string(), "0.5PKR");
    }

    #[test]
    fn arithmetic_requires_same_currency() {
        let usd = Money {
            amount: decimal("1"),
            currency: Currency::Usd,
        };

        assert_eq!(pkr("1.5").checked_add(pkr("2")), Some(pkr("3.5")));
        assert_eq!(pkr("1").checked_sub(pkr("3")), Some(pkr("-2")));
        assert_eq!(pkr("1").checked_add(usd), None);
        assert_eq!(pkr("1").checked_sub(usd), None);
        assert_eq!(pkr("1").compare(&usd), None);
        assert_eq!(pkr("1").compare(&pkr("2")), Some(Ordering::Less));
    }

    #[test]
    fn max_zero_floors_negative_amounts() {
        assert_eq!(pkr("-2").max_zero(), pkr("0"));
        assert_eq!(pkr("2").max_zero(), pkr("2"));
        assert!(!pkr("0").is_positive());
        assert!(pkr("0.01").is_positive());
    }
}
