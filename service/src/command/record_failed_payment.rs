//! [`Command`] for recording a failed payment of a [`Plot`].

use std::time::Duration;

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{delinquency, plot, Delinquency, Plot},
    error::{Classify, ErrorKind},
    infra::{database, database::constraint, Database},
    read::delinquency::Active,
    Service,
};

use super::Command;

/// [`Command`] for recording a failed payment of a [`Plot`] as a
/// [`Delinquency`].
///
/// A [`Plot`] has at most one active [`Delinquency`] at a time.
#[derive(Clone, Debug)]
pub struct RecordFailedPayment {
    /// ID of the [`Plot`] the payment failed for.
    pub plot_id: plot::Id,

    /// Amount which failed to be paid.
    pub amount: Money,

    /// [`delinquency::Description`] of the failure.
    pub description: Option<delinquency::Description>,

    /// Grace period before a legal case may be filed.
    ///
    /// [`Config::default_grace_period`] is used, if not specified.
    ///
    /// [`Config::default_grace_period`]: crate::Config::default_grace_period
    pub grace_period: Option<Duration>,
}

impl<Db> Command<RecordFailedPayment> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Plot>, plot::Id>>,
            Ok = Option<Plot>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Active<Delinquency>>, plot::Id>>,
            Ok = Option<Active<Delinquency>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Delinquency>, Err = Traced<database::Error>>
        + Database<Lock<By<Plot, plot::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Delinquency;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(
        skip_all,
        fields(plot.id = %cmd.plot_id, amount = %cmd.amount),
    )]
    async fn execute(
        &self,
        cmd: RecordFailedPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordFailedPayment {
            plot_id,
            amount,
            description,
            grace_period,
        } = cmd;

        if !amount.is_positive() {
            return Err(tracerr::new!(E::InvalidAmount(amount)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent records upon the same `Plot`.
        tx.execute(Lock(By::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let plot = tx
            .execute(Select(By::<Option<Plot>, _>::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PlotNotExists(plot_id))
            .map_err(tracerr::wrap!())?;
        if plot.total_value.currency != amount.currency {
            return Err(tracerr::new!(E::InvalidAmount(amount)));
        }

        let active = tx
            .execute(Select(By::<Option<Active<Delinquency>>, _>::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(Active(d)) = active {
            return Err(tracerr::new!(E::AlreadyDelinquent(d.id)));
        }

        let now = DateTime::now();
        let grace_period =
            grace_period.unwrap_or(self.config().default_grace_period);
        let delinquency = Delinquency {
            id: delinquency::Id::new(),
            plot_id,
            amount,
            description,
            status: delinquency::Status::Recorded,
            grace_period_ends_at: (now + grace_period).coerce(),
            case: None,
            recorded_at: now.coerce(),
        };

        let inserted = tx.execute(Insert(delinquency.clone())).await;
        if let Err(e) = &inserted {
            if e.as_ref()
                .is_unique_violation(Some(constraint::ACTIVE_DELINQUENCY))
            {
                return Err(tracerr::new!(E::AlreadyDelinquent(
                    delinquency.id
                )));
            }
        }
        inserted
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(delinquency)
    }
}

/// Error of [`RecordFailedPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Plot`] has an active [`Delinquency`] already.
    #[display("`Plot` has an active `Delinquency(id: {_0})` already")]
    AlreadyDelinquent(#[error(not(source))] delinquency::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Failed amount is not positive, or is in a foreign currency.
    #[display("`{_0}` is not a valid failed amount")]
    InvalidAmount(#[error(not(source))] Money),

    /// [`Plot`] with the provided ID does not exist.
    #[display("`Plot(id: {_0})` does not exist")]
    PlotNotExists(#[error(not(source))] plot::Id),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyDelinquent(_) => ErrorKind::Conflict,
            Self::Db(e) => e.kind(),
            Self::InvalidAmount(_) => ErrorKind::InvalidInput,
            Self::PlotNotExists(_) => ErrorKind::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{Currency, DateTime, Money};

    use crate::{
        command::spec::reserved_plot,
        domain::{delinquency, installment::spec::pkr, plot},
        error::{Classify as _, ErrorKind},
        spec::service,
    };

    use super::{Command as _, ExecutionError, RecordFailedPayment};

    fn failed(plot_id: plot::Id, amount: Money) -> RecordFailedPayment {
        RecordFailedPayment {
            plot_id,
            amount,
            description: delinquency::Description::new("Cheque bounced"),
            grace_period: None,
        }
    }

    #[tokio::test]
    async fn records_with_default_grace_period() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let before = DateTime::now();

        let d = svc.execute(failed(p.id, pkr("10000"))).await.unwrap();

        assert_eq!(d.status, delinquency::Status::Recorded);
        assert!(d.case.is_none());
        let ends_at = d.grace_period_ends_at.coerce::<()>();
        assert!(ends_at >= before + svc.config().default_grace_period);
        assert!(
            ends_at
                <= DateTime::now() + svc.config().default_grace_period,
        );
    }

    #[tokio::test]
    async fn respects_explicit_grace_period() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;

        let d = svc
            .execute(RecordFailedPayment {
                grace_period: Some(Duration::ZERO),
                ..failed(p.id, pkr("10000"))
            })
            .await
            .unwrap();

        assert!(d.grace_period_ends_at.coerce::<()>() <= DateTime::now());
    }

    #[tokio::test]
    async fn single_active_record_per_plot() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let first = svc.execute(failed(p.id, pkr("10000"))).await.unwrap();

        let err = svc
            .execute(failed(p.id, pkr("20000")))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::AlreadyDelinquent(id) if *id == first.id,
        ));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn rejects_invalid_amounts() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;

        for amount in [
            pkr("0"),
            Money {
                amount: 10.into(),
                currency: Currency::Usd,
            },
        ] {
            let err = svc.execute(failed(p.id, amount)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }

        let err = svc
            .execute(failed(plot::Id::new(), pkr("1")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
