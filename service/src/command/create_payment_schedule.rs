//! [`Command`] for creating a payment schedule of a [`Plot`].

use std::collections::HashSet;

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Currency, DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{installment, plot, Installment, Plot},
    error::{Classify, ErrorKind},
    infra::{database, database::constraint, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating the payment schedule of a reserved [`Plot`] as
/// a batch of pending [`Installment`]s.
#[derive(Clone, Debug)]
pub struct CreatePaymentSchedule {
    /// ID of the [`Plot`] to create the schedule for.
    pub plot_id: plot::Id,

    /// [`NewInstallment`]s of the schedule.
    pub installments: Vec<NewInstallment>,
}

/// Planned [`Installment`] of a [`CreatePaymentSchedule`] [`Command`].
#[derive(Clone, Copy, Debug)]
pub struct NewInstallment {
    /// [`installment::Number`] of the [`Installment`].
    pub number: installment::Number,

    /// Planned amount of the [`Installment`].
    pub amount: Money,

    /// [`DateTime`] when the [`Installment`] is due.
    pub due_at: installment::DueDateTime,
}

impl<Db> Command<CreatePaymentSchedule> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Plot>, plot::Id>>,
            Ok = Option<Plot>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Installment>, plot::Id>>,
            Ok = Vec<Installment>,
            Err = Traced<database::Error>,
        > + Database<Insert<Installment>, Err = Traced<database::Error>>
        + Database<Lock<By<Plot, plot::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Vec<Installment>;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(
        skip_all,
        fields(plot.id = %cmd.plot_id, installments = cmd.installments.len()),
    )]
    async fn execute(
        &self,
        cmd: CreatePaymentSchedule,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePaymentSchedule {
            plot_id,
            installments,
        } = cmd;

        if installments.is_empty() {
            return Err(tracerr::new!(E::EmptySchedule));
        }
        let mut numbers = HashSet::with_capacity(installments.len());
        for i in &installments {
            if !numbers.insert(i.number) {
                return Err(tracerr::new!(E::DuplicateNumber(i.number)));
            }
            if !i.amount.is_positive() {
                return Err(tracerr::new!(E::InvalidAmount(i.amount)));
            }
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent schedules of the same `Plot`.
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
        if plot.status != plot::Status::Reserved {
            return Err(tracerr::new!(E::PlotNotReserved(plot.status)));
        }
        let currency = plot.total_value.currency;
        if let Some(i) = installments.iter().find(|i| i.amount.currency != currency)
        {
            return Err(tracerr::new!(E::CurrencyMismatch {
                expected: currency,
                actual: i.amount.currency,
            }));
        }

        let existing = tx
            .execute(Select(By::<Vec<Installment>, _>::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !existing.is_empty() {
            return Err(tracerr::new!(E::ScheduleExists(plot_id)));
        }

        let created_at = DateTime::now().coerce();
        let mut schedule = installments
            .into_iter()
            .map(|i| {
                Installment::pending(
                    plot_id, i.number, i.amount, i.due_at, created_at,
                )
            })
            .collect::<Vec<_>>();
        schedule.sort_by_key(|i| i.number);

        for i in &schedule {
            let inserted = tx.execute(Insert(i.clone())).await;
            if let Err(e) = &inserted {
                if e.as_ref()
                    .is_unique_violation(Some(constraint::INSTALLMENT_NUMBER))
                {
                    return Err(tracerr::new!(E::ScheduleExists(plot_id)));
                }
            }
            inserted
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(schedule)
    }
}

/// Error of [`CreatePaymentSchedule`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`NewInstallment`] is in a [`Currency`] other than the [`Plot`] value.
    #[display("Installment is in `{actual}`, while `Plot` is in `{expected}`")]
    CurrencyMismatch {
        /// [`Currency`] of the [`Plot`] value.
        expected: Currency,

        /// [`Currency`] of the [`NewInstallment`].
        actual: Currency,
    },

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`installment::Number`] is used more than once.
    #[display("Installment number `{_0}` is duplicated")]
    DuplicateNumber(#[error(not(source))] installment::Number),

    /// No [`NewInstallment`]s are provided.
    #[display("Schedule has no installments")]
    EmptySchedule,

    /// [`NewInstallment`] amount is not positive.
    #[display("`{_0}` is not a valid installment amount")]
    InvalidAmount(#[error(not(source))] Money),

    /// [`Plot`] with the provided ID does not exist.
    #[display("`Plot(id: {_0})` does not exist")]
    PlotNotExists(#[error(not(source))] plot::Id),

    /// [`Plot`] is not reserved.
    #[display("`Plot` is `{_0}`, not reserved")]
    PlotNotReserved(#[error(not(source))] plot::Status),

    /// [`Plot`] has a schedule already.
    #[display("`Plot(id: {_0})` has a payment schedule already")]
    ScheduleExists(#[error(not(source))] plot::Id),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::CurrencyMismatch { .. }
            | Self::DuplicateNumber(_)
            | Self::EmptySchedule
            | Self::InvalidAmount(_) => ErrorKind::InvalidInput,
            Self::PlotNotExists(_) => ErrorKind::NotFound,
            Self::PlotNotReserved(_) | Self::ScheduleExists(_) => {
                ErrorKind::Conflict
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{Currency, DateTime, Money};

    use crate::{
        command::spec::{insert, reserved_plot},
        domain::{
            installment::{self, spec::pkr},
            plot,
        },
        error::{Classify as _, ErrorKind},
        spec::service,
    };

    use super::{
        Command as _, CreatePaymentSchedule, ExecutionError, NewInstallment,
    };

    fn monthly(amounts: &[&str]) -> Vec<NewInstallment> {
        amounts
            .iter()
            .zip(1..)
            .map(|(amount, n)| NewInstallment {
                number: n,
                amount: pkr(amount),
                due_at: (DateTime::now()
                    + Duration::from_secs(30 * 86_400 * u64::from(n)))
                .coerce(),
            })
            .collect()
    }

    #[tokio::test]
    async fn creates_pending_installments() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;

        let schedule = svc
            .execute(CreatePaymentSchedule {
                plot_id: p.id,
                installments: monthly(&["40000", "30000", "30000"]),
            })
            .await
            .unwrap();

        assert_eq!(schedule.len(), 3);
        for (i, n) in schedule.iter().zip(1..) {
            assert_eq!(i.number, n);
            assert_eq!(i.plot_id, p.id);
            assert_eq!(i.status, installment::Status::Pending);
            assert_eq!(i.balance, i.amount);
            assert_eq!(i.amount_paid, pkr("0"));
        }
    }

    #[tokio::test]
    async fn second_schedule_conflicts() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        _ = svc
            .execute(CreatePaymentSchedule {
                plot_id: p.id,
                installments: monthly(&["100000"]),
            })
            .await
            .unwrap();

        let err = svc
            .execute(CreatePaymentSchedule {
                plot_id: p.id,
                installments: monthly(&["50000", "50000"]),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::ScheduleExists(_)));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn requires_reserved_plot() {
        let svc = service();
        let available = plot::spec::plot("100000");
        insert(svc.database(), available.clone()).await;

        let err = svc
            .execute(CreatePaymentSchedule {
                plot_id: available.id,
                installments: monthly(&["100000"]),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::PlotNotReserved(plot::Status::Available),
        ));

        let err = svc
            .execute(CreatePaymentSchedule {
                plot_id: plot::Id::new(),
                installments: monthly(&["100000"]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn rejects_malformed_installments() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;

        let mut duplicated = monthly(&["1", "2"]);
        duplicated[1].number = 1;
        let mut foreign = monthly(&["1"]);
        foreign[0].amount = Money {
            amount: 1.into(),
            currency: Currency::Usd,
        };

        for installments in [
            vec![],
            duplicated,
            monthly(&["100", "0"]),
            monthly(&["-5"]),
            foreign,
        ] {
            let err = svc
                .execute(CreatePaymentSchedule {
                    plot_id: p.id,
                    installments,
                })
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }
}
