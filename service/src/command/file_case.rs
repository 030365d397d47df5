//! [`Command`] for filing a legal [`Case`] upon a [`Delinquency`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        delinquency::{self, Case},
        initiator::Role,
        plot, Delinquency, Initiator, Plot,
    },
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for filing a legal [`Case`] upon a [`Delinquency`] whose
/// grace period has ended.
///
/// Puts the [`Plot`] on hold until the [`Case`] is resolved.
#[derive(Clone, Debug)]
pub struct FileCase {
    /// ID of the [`Delinquency`] to file the [`Case`] upon.
    pub delinquency_id: delinquency::Id,

    /// [`DateTime`] of the court hearing, if scheduled.
    pub court_date: Option<delinquency::CourtDateTime>,

    /// [`delinquency::ChargeCode`] of the [`Case`].
    pub charge_code: Option<delinquency::ChargeCode>,

    /// Amount charged by the [`Case`].
    pub amount_charged: Option<Money>,

    /// New [`delinquency::Description`] of the [`Delinquency`], if any.
    pub description: Option<delinquency::Description>,

    /// [`Initiator`] filing the [`Case`].
    pub initiator: Initiator,
}

impl<Db> Command<FileCase> for Service<Db>
where
    Db: Database<
            Select<By<Option<Delinquency>, delinquency::Id>>,
            Ok = Option<Delinquency>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Delinquency>, delinquency::Id>>,
            Ok = Option<Delinquency>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Plot>, plot::Id>>,
            Ok = Option<Plot>,
            Err = Traced<database::Error>,
        > + Database<Update<Delinquency>, Err = Traced<database::Error>>
        + Database<Update<Plot>, Err = Traced<database::Error>>
        + Database<Lock<By<Plot, plot::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Delinquency;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(
        skip_all,
        fields(
            delinquency.id = %cmd.delinquency_id,
            initiator.role = %cmd.initiator.role,
        ),
    )]
    async fn execute(&self, cmd: FileCase) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let FileCase {
            delinquency_id,
            court_date,
            charge_code,
            amount_charged,
            description,
            initiator,
        } = cmd;

        if !matches!(initiator.role, Role::ServiceProvider | Role::Legal) {
            return Err(tracerr::new!(E::NotAuthorized(initiator.role)));
        }

        let plot_id = self
            .database()
            .execute(Select(By::<Option<Delinquency>, _>::new(delinquency_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DelinquencyNotExists(delinquency_id))
            .map_err(tracerr::wrap!())?
            .plot_id;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Plot`.
        tx.execute(Lock(By::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut delinquency = tx
            .execute(Select(By::<Option<Delinquency>, _>::new(delinquency_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DelinquencyNotExists(delinquency_id))
            .map_err(tracerr::wrap!())?;
        let mut plot = tx
            .execute(Select(By::<Option<Plot>, _>::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PlotNotExists(plot_id))
            .map_err(tracerr::wrap!())?;

        if let Some(charged) = amount_charged {
            if charged.currency != delinquency.amount.currency
                || !charged.is_positive()
            {
                return Err(tracerr::new!(E::InvalidAmountCharged(charged)));
            }
        }

        delinquency
            .file(Case {
                id: delinquency::CaseId::generate(),
                court_date,
                charge_code,
                amount_charged,
                filed_by: initiator.service_provider_id,
                filed_at: DateTime::now().coerce(),
            })
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if description.is_some() {
            delinquency.description = description;
        }
        plot.transition(plot::Status::OnHold)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(delinquency.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Update(plot))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(delinquency)
    }
}

/// Error of [`FileCase`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Delinquency`] with the provided ID does not exist.
    #[display("`Delinquency(id: {_0})` does not exist")]
    DelinquencyNotExists(#[error(not(source))] delinquency::Id),

    /// [`Case`] cannot be filed.
    #[display("`Case` cannot be filed: {_0}")]
    #[from]
    Filing(delinquency::FilingError),

    /// Charged amount is not positive, or is in a foreign currency.
    #[display("`{_0}` is not a valid charged amount")]
    InvalidAmountCharged(#[error(not(source))] Money),

    /// [`Initiator`] is neither a service provider, nor a legal officer.
    #[display("`{_0}` cannot file cases")]
    NotAuthorized(#[error(not(source))] Role),

    /// [`Plot`] with the provided ID does not exist.
    #[display("`Plot(id: {_0})` does not exist")]
    PlotNotExists(#[error(not(source))] plot::Id),

    /// [`Plot`] cannot be put on hold.
    #[display("`Plot` cannot be put on hold: {_0}")]
    #[from]
    PlotTransition(plot::TransitionError),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        use delinquency::FilingError as F;

        match self {
            Self::Db(e) => e.kind(),
            Self::DelinquencyNotExists(_) | Self::PlotNotExists(_) => {
                ErrorKind::NotFound
            }
            Self::Filing(F::AlreadyFiled(_)) | Self::PlotTransition(_) => {
                ErrorKind::Conflict
            }
            Self::Filing(F::GracePeriodNotEnded(_))
            | Self::InvalidAmountCharged(_) => ErrorKind::InvalidInput,
            Self::NotAuthorized(_) => ErrorKind::NotAuthorized,
        }
    }
}

#[cfg(test)]
pub(crate) mod spec {
    use std::time::Duration;

    use common::{Currency, Money};

    use crate::{
        command::spec::{insert, owner, reserved_plot, stored_plot},
        domain::{
            delinquency, initiator::Role, installment::spec::pkr, plot,
            service_provider, Initiator,
        },
        error::{Classify as _, ErrorKind},
        spec::service,
    };

    use super::{Command as _, ExecutionError, FileCase};

    /// Creates a [`FileCase`] [`Command`] upon the provided [`Delinquency`]
    /// initiated by a legal officer.
    ///
    /// [`Delinquency`]: crate::domain::Delinquency
    pub(crate) fn file_case(delinquency_id: delinquency::Id) -> FileCase {
        FileCase {
            delinquency_id,
            court_date: None,
            charge_code: delinquency::ChargeCode::new("PPC-489F"),
            amount_charged: Some(pkr("5000")),
            description: None,
            initiator: Initiator::staff(Role::Legal),
        }
    }

    #[tokio::test]
    async fn files_case_and_holds_plot() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let d = delinquency::spec::delinquency(p.id, None);
        insert(svc.database(), d.clone()).await;
        let provider = service_provider::Id::new();

        let filed = svc
            .execute(FileCase {
                description: delinquency::Description::new("Escalated"),
                initiator: Initiator::service_provider(provider),
                ..file_case(d.id)
            })
            .await
            .unwrap();

        assert_eq!(filed.status, delinquency::Status::Filed);
        let case = filed.case.unwrap();
        assert!(case.id.as_ref().starts_with("CASE-"));
        assert_eq!(case.filed_by, Some(provider));
        assert_eq!(case.amount_charged, Some(pkr("5000")));
        assert_eq!(filed.description.unwrap().as_ref(), "Escalated");
        assert_eq!(
            stored_plot(svc.database(), p.id).await.status,
            plot::Status::OnHold,
        );
    }

    #[tokio::test]
    async fn refiling_conflicts() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let d = delinquency::spec::delinquency(p.id, None);
        insert(svc.database(), d.clone()).await;
        _ = svc.execute(file_case(d.id)).await.unwrap();

        let err = svc.execute(file_case(d.id)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Filing(_)));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn waits_for_grace_period() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let d = delinquency::spec::delinquency(
            p.id,
            Some(Duration::from_secs(86_400)),
        );
        insert(svc.database(), d.clone()).await;

        let err = svc.execute(file_case(d.id)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            stored_plot(svc.database(), p.id).await.status,
            plot::Status::Reserved,
        );
    }

    #[tokio::test]
    async fn rejects_foreign_charge() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let d = delinquency::spec::delinquency(p.id, None);
        insert(svc.database(), d.clone()).await;

        let err = svc
            .execute(FileCase {
                amount_charged: Some(Money {
                    amount: 5.into(),
                    currency: Currency::Usd,
                }),
                ..file_case(d.id)
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidAmountCharged(_),
        ));
    }

    #[tokio::test]
    async fn only_providers_and_legal_file() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let d = delinquency::spec::delinquency(p.id, None);
        insert(svc.database(), d.clone()).await;

        for initiator in [owner(&p), Initiator::staff(Role::Admin)] {
            let err = svc
                .execute(FileCase {
                    initiator,
                    ..file_case(d.id)
                })
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        }

        let err = svc
            .execute(file_case(delinquency::Id::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
