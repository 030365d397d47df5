//! [`Command`] for applying a payment to an [`Installment`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{document, installment, plot, Initiator, Installment, Plot},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    read::Schedule,
    Service,
};

use super::{
    issue_milestone_documents::{self, Issuance, Issuer},
    Command,
};

/// [`Command`] for applying a payment to an [`Installment`], issuing the
/// milestone [`Document`]s the payment makes reached.
///
/// [`Document`]: crate::domain::Document
#[derive(Clone, Debug)]
pub struct ApplyPayment {
    /// ID of the [`Installment`] to apply the payment to.
    pub installment_id: installment::Id,

    /// Paid amount.
    pub amount: Money,

    /// Reference of the payment proof, if provided.
    pub proof: Option<document::Reference>,

    /// [`Initiator`] of the payment.
    pub initiator: Initiator,
}

/// Result of [`ApplyPayment`] [`Command`] execution.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Output {
    /// Updated [`Installment`].
    pub installment: Installment,

    /// [`Schedule`] projection of the updated [`Installment`].
    pub schedule: Schedule,

    /// Reference of the receipt issued for the payment.
    pub receipt: document::Reference,

    /// Milestone [`Issuance`] caused by the payment.
    pub milestones: Issuance,
}

impl<Db> Command<ApplyPayment> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Installment>, installment::Id>>,
            Ok = Option<Installment>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Issuer
        + Database<
            Select<By<Option<Installment>, installment::Id>>,
            Ok = Option<Installment>,
            Err = Traced<database::Error>,
        > + Database<Update<Installment>, Err = Traced<database::Error>>
        + Database<Lock<By<Plot, plot::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(
        skip_all,
        fields(
            installment.id = %cmd.installment_id,
            amount = %cmd.amount,
            initiator.role = %cmd.initiator.role,
        ),
    )]
    async fn execute(&self, cmd: ApplyPayment) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ApplyPayment {
            installment_id,
            amount,
            proof,
            initiator,
        } = cmd;

        let plot_id = self
            .database()
            .execute(Select(By::<Option<Installment>, _>::new(installment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::InstallmentNotExists(installment_id))
            .map_err(tracerr::wrap!())?
            .plot_id;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize payments upon the same `Plot`.
        tx.execute(Lock(By::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut installment = tx
            .execute(Select(By::<Option<Installment>, _>::new(installment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::InstallmentNotExists(installment_id))
            .map_err(tracerr::wrap!())?;
        let plot = tx
            .execute(Select(By::<Option<Plot>, _>::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PlotNotExists(plot_id))
            .map_err(tracerr::wrap!())?;

        if !initiator.is_purchaser_of(&plot) {
            return Err(tracerr::new!(E::NotPurchaser(plot_id)));
        }

        installment
            .apply_payment(amount, proof, DateTime::now().coerce())
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let receipt = installment
            .receipt
            .clone()
            .ok_or(E::ReceiptNotIssued(installment_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Update(installment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let milestones = issue_milestone_documents::issue(&tx, plot_id)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(Output {
            schedule: Schedule::from(&installment),
            installment,
            receipt,
            milestones,
        })
    }
}

/// Error of [`ApplyPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Installment`] with the provided ID does not exist.
    #[display("`Installment(id: {_0})` does not exist")]
    InstallmentNotExists(#[error(not(source))] installment::Id),

    /// Payment cannot be applied.
    #[display("Invalid payment: {_0}")]
    #[from]
    InvalidPayment(installment::PaymentError),

    /// [`Initiator`] is not the purchaser of the [`Plot`].
    #[display("`Initiator` is not the purchaser of `Plot(id: {_0})`")]
    NotPurchaser(#[error(not(source))] plot::Id),

    /// [`Plot`] with the provided ID does not exist.
    #[display("`Plot(id: {_0})` does not exist")]
    PlotNotExists(#[error(not(source))] plot::Id),

    /// Receipt was not issued for the applied payment.
    #[display("`Installment(id: {_0})` has no receipt issued")]
    ReceiptNotIssued(#[error(not(source))] installment::Id),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::InstallmentNotExists(_) | Self::PlotNotExists(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidPayment(_) => ErrorKind::InvalidInput,
            Self::NotPurchaser(_) => ErrorKind::NotAuthorized,
            Self::ReceiptNotIssued(_) => ErrorKind::Internal,
        }
    }
}
