//! [`Command`] for resolving a legal case filed upon a [`Delinquency`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{delinquency, plot, Delinquency, Plot},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for moving a [`Delinquency`] according to the outcome of its
/// legal case.
///
/// A resolved or closed case releases the on-hold [`Plot`]: as sold, or back
/// on sale without its purchaser.
#[derive(Clone, Copy, Debug)]
pub struct ResolveCase {
    /// ID of the [`Delinquency`] to resolve.
    pub delinquency_id: delinquency::Id,

    /// [`delinquency::Outcome`] of the case.
    pub outcome: delinquency::Outcome,
}

impl<Db> Command<ResolveCase> for Service<Db>
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
        fields(delinquency.id = %cmd.delinquency_id, outcome = %cmd.outcome),
    )]
    async fn execute(&self, cmd: ResolveCase) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ResolveCase {
            delinquency_id,
            outcome,
        } = cmd;

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
        let release = delinquency
            .resolve(outcome)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(delinquency.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if let Some(status) = release {
            let mut plot = tx
                .execute(Select(By::<Option<Plot>, _>::new(plot_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::PlotNotExists(plot_id))
                .map_err(tracerr::wrap!())?;
            // Only a `Plot` suspended by the case is released by it.
            if plot.status == plot::Status::OnHold {
                plot.transition(status)
                    .map_err(tracerr::from_and_wrap!(=> E))?;
                if status == plot::Status::Available {
                    plot.purchaser_id = None;
                    plot.reserved_at = None;
                }
                tx.execute(Update(plot))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(delinquency)
    }
}

/// Error of [`ResolveCase`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Delinquency`] with the provided ID does not exist.
    #[display("`Delinquency(id: {_0})` does not exist")]
    DelinquencyNotExists(#[error(not(source))] delinquency::Id),

    /// [`Delinquency`] is not active anymore.
    #[display("`Delinquency` cannot be resolved: {_0}")]
    #[from]
    Inactive(delinquency::InactiveError),

    /// [`Plot`] with the provided ID does not exist.
    #[display("`Plot(id: {_0})` does not exist")]
    PlotNotExists(#[error(not(source))] plot::Id),

    /// [`Plot`] cannot be released.
    #[display("`Plot` cannot be released: {_0}")]
    #[from]
    PlotTransition(plot::TransitionError),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::DelinquencyNotExists(_) | Self::PlotNotExists(_) => {
                ErrorKind::NotFound
            }
            Self::Inactive(_) | Self::PlotTransition(_) => ErrorKind::Conflict,
        }
    }
}
