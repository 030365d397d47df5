//! [`Command`] for reserving a [`Plot`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{initiator::Role, plot, Initiator, Plot},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for reserving an available [`Plot`] by a purchaser.
///
/// Creates the [`plot::Details`] of the [`Plot`] to track its milestone
/// documents.
#[derive(Clone, Copy, Debug)]
pub struct ReservePlot {
    /// ID of the [`Plot`] to reserve.
    pub plot_id: plot::Id,

    /// [`Initiator`] reserving the [`Plot`].
    pub initiator: Initiator,
}

impl<Db> Command<ReservePlot> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Plot>, plot::Id>>,
            Ok = Option<Plot>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<plot::Details>, plot::Id>>,
            Ok = Option<plot::Details>,
            Err = Traced<database::Error>,
        > + Database<Update<Plot>, Err = Traced<database::Error>>
        + Database<Insert<plot::Details>, Err = Traced<database::Error>>
        + Database<Lock<By<Plot, plot::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Plot;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(
        skip_all,
        fields(plot.id = %cmd.plot_id, initiator.role = %cmd.initiator.role),
    )]
    async fn execute(&self, cmd: ReservePlot) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReservePlot { plot_id, initiator } = cmd;

        let purchaser_id = initiator
            .purchaser_id
            .filter(|_| initiator.role == Role::Purchaser)
            .ok_or(E::NotPurchaser)
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent reservations of the same `Plot`.
        tx.execute(Lock(By::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut plot = tx
            .execute(Select(By::<Option<Plot>, _>::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PlotNotExists(plot_id))
            .map_err(tracerr::wrap!())?;
        if plot.status != plot::Status::Available {
            return Err(tracerr::new!(E::PlotNotAvailable(plot.status)));
        }

        let now = DateTime::now();
        plot.transition(plot::Status::Reserved)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        plot.purchaser_id = Some(purchaser_id);
        plot.reserved_at = Some(now.coerce());
        tx.execute(Update(plot.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let details = tx
            .execute(Select(By::<Option<plot::Details>, _>::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if details.is_none() {
            tx.execute(Insert(plot::Details::new(plot_id, now.coerce())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(plot)
    }
}

/// Error of [`ReservePlot`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Initiator`] is not a purchaser.
    #[display("`Initiator` is not a purchaser")]
    NotPurchaser,

    /// [`Plot`] is not available for reservation.
    #[display("`Plot` is `{_0}`, not available")]
    PlotNotAvailable(#[error(not(source))] plot::Status),

    /// [`Plot`] with the provided ID does not exist.
    #[display("`Plot(id: {_0})` does not exist")]
    PlotNotExists(#[error(not(source))] plot::Id),

    /// [`Plot`] cannot be reserved.
    #[display("`Plot` cannot be reserved: {_0}")]
    #[from]
    Transition(plot::TransitionError),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::NotPurchaser => ErrorKind::NotAuthorized,
            Self::PlotNotAvailable(_) | Self::Transition(_) => {
                ErrorKind::Conflict
            }
            Self::PlotNotExists(_) => ErrorKind::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::spec::{insert, stored_details},
        domain::{
            initiator::Role, plot, purchaser, service_provider, Initiator,
        },
        error::{Classify as _, ErrorKind},
        spec::service,
    };

    use super::{Command as _, ExecutionError, ReservePlot};

    #[tokio::test]
    async fn reserves_available_plot() {
        let svc = service();
        let p = plot::spec::plot("100000");
        insert(svc.database(), p.clone()).await;
        let buyer = purchaser::Id::new();

        let plot = svc
            .execute(ReservePlot {
                plot_id: p.id,
                initiator: Initiator::purchaser(buyer),
            })
            .await
            .unwrap();

        assert_eq!(plot.status, plot::Status::Reserved);
        assert_eq!(plot.purchaser_id, Some(buyer));
        assert!(plot.reserved_at.is_some());
        let details = stored_details(svc.database(), p.id).await;
        assert!(details.allotment.is_none());
        assert!(details.clearance.is_none());
    }

    #[tokio::test]
    async fn reserved_plot_conflicts() {
        let svc = service();
        let p = plot::spec::plot("100000");
        insert(svc.database(), p.clone()).await;
        _ = svc
            .execute(ReservePlot {
                plot_id: p.id,
                initiator: Initiator::purchaser(purchaser::Id::new()),
            })
            .await
            .unwrap();

        let err = svc
            .execute(ReservePlot {
                plot_id: p.id,
                initiator: Initiator::purchaser(purchaser::Id::new()),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PlotNotAvailable(plot::Status::Reserved),
        ));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn only_purchasers_reserve() {
        let svc = service();
        let p = plot::spec::plot("100000");
        insert(svc.database(), p.clone()).await;

        for initiator in [
            Initiator::staff(Role::Admin),
            Initiator::service_provider(service_provider::Id::new()),
        ] {
            let err = svc
                .execute(ReservePlot {
                    plot_id: p.id,
                    initiator,
                })
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        }
    }

    #[tokio::test]
    async fn missing_plot_is_not_found() {
        let svc = service();

        let err = svc
            .execute(ReservePlot {
                plot_id: plot::Id::new(),
                initiator: Initiator::purchaser(purchaser::Id::new()),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
