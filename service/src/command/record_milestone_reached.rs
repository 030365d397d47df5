//! [`Command`] for recording a reached [`Milestone`] of a [`Plot`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{milestone::DocumentKind, plot, Document, Milestone, Plot},
    error::{Classify, ErrorKind},
    infra::{database, database::constraint, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for recording a reached [`Milestone`] of a [`Plot`] as a
/// [`Document`] awaiting generation.
///
/// Recording an already recorded [`Milestone`] returns the existing
/// [`Document`].
#[derive(Clone, Copy, Debug)]
pub struct RecordMilestoneReached {
    /// ID of the [`Plot`] which reached the [`Milestone`].
    pub plot_id: plot::Id,

    /// Payment completion percentage of the [`Milestone`].
    pub percentage: u8,

    /// [`DocumentKind`] of the [`Milestone`].
    pub document: DocumentKind,

    /// Total amount paid for the [`Plot`] when the [`Milestone`] was reached.
    pub amount_paid: Money,
}

impl<Db> Command<RecordMilestoneReached> for Service<Db>
where
    Db: Database<
            Select<By<Option<Plot>, plot::Id>>,
            Ok = Option<Plot>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Document>, read::document::OfMilestone>>,
            Ok = Option<Document>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Document>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Document;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(
        skip_all,
        fields(
            plot.id = %cmd.plot_id,
            milestone.percentage = cmd.percentage,
            milestone.document = %cmd.document,
        ),
    )]
    async fn execute(
        &self,
        cmd: RecordMilestoneReached,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordMilestoneReached {
            plot_id,
            percentage,
            document,
            amount_paid,
        } = cmd;

        let milestone = Milestone::recorded(percentage, document)
            .ok_or(E::UnknownThreshold(percentage))
            .map_err(tracerr::wrap!())?;

        self.database()
            .execute(Select(By::<Option<Plot>, _>::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PlotNotExists(plot_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let of_milestone = read::document::OfMilestone { plot_id, milestone };
        let existing = self
            .database()
            .execute(Select(By::<Option<Document>, _>::new(of_milestone)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(doc) = existing {
            return Ok(doc);
        }

        let doc = Document::ready(plot_id, milestone, amount_paid);

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let inserted = tx.execute(Insert(doc.clone())).await;
        if let Err(e) = &inserted {
            if e.as_ref()
                .is_unique_violation(Some(constraint::MILESTONE_DOCUMENT))
            {
                // Concurrent recording has won, so return its result.
                return self
                    .database()
                    .execute(Select(By::<Option<Document>, _>::new(
                        of_milestone,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::PlotNotExists(plot_id))
                    .map_err(tracerr::wrap!());
            }
        }
        inserted
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(doc)
    }
}

/// Error of [`RecordMilestoneReached`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Plot`] with the provided ID does not exist.
    #[display("`Plot(id: {_0})` does not exist")]
    PlotNotExists(#[error(not(source))] plot::Id),

    /// Provided percentage is not a [`Milestone`] threshold.
    #[display("{_0}% is not a milestone threshold")]
    UnknownThreshold(#[error(not(source))] u8),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::PlotNotExists(_) => ErrorKind::NotFound,
            Self::UnknownThreshold(_) => ErrorKind::InvalidInput,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::spec::reserved_plot,
        domain::{
            document, installment::spec::pkr, milestone::DocumentKind, plot,
            Document,
        },
        error::{Classify as _, ErrorKind},
        infra::Database as _,
        spec::service,
    };

    use super::{Command as _, ExecutionError, RecordMilestoneReached};

    #[tokio::test]
    async fn records_once() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let cmd = RecordMilestoneReached {
            plot_id: p.id,
            percentage: 50,
            document: DocumentKind::Allocation,
            amount_paid: pkr("50000"),
        };

        let first = svc.execute(cmd).await.unwrap();
        let second = svc.execute(cmd).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.status, document::Status::Ready);
        assert_eq!(first.kind(), DocumentKind::Allocation);
        assert_eq!(first.amount_paid, pkr("50000"));
        let docs = svc
            .database()
            .execute(Select(By::<Vec<Document>, _>::new(p.id)))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn rejects_unknown_thresholds() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;

        for percentage in [0, 25, 60, 101] {
            let err = svc
                .execute(RecordMilestoneReached {
                    plot_id: p.id,
                    percentage,
                    document: DocumentKind::Allocation,
                    amount_paid: pkr("0"),
                })
                .await
                .unwrap_err();
            assert!(matches!(
                err.as_ref(),
                ExecutionError::UnknownThreshold(x) if *x == percentage,
            ));
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[tokio::test]
    async fn records_unpaired_threshold_and_kind() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let cmd = RecordMilestoneReached {
            plot_id: p.id,
            percentage: 50,
            document: DocumentKind::Clearance,
            amount_paid: pkr("50000"),
        };

        let first = svc.execute(cmd).await.unwrap();
        let second = svc.execute(cmd).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.kind(), DocumentKind::Clearance);
        assert_eq!(u8::from(first.milestone.threshold), 50);
        assert_eq!(first.status, document::Status::Ready);
    }

    #[tokio::test]
    async fn missing_plot_is_not_found() {
        let svc = service();

        let err = svc
            .execute(RecordMilestoneReached {
                plot_id: plot::Id::new(),
                percentage: 10,
                document: DocumentKind::Allotment,
                amount_paid: pkr("0"),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
