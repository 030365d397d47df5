//! [`Command`] for attaching a generated file to a milestone [`Document`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        document, milestone::DocumentKind, plot, Document, Initiator,
        Milestone, Plot,
    },
    error::{Classify, ErrorKind},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for attaching a generated file to a recorded milestone
/// [`Document`] of a [`Plot`].
///
/// Generating the clearance certificate marks the [`Plot`] as sold.
#[derive(Clone, Debug)]
pub struct GenerateMilestoneDocument {
    /// ID of the [`Plot`] the [`Document`] is issued for.
    pub plot_id: plot::Id,

    /// Payment completion percentage of the [`Milestone`].
    pub percentage: u8,

    /// [`DocumentKind`] of the [`Milestone`].
    pub document: DocumentKind,

    /// [`document::Reference`] of the generated file.
    pub reference: document::Reference,

    /// [`Initiator`] of the generation.
    pub initiator: Initiator,
}

impl<Db> Command<GenerateMilestoneDocument> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Plot>, plot::Id>>,
            Ok = Option<Plot>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Document>, read::document::OfMilestone>>,
            Ok = Option<Document>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<plot::Details>, plot::Id>>,
            Ok = Option<plot::Details>,
            Err = Traced<database::Error>,
        > + Database<Update<Document>, Err = Traced<database::Error>>
        + Database<Update<plot::Details>, Err = Traced<database::Error>>
        + Database<Update<Plot>, Err = Traced<database::Error>>
        + Database<Lock<By<Plot, plot::Id>>, Err = Traced<database::Error>>
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
            initiator.role = %cmd.initiator.role,
        ),
    )]
    async fn execute(
        &self,
        cmd: GenerateMilestoneDocument,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let GenerateMilestoneDocument {
            plot_id,
            percentage,
            document,
            reference,
            initiator,
        } = cmd;

        let milestone = Milestone::recorded(percentage, document)
            .ok_or(E::UnknownThreshold(percentage))
            .map_err(tracerr::wrap!())?;

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

        let mut plot = tx
            .execute(Select(By::<Option<Plot>, _>::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PlotNotExists(plot_id))
            .map_err(tracerr::wrap!())?;
        if !initiator.is_service_provider_of(&plot) && !initiator.is_admin() {
            return Err(tracerr::new!(E::NotAuthorized(plot_id)));
        }

        let mut doc = tx
            .execute(Select(By::<Option<Document>, _>::new(
                read::document::OfMilestone { plot_id, milestone },
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DocumentNotRecorded(milestone))
            .map_err(tracerr::wrap!())?;
        doc.generate(reference.clone(), DateTime::now().coerce())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let sells = milestone.document == DocumentKind::Clearance
            && plot.status != plot::Status::Sold;
        if sells {
            plot.transition(plot::Status::Sold)
                .map_err(tracerr::from_and_wrap!(=> E))?;
        }

        let mut details = tx
            .execute(Select(By::<Option<plot::Details>, _>::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .unwrap_or_else(|| {
                plot::Details::new(plot_id, DateTime::now().coerce())
            });
        *details.reference_mut(milestone.document) = Some(reference);

        tx.execute(Update(doc.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Update(details))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        if sells {
            tx.execute(Update(plot))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(doc)
    }
}

/// Error of [`GenerateMilestoneDocument`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Document`] cannot be generated.
    #[display("`Document` cannot be generated: {_0}")]
    #[from]
    DocumentTransition(document::TransitionError),

    /// [`Document`] of the [`Milestone`] is not recorded.
    #[display("`{}` document is not recorded", _0.document)]
    DocumentNotRecorded(#[error(not(source))] Milestone),

    /// [`Initiator`] is neither the service provider of the [`Plot`], nor an
    /// administrator.
    #[display("`Initiator` cannot generate documents of `Plot(id: {_0})`")]
    NotAuthorized(#[error(not(source))] plot::Id),

    /// [`Plot`] cannot be marked as sold.
    #[display("`Plot` cannot be sold: {_0}")]
    #[from]
    PlotTransition(plot::TransitionError),

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
            Self::DocumentTransition(_) | Self::PlotTransition(_) => {
                ErrorKind::Conflict
            }
            Self::DocumentNotRecorded(_) | Self::PlotNotExists(_) => {
                ErrorKind::NotFound
            }
            Self::NotAuthorized(_) => ErrorKind::NotAuthorized,
            Self::UnknownThreshold(_) => ErrorKind::InvalidInput,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            spec::{insert, owner, reserved_plot, stored_details, stored_plot},
            RecordMilestoneReached,
        },
        domain::{
            document, initiator::Role, installment::spec::pkr,
            milestone::DocumentKind, plot, service_provider, Initiator, Plot,
        },
        error::{Classify as _, ErrorKind},
        infra::Memory,
        spec::service,
        Service,
    };

    use super::{Command as _, GenerateMilestoneDocument};

    async fn provided_plot(
        svc: &Service<Memory>,
    ) -> (Plot, service_provider::Id) {
        let provider = service_provider::Id::new();
        let mut p = reserved_plot(svc.database(), "100000").await;
        p.service_provider_id = Some(provider);
        insert(svc.database(), p.clone()).await;
        (p, provider)
    }

    async fn record(
        svc: &Service<Memory>,
        plot: &Plot,
        percentage: u8,
        document: DocumentKind,
    ) {
        _ = svc
            .execute(RecordMilestoneReached {
                plot_id: plot.id,
                percentage,
                document,
                amount_paid: pkr("0"),
            })
            .await
            .unwrap();
    }

    fn generate(
        plot: &Plot,
        percentage: u8,
        document: DocumentKind,
        initiator: Initiator,
    ) -> GenerateMilestoneDocument {
        GenerateMilestoneDocument {
            plot_id: plot.id,
            percentage,
            document,
            reference: document::Reference::generate(document),
            initiator,
        }
    }

    #[tokio::test]
    async fn provider_generates_recorded_document() {
        let svc = service();
        let (p, provider) = provided_plot(&svc).await;
        record(&svc, &p, 50, DocumentKind::Allocation).await;

        let cmd = generate(
            &p,
            50,
            DocumentKind::Allocation,
            Initiator::service_provider(provider),
        );
        let reference = cmd.reference.clone();
        let doc = svc.execute(cmd).await.unwrap();

        assert_eq!(doc.status, document::Status::Generated);
        assert_eq!(doc.reference.as_ref(), Some(&reference));
        assert_eq!(
            stored_details(svc.database(), p.id).await.allocation,
            Some(reference),
        );

        let err = svc
            .execute(generate(
                &p,
                50,
                DocumentKind::Allocation,
                Initiator::staff(Role::Admin),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn clearance_sells_plot() {
        let svc = service();
        let (p, _) = provided_plot(&svc).await;
        record(&svc, &p, 100, DocumentKind::Clearance).await;

        _ = svc
            .execute(generate(
                &p,
                100,
                DocumentKind::Clearance,
                Initiator::staff(Role::Admin),
            ))
            .await
            .unwrap();

        assert_eq!(
            stored_plot(svc.database(), p.id).await.status,
            plot::Status::Sold,
        );
    }

    #[tokio::test]
    async fn others_cannot_generate() {
        let svc = service();
        let (p, _) = provided_plot(&svc).await;
        record(&svc, &p, 10, DocumentKind::Allotment).await;

        for initiator in [
            owner(&p),
            Initiator::service_provider(service_provider::Id::new()),
            Initiator::staff(Role::Legal),
        ] {
            let err = svc
                .execute(generate(&p, 10, DocumentKind::Allotment, initiator))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        }
        assert!(stored_details(svc.database(), p.id).await.allotment.is_none());
    }

    #[tokio::test]
    async fn requires_recorded_document() {
        let svc = service();
        let (p, provider) = provided_plot(&svc).await;

        let err = svc
            .execute(generate(
                &p,
                75,
                DocumentKind::Possession,
                Initiator::service_provider(provider),
            ))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
