//! [`Command`] for issuing the milestone [`Document`]s of a [`Plot`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted, Update},
    DateTime, Money, Percent,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        document,
        milestone::{DocumentKind, Threshold},
        plot, Document, Installment, Milestone, Plot,
    },
    error::{Classify, ErrorKind},
    infra::{database, Database},
    read::{self, Progress},
    Service,
};

use super::Command;

/// [`Command`] for issuing the milestone [`Document`]s of a [`Plot`] whose
/// payment progress has reached them.
///
/// Every [`Milestone`] is issued at most once per [`Plot`]: its slot in the
/// [`plot::Details`] is set once and never cleared.
#[derive(Clone, Copy, Debug)]
pub struct IssueMilestoneDocuments {
    /// ID of the [`Plot`] to issue the [`Document`]s for.
    pub plot_id: plot::Id,
}

impl<Db> Command<IssueMilestoneDocuments> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Issuer
        + Database<Lock<By<Plot, plot::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Issuance;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(skip_all, fields(plot.id = %cmd.plot_id))]
    async fn execute(
        &self,
        cmd: IssueMilestoneDocuments,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let IssueMilestoneDocuments { plot_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent issuance upon the same `Plot`.
        tx.execute(Lock(By::new(plot_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let issuance = issue(&tx, plot_id)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(issuance)
    }
}

/// Error of [`IssueMilestoneDocuments`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
        }
    }
}

/// Result of issuing milestone [`Document`]s of a [`Plot`].
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Issuance {
    /// Payment completion [`Percent`] the [`Document`]s were issued at.
    pub current_percentage: Percent,

    /// [`Milestone`]s newly reached, in ascending [`Threshold`] order.
    pub reached: Vec<Issued>,
}

impl Issuance {
    /// Indicates whether any [`Document`] was issued.
    #[must_use]
    pub fn document_issued(&self) -> bool {
        !self.reached.is_empty()
    }
}

/// [`Document`] issued once its [`Milestone`] is reached.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Issued {
    /// [`DocumentKind`] of the issued [`Document`].
    pub document: DocumentKind,

    /// [`Threshold`] of the reached [`Milestone`].
    pub threshold: Threshold,

    /// [`document::Reference`] of the issued [`Document`].
    pub reference: document::Reference,
}

/// [`Database`] capable of issuing milestone [`Document`]s.
pub trait Issuer:
    Database<
        Select<By<Option<Plot>, plot::Id>>,
        Ok = Option<Plot>,
        Err = Traced<database::Error>,
    > + Database<
        Select<By<Vec<Installment>, plot::Id>>,
        Ok = Vec<Installment>,
        Err = Traced<database::Error>,
    > + Database<
        Select<By<Option<plot::Details>, plot::Id>>,
        Ok = Option<plot::Details>,
        Err = Traced<database::Error>,
    > + Database<
        Select<By<Option<Document>, read::document::OfMilestone>>,
        Ok = Option<Document>,
        Err = Traced<database::Error>,
    > + Database<Insert<Document>, Err = Traced<database::Error>>
    + Database<Update<Document>, Err = Traced<database::Error>>
    + Database<Update<plot::Details>, Err = Traced<database::Error>>
    + Database<Update<Plot>, Err = Traced<database::Error>>
{
}

impl<T> Issuer for T where
    T: Database<
            Select<By<Option<Plot>, plot::Id>>,
            Ok = Option<Plot>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Installment>, plot::Id>>,
            Ok = Vec<Installment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<plot::Details>, plot::Id>>,
            Ok = Option<plot::Details>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Document>, read::document::OfMilestone>>,
            Ok = Option<Document>,
            Err = Traced<database::Error>,
        > + Database<Insert<Document>, Err = Traced<database::Error>>
        + Database<Update<Document>, Err = Traced<database::Error>>
        + Database<Update<plot::Details>, Err = Traced<database::Error>>
        + Database<Update<Plot>, Err = Traced<database::Error>>
{
}

/// Issues the milestone [`Document`]s of the [`Plot`] with the provided ID
/// whose [`Milestone`]s are reached by its current payment progress.
///
/// Expects to be run inside a transaction holding the [`Plot`] locked.
/// Nothing is written if no [`Milestone`] is newly reached. A missing
/// [`Plot`] or [`plot::Details`] yield an empty [`Issuance`].
pub(crate) async fn issue<Db: Issuer>(
    db: &Db,
    plot_id: plot::Id,
) -> Result<Issuance, Traced<database::Error>> {
    let Some(mut plot) = db
        .execute(Select(By::<Option<Plot>, _>::new(plot_id)))
        .await
        .map_err(tracerr::wrap!())?
    else {
        return Ok(Issuance::default());
    };

    let installments = db
        .execute(Select(By::<Vec<Installment>, _>::new(plot_id)))
        .await
        .map_err(tracerr::wrap!())?;
    let progress = Progress::compute(Some(&plot), &installments);

    let mut issuance = Issuance {
        current_percentage: progress.percentage,
        reached: vec![],
    };

    let Some(mut details) = db
        .execute(Select(By::<Option<plot::Details>, _>::new(plot_id)))
        .await
        .map_err(tracerr::wrap!())?
    else {
        return Ok(issuance);
    };

    let due = details.due_milestones(progress.percentage);
    if due.is_empty() {
        return Ok(issuance);
    }

    let paid = progress
        .paid()
        .unwrap_or(Money::zero(plot.total_value.currency));
    for milestone in due {
        let reference = issue_document(db, plot_id, milestone, paid).await?;
        *details.reference_mut(milestone.document) = Some(reference.clone());
        issuance.reached.push(Issued {
            document: milestone.document,
            threshold: milestone.threshold,
            reference,
        });
    }

    let cleared = issuance
        .reached
        .iter()
        .any(|i| i.document == DocumentKind::Clearance);
    if cleared && plot.status != plot::Status::Sold {
        match plot.transition(plot::Status::Sold) {
            Ok(()) => {
                db.execute(Update(plot))
                    .await
                    .map_err(tracerr::wrap!())
                    .map(drop)?;
            }
            Err(e) => {
                log::warn!("`Plot(id: {plot_id})` is not marked as sold: {e}");
            }
        }
    }

    db.execute(Update(details))
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;

    log::info!(
        "`Plot(id: {plot_id})` reached {} at {}%",
        issuance
            .reached
            .iter()
            .map(|i| i.document.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        issuance.current_percentage,
    );

    Ok(issuance)
}

/// Moves the [`Document`] of the provided [`Milestone`] into the
/// [`document::Status::Generated`], creating it if absent.
///
/// Returns the [`document::Reference`] the [`Document`] is generated with. An
/// already generated [`Document`] keeps its [`document::Reference`].
async fn issue_document<Db: Issuer>(
    db: &Db,
    plot_id: plot::Id,
    milestone: Milestone,
    paid: Money,
) -> Result<document::Reference, Traced<database::Error>> {
    let existing = db
        .execute(Select(By::<Option<Document>, _>::new(
            read::document::OfMilestone { plot_id, milestone },
        )))
        .await
        .map_err(tracerr::wrap!())?;

    if let Some(reference) =
        existing.as_ref().and_then(|d| d.reference.clone())
    {
        return Ok(reference);
    }

    let reference = document::Reference::generate(milestone.document);
    let (mut doc, is_new) = match existing {
        Some(doc) => (doc, false),
        None => (Document::ready(plot_id, milestone, paid), true),
    };
    if doc
        .generate(reference.clone(), DateTime::now().coerce())
        .is_err()
    {
        // Only a `Ready` `Document` has no reference.
        return Ok(reference);
    }

    if is_new {
        db.execute(Insert(doc))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;
    } else {
        db.execute(Update(doc))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;
    }

    Ok(reference)
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        DateTime, Percent,
    };

    use crate::{
        command::spec::{insert, reserved_plot, stored_details, stored_plot},
        domain::{
            document, installment, milestone::DocumentKind, plot, Document,
            Milestone,
        },
        infra::{Database as _, Memory},
        read,
        spec::service,
    };

    use super::{Command as _, IssueMilestoneDocuments};

    async fn paid_installment(
        db: &Memory,
        plot_id: plot::Id,
        number: u16,
        amount: &str,
    ) {
        let mut inst = installment::spec::installment(plot_id, number, amount);
        inst.apply_payment(
            installment::spec::pkr(amount),
            None,
            DateTime::now().coerce(),
        )
        .unwrap();
        insert(db, inst).await;
    }

    #[tokio::test]
    async fn issues_reached_milestones_once() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        paid_installment(svc.database(), p.id, 1, "55000").await;

        let first = svc
            .execute(IssueMilestoneDocuments { plot_id: p.id })
            .await
            .unwrap();
        assert_eq!(first.current_percentage, Percent::from(55));
        assert!(first.document_issued());
        assert_eq!(
            first.reached.iter().map(|i| i.document).collect::<Vec<_>>(),
            [DocumentKind::Allotment, DocumentKind::Allocation],
        );

        let second = svc
            .execute(IssueMilestoneDocuments { plot_id: p.id })
            .await
            .unwrap();
        assert_eq!(second.current_percentage, Percent::from(55));
        assert!(!second.document_issued());

        let details = stored_details(svc.database(), p.id).await;
        assert_eq!(
            details.allotment.as_ref(),
            Some(&first.reached[0].reference),
        );
        assert_eq!(
            details.allocation.as_ref(),
            Some(&first.reached[1].reference),
        );
        assert!(details.possession.is_none());
        assert_eq!(
            stored_plot(svc.database(), p.id).await.status,
            plot::Status::Reserved,
        );
    }

    #[tokio::test]
    async fn generates_milestone_document_rows() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let ready = Document::ready(
            p.id,
            Milestone::of_document(DocumentKind::Allotment),
            installment::spec::pkr("0"),
        );
        insert(svc.database(), ready.clone()).await;
        paid_installment(svc.database(), p.id, 1, "10000").await;

        let issuance = svc
            .execute(IssueMilestoneDocuments { plot_id: p.id })
            .await
            .unwrap();

        let doc = svc
            .database()
            .execute(Select(By::<Option<Document>, _>::new(ready.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.status, document::Status::Generated);
        assert_eq!(
            doc.reference.as_ref(),
            Some(&issuance.reached[0].reference),
        );

        let docs = svc
            .database()
            .execute(Select(By::<Vec<Document>, _>::new(p.id)))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn reuses_reference_of_generated_document() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let mut doc = Document::ready(
            p.id,
            Milestone::of_document(DocumentKind::Allotment),
            installment::spec::pkr("0"),
        );
        let reference = document::Reference::generate(DocumentKind::Allotment);
        doc.generate(reference.clone(), DateTime::now().coerce())
            .unwrap();
        insert(svc.database(), doc).await;
        paid_installment(svc.database(), p.id, 1, "10000").await;

        let issuance = svc
            .execute(IssueMilestoneDocuments { plot_id: p.id })
            .await
            .unwrap();

        assert_eq!(issuance.reached[0].reference, reference);
        assert_eq!(
            stored_details(svc.database(), p.id).await.allotment,
            Some(reference),
        );
    }

    #[tokio::test]
    async fn full_payment_sells_plot() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        paid_installment(svc.database(), p.id, 1, "60000").await;
        paid_installment(svc.database(), p.id, 2, "40000").await;

        let issuance = svc
            .execute(IssueMilestoneDocuments { plot_id: p.id })
            .await
            .unwrap();

        assert_eq!(issuance.current_percentage, Percent::from(100));
        assert_eq!(issuance.reached.len(), 4);
        assert_eq!(
            issuance.reached.last().map(|i| i.document),
            Some(DocumentKind::Clearance),
        );
        assert_eq!(
            stored_plot(svc.database(), p.id).await.status,
            plot::Status::Sold,
        );

        let docs = svc
            .database()
            .execute(Select(By::<Option<Document>, _>::new(
                read::document::OfMilestone {
                    plot_id: p.id,
                    milestone: Milestone::of_document(DocumentKind::Clearance),
                },
            )))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(docs.amount_paid, installment::spec::pkr("100000"));
    }

    #[tokio::test]
    async fn missing_plot_or_details_yield_nothing() {
        let svc = service();

        let issuance = svc
            .execute(IssueMilestoneDocuments {
                plot_id: plot::Id::new(),
            })
            .await
            .unwrap();
        assert_eq!(issuance.current_percentage, Percent::ZERO);
        assert!(!issuance.document_issued());

        let mut p = plot::spec::plot("100000");
        p.status = plot::Status::Reserved;
        insert(svc.database(), p.clone()).await;
        paid_installment(svc.database(), p.id, 1, "20000").await;

        let issuance = svc
            .execute(IssueMilestoneDocuments { plot_id: p.id })
            .await
            .unwrap();
        assert_eq!(issuance.current_percentage, Percent::from(20));
        assert!(!issuance.document_issued());
    }
}
