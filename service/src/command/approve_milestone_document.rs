//! [`Command`] for approving a generated milestone [`Document`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{document, initiator::Role, plot, Document, Initiator, Plot},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for approving a generated milestone [`Document`] by the staff.
#[derive(Clone, Debug)]
pub struct ApproveMilestoneDocument {
    /// ID of the [`Document`] to approve.
    pub document_id: document::Id,

    /// [`document::Approver`] of the [`Document`].
    pub approver: document::Approver,

    /// [`document::Notes`] left on approval.
    pub notes: Option<document::Notes>,

    /// [`Initiator`] of the approval.
    pub initiator: Initiator,
}

impl<Db> Command<ApproveMilestoneDocument> for Service<Db>
where
    Db: Database<
            Select<By<Option<Document>, document::Id>>,
            Ok = Option<Document>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Document>, document::Id>>,
            Ok = Option<Document>,
            Err = Traced<database::Error>,
        > + Database<Update<Document>, Err = Traced<database::Error>>
        + Database<Lock<By<Plot, plot::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Document;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(
        skip_all,
        fields(
            document.id = %cmd.document_id,
            initiator.role = %cmd.initiator.role,
        ),
    )]
    async fn execute(
        &self,
        cmd: ApproveMilestoneDocument,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ApproveMilestoneDocument {
            document_id,
            approver,
            notes,
            initiator,
        } = cmd;

        if !matches!(initiator.role, Role::Admin | Role::Legal) {
            return Err(tracerr::new!(E::NotAuthorized(initiator.role)));
        }

        let plot_id = self
            .database()
            .execute(Select(By::<Option<Document>, _>::new(document_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DocumentNotExists(document_id))
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

        let mut doc = tx
            .execute(Select(By::<Option<Document>, _>::new(document_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DocumentNotExists(document_id))
            .map_err(tracerr::wrap!())?;
        doc.approve(approver, notes, DateTime::now().coerce())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(doc.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(doc)
    }
}

/// Error of [`ApproveMilestoneDocument`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Document`] with the provided ID does not exist.
    #[display("`Document(id: {_0})` does not exist")]
    DocumentNotExists(#[error(not(source))] document::Id),

    /// [`Document`] cannot be approved.
    #[display("`Document` cannot be approved: {_0}")]
    #[from]
    DocumentTransition(document::TransitionError),

    /// [`Initiator`] is neither an administrator, nor a legal officer.
    #[display("`{_0}` cannot approve documents")]
    NotAuthorized(#[error(not(source))] Role),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::DocumentNotExists(_) => ErrorKind::NotFound,
            Self::DocumentTransition(_) => ErrorKind::Conflict,
            Self::NotAuthorized(_) => ErrorKind::NotAuthorized,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{
        command::spec::{insert, owner, reserved_plot},
        domain::{
            document, initiator::Role, installment::spec::pkr,
            milestone::DocumentKind, plot, service_provider, Document,
            Initiator, Milestone,
        },
        error::{Classify as _, ErrorKind},
        spec::service,
    };

    use super::{ApproveMilestoneDocument, Command as _};

    fn approve(
        document_id: document::Id,
        role: Role,
    ) -> ApproveMilestoneDocument {
        ApproveMilestoneDocument {
            document_id,
            approver: document::Approver::new("Legal Desk").unwrap(),
            notes: document::Notes::new("Verified against bank statement"),
            initiator: Initiator::staff(role),
        }
    }

    fn ready(plot_id: plot::Id) -> Document {
        Document::ready(
            plot_id,
            Milestone::of_document(DocumentKind::Allotment),
            pkr("10000"),
        )
    }

    #[tokio::test]
    async fn staff_approves_generated_document() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let mut doc = ready(p.id);
        doc.generate(
            document::Reference::generate(doc.kind()),
            DateTime::now().coerce(),
        )
        .unwrap();
        insert(svc.database(), doc.clone()).await;

        let approved = svc.execute(approve(doc.id, Role::Legal)).await.unwrap();

        assert_eq!(approved.status, document::Status::Approved);
        assert_eq!(approved.approved_by.unwrap().as_ref(), "Legal Desk");
        assert!(approved.notes.is_some());
        assert!(approved.approved_at.is_some());

        let err = svc.execute(approve(doc.id, Role::Admin)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn ready_document_is_not_approvable() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let doc = ready(p.id);
        insert(svc.database(), doc.clone()).await;

        let err = svc.execute(approve(doc.id, Role::Admin)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn only_staff_approves() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let doc = ready(p.id);
        insert(svc.database(), doc.clone()).await;

        for initiator in [
            owner(&p),
            Initiator::service_provider(service_provider::Id::new()),
        ] {
            let err = svc
                .execute(ApproveMilestoneDocument {
                    initiator,
                    ..approve(doc.id, Role::Admin)
                })
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        }
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let svc = service();

        let err = svc
            .execute(approve(document::Id::new(), Role::Admin))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
