//! [`Command`] definition.

pub mod apply_payment;
pub mod approve_milestone_document;
pub mod create_payment_schedule;
pub mod create_plot;
pub mod file_case;
pub mod generate_milestone_document;
pub mod issue_milestone_documents;
pub mod mark_overdue_installments;
pub mod record_failed_payment;
pub mod record_milestone_reached;
pub mod reserve_plot;
pub mod resolve_case;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    apply_payment::ApplyPayment,
    approve_milestone_document::ApproveMilestoneDocument,
    create_payment_schedule::CreatePaymentSchedule, create_plot::CreatePlot,
    file_case::FileCase,
    generate_milestone_document::GenerateMilestoneDocument,
    issue_milestone_documents::IssueMilestoneDocuments,
    mark_overdue_installments::MarkOverdueInstallments,
    record_failed_payment::RecordFailedPayment,
    record_milestone_reached::RecordMilestoneReached,
    reserve_plot::ReservePlot, resolve_case::ResolveCase,
};

#[cfg(test)]
pub(crate) mod spec {
    //! Fixtures for [`Command`]s testing.

    use common::{
        operations::{By, Insert, Select},
        DateTime,
    };
    use tracerr::Traced;

    use crate::{
        domain::{plot, purchaser, Initiator, Plot},
        infra::{database, Database, Memory},
    };

    #[cfg(doc)]
    use super::Command;

    /// Inserts the provided row into the [`Memory`] database.
    pub(crate) async fn insert<T>(db: &Memory, row: T)
    where
        Memory: Database<Insert<T>, Ok = (), Err = Traced<database::Error>>,
    {
        db.execute(Insert(row)).await.unwrap();
    }

    /// Inserts a new [`Plot`] reserved by a random purchaser, along with its
    /// empty [`plot::Details`].
    pub(crate) async fn reserved_plot(db: &Memory, total_value: &str) -> Plot {
        let mut plot = plot::spec::plot(total_value);
        plot.status = plot::Status::Reserved;
        plot.purchaser_id = Some(purchaser::Id::new());
        plot.reserved_at = Some(DateTime::now().coerce());
        insert(db, plot.clone()).await;
        insert(db, plot::Details::new(plot.id, DateTime::now().coerce())).await;
        plot
    }

    /// Returns the [`Initiator`] acting as the purchaser of the provided
    /// [`Plot`].
    pub(crate) fn owner(plot: &Plot) -> Initiator {
        Initiator::purchaser(plot.purchaser_id.unwrap())
    }

    /// Selects the current state of the [`Plot`] with the provided ID.
    pub(crate) async fn stored_plot(db: &Memory, id: plot::Id) -> Plot {
        db.execute(Select(By::<Option<Plot>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
    }

    /// Selects the current [`plot::Details`] of the provided [`Plot`].
    pub(crate) async fn stored_details(db: &Memory, id: plot::Id) -> plot::Details {
        db.execute(Select(By::<Option<plot::Details>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
    }
}
