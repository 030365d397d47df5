//! [`Command`] for marking past due [`Installment`]s as overdue.

use std::collections::BTreeSet;

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{installment, plot, Installment, Plot},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    read::installment::PastDue,
    Service,
};

use super::Command;

/// [`Command`] for marking unpaid [`Installment`]s, whose due date has passed
/// by the provided moment, as [`installment::Status::Overdue`].
///
/// Returns the marked [`Installment`]s. Repeated execution with the same
/// moment marks nothing.
#[derive(Clone, Copy, Debug)]
pub struct MarkOverdueInstallments {
    /// Moment to compare due dates against.
    pub now: installment::DueDateTime,
}

impl<Db> Command<MarkOverdueInstallments> for Service<Db>
where
    Db: Database<
            Select<By<Vec<Installment>, PastDue>>,
            Ok = Vec<Installment>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Vec<Installment>, plot::Id>>,
            Ok = Vec<Installment>,
            Err = Traced<database::Error>,
        > + Database<Update<Installment>, Err = Traced<database::Error>>
        + Database<Lock<By<Plot, plot::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Vec<Installment>;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(skip_all, fields(now = %cmd.now.to_rfc3339()))]
    async fn execute(
        &self,
        cmd: MarkOverdueInstallments,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkOverdueInstallments { now } = cmd;

        let past_due = self
            .database()
            .execute(Select(By::<Vec<Installment>, _>::new(PastDue(now))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if past_due.is_empty() {
            return Ok(vec![]);
        }
        // Ordered to lock `Plot`s consistently with concurrent sweeps.
        let plot_ids = past_due
            .into_iter()
            .map(|i| i.plot_id)
            .collect::<BTreeSet<_>>();

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut marked = vec![];
        for plot_id in plot_ids {
            // Avoid racing with payments upon the same `Plot`.
            tx.execute(Lock(By::new(plot_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            let installments = tx
                .execute(Select(By::<Vec<Installment>, _>::new(plot_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            for mut i in installments {
                if !i.mark_overdue(now) {
                    continue;
                }
                tx.execute(Update(i.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                marked.push(i);
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(marked)
    }
}

/// Error of [`MarkOverdueInstallments`] [`Command`] execution.
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

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Select},
        DateTime,
    };

    use crate::{
        command::spec::{insert, reserved_plot},
        domain::{
            installment::{self, spec::pkr},
            Installment,
        },
        infra::Database as _,
        spec::service,
    };

    use super::{Command as _, MarkOverdueInstallments};

    #[tokio::test]
    async fn marks_past_due_once() {
        let svc = service();
        let p = reserved_plot(svc.database(), "100000").await;
        let yesterday = (DateTime::now() - Duration::from_secs(86_400)).coerce();

        let mut pending = installment::spec::installment(p.id, 1, "10000");
        pending.due_at = yesterday;
        let mut partial = installment::spec::installment(p.id, 2, "10000");
        partial.due_at = yesterday;
        partial
            .apply_payment(pkr("100"), None, DateTime::now().coerce())
            .unwrap();
        let mut paid = installment::spec::installment(p.id, 3, "10000");
        paid.due_at = yesterday;
        paid.apply_payment(pkr("10000"), None, DateTime::now().coerce())
            .unwrap();
        let upcoming = installment::spec::installment(p.id, 4, "10000");
        for i in [&pending, &partial, &paid, &upcoming] {
            insert(svc.database(), i.clone()).await;
        }

        let now = DateTime::now().coerce();
        let marked = svc
            .execute(MarkOverdueInstallments { now })
            .await
            .unwrap();

        let mut ids = marked.iter().map(|i| i.id).collect::<Vec<_>>();
        ids.sort_by_key(ToString::to_string);
        let mut expected = vec![pending.id, partial.id];
        expected.sort_by_key(ToString::to_string);
        assert_eq!(ids, expected);
        assert!(marked
            .iter()
            .all(|i| i.status == installment::Status::Overdue));

        let stored = svc
            .database()
            .execute(Select(By::<Vec<Installment>, _>::new(p.id)))
            .await
            .unwrap();
        assert_eq!(
            stored.iter().map(|i| i.status).collect::<Vec<_>>(),
            [
                installment::Status::Overdue,
                installment::Status::Overdue,
                installment::Status::Paid,
                installment::Status::Pending,
            ],
        );

        let again = svc
            .execute(MarkOverdueInstallments { now })
            .await
            .unwrap();
        assert!(again.is_empty());
    }
}
