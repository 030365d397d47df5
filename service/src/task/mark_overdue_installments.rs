//! [`MarkOverdueInstallments`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{By, Perform, Start},
    DateTime,
};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracing as log;

use crate::{command, domain::Installment, Command, Service};

use super::Task;

/// Configuration for [`MarkOverdueInstallments`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between sweeps of past due [`Installment`]s.
    #[default(time::Duration::from_secs(60 * 60))]
    pub interval: time::Duration,
}

/// [`Task`] for periodically marking past due [`Installment`]s as overdue.
#[derive(Clone, Copy, Debug)]
pub struct MarkOverdueInstallments<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<MarkOverdueInstallments<Self>, Config>>> for Service<Db>
where
    MarkOverdueInstallments<Service<Db>>:
        Task<Perform<()>, Ok = Vec<Installment>, Err: Error>,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<MarkOverdueInstallments<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = MarkOverdueInstallments {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(marked) if !marked.is_empty() => {
                    log::info!(
                        "`task::MarkOverdueInstallments` marked {} \
                         `Installment`s as overdue",
                        marked.len(),
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("`task::MarkOverdueInstallments` failed: {e}");
                }
            }
        }
    }
}

impl<Db> Task<Perform<()>> for MarkOverdueInstallments<Service<Db>>
where
    Service<Db>: Command<
        command::MarkOverdueInstallments,
        Ok = Vec<Installment>,
        Err = ExecutionError,
    >,
{
    type Ok = Vec<Installment>;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        self.service
            .execute(command::MarkOverdueInstallments {
                now: DateTime::now().coerce(),
            })
            .await
    }
}

/// Error of [`MarkOverdueInstallments`] execution.
pub type ExecutionError =
    tracerr::Traced<command::mark_overdue_installments::ExecutionError>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{operations::Perform, DateTime};

    use crate::{
        command::spec::{insert, reserved_plot},
        domain::installment,
        spec::service,
        Config,
    };

    use super::{MarkOverdueInstallments, Task as _};

    #[tokio::test]
    async fn sweeps_past_due_installments() {
        let svc = service();
        let plot = reserved_plot(svc.database(), "100000").await;
        let mut inst = installment::spec::installment(plot.id, 1, "10000");
        inst.due_at = (DateTime::now() - Duration::from_secs(60)).coerce();
        insert(svc.database(), inst.clone()).await;

        let task = MarkOverdueInstallments {
            config: Config::default().mark_overdue_installments,
            service: svc.clone(),
        };

        let marked = task.execute(Perform(())).await.unwrap();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].id, inst.id);
        assert_eq!(marked[0].status, installment::Status::Overdue);

        assert!(task.execute(Perform(())).await.unwrap().is_empty());
    }
}
