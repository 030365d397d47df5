//! [`Query`] collection related to [`Installment`]s of a [`Plot`].

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{plot, Installment},
    infra::{database, Database},
    read::Schedule,
    Query, Service,
};
#[cfg(doc)]
use crate::domain::Plot;

use super::DatabaseQuery;

/// Queries all the [`Installment`]s of a [`Plot`] in their number order.
pub type ByPlot = DatabaseQuery<By<Vec<Installment>, plot::Id>>;

/// [`Query`] of the payment [`Schedule`] of a [`Plot`].
#[derive(Clone, Copy, Debug)]
pub struct ScheduleOf {
    /// ID of the [`Plot`] to query the [`Schedule`] of.
    pub plot_id: plot::Id,
}

impl<Db> Query<ScheduleOf> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Installment>, plot::Id>>,
        Ok = Vec<Installment>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Schedule>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        ScheduleOf { plot_id }: ScheduleOf,
    ) -> Result<Self::Ok, Self::Err> {
        let installments = self
            .database()
            .execute(Select(By::<Vec<Installment>, _>::new(plot_id)))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(installments.iter().map(Schedule::from).collect())
    }
}
