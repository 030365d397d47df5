//! [`Progress`] [`Query`] definition.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{plot, Installment, Plot},
    infra::{database, Database},
    read::Progress,
    Query, Service,
};

/// [`Query`] computing the payment [`Progress`] of a [`Plot`] from its
/// [`Installment`]s.
///
/// A missing [`Plot`] yields [`Progress::ZERO`].
#[derive(Clone, Copy, Debug)]
pub struct PlotProgress {
    /// ID of the [`Plot`] to compute the [`Progress`] of.
    pub plot_id: plot::Id,
}

impl<Db> Query<PlotProgress> for Service<Db>
where
    Db: Database<
            Select<By<Option<Plot>, plot::Id>>,
            Ok = Option<Plot>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Installment>, plot::Id>>,
            Ok = Vec<Installment>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Progress;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        PlotProgress { plot_id }: PlotProgress,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(plot) = self
            .database()
            .execute(Select(By::<Option<Plot>, _>::new(plot_id)))
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(Progress::ZERO);
        };

        let installments = self
            .database()
            .execute(Select(By::<Vec<Installment>, _>::new(plot_id)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Progress::compute(Some(&plot), &installments))
    }
}
