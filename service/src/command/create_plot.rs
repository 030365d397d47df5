//! [`Command`] for creating a new [`Plot`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{plot, service_provider, Plot},
    error::{Classify, ErrorKind},
    infra::{database, database::constraint, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Plot`] on sale.
#[derive(Clone, Debug)]
pub struct CreatePlot {
    /// [`plot::Number`] of a new [`Plot`].
    pub number: plot::Number,

    /// [`plot::Area`] of a new [`Plot`].
    pub area: Option<plot::Area>,

    /// [`plot::Location`] of a new [`Plot`].
    pub location: Option<plot::Location>,

    /// Total value of a new [`Plot`].
    pub total_value: Money,

    /// ID of the service provider selling a new [`Plot`].
    pub service_provider_id: Option<service_provider::Id>,
}

impl<Db> Command<CreatePlot> for Service<Db>
where
    Db: Database<
            Select<By<Option<Plot>, plot::Number>>,
            Ok = Option<Plot>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Plot>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Plot;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(skip_all, fields(plot.number = %cmd.number))]
    async fn execute(&self, cmd: CreatePlot) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePlot {
            number,
            area,
            location,
            total_value,
            service_provider_id,
        } = cmd;

        if !total_value.is_positive() {
            return Err(tracerr::new!(E::InvalidTotalValue(total_value)));
        }

        let p = self
            .database()
            .execute(Select(By::<Option<Plot>, _>::new(number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if p.is_some() {
            return Err(tracerr::new!(E::NumberOccupied(number)));
        }

        let plot = Plot {
            id: plot::Id::new(),
            number,
            area,
            location,
            total_value,
            status: plot::Status::Available,
            purchaser_id: None,
            service_provider_id,
            reserved_at: None,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let inserted = tx.execute(Insert(plot.clone())).await;
        if let Err(e) = &inserted {
            // Concurrent creation may win the race after the check above.
            if e.as_ref()
                .is_unique_violation(Some(constraint::PLOT_NUMBER))
            {
                return Err(tracerr::new!(E::NumberOccupied(plot.number)));
            }
        }
        inserted
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(plot)
    }
}

/// Error of [`CreatePlot`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Total value of a [`Plot`] is not positive.
    #[display("`{_0}` is not a valid total value")]
    InvalidTotalValue(#[error(not(source))] Money),

    /// [`plot::Number`] is already occupied.
    #[display("`{_0}` plot number is occupied")]
    NumberOccupied(#[error(not(source))] plot::Number),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::InvalidTotalValue(_) => ErrorKind::InvalidInput,
            Self::NumberOccupied(_) => ErrorKind::Conflict,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{installment::spec::pkr, plot},
        error::{Classify as _, ErrorKind},
        spec::service,
    };

    use super::{Command as _, CreatePlot, ExecutionError};

    fn create_plot(number: &str, total_value: &str) -> CreatePlot {
        CreatePlot {
            number: plot::Number::new(number).unwrap(),
            area: Some(plot::Area::new("5 Marla").unwrap()),
            location: None,
            total_value: pkr(total_value),
            service_provider_id: None,
        }
    }

    #[tokio::test]
    async fn creates_available_plot() {
        let svc = service();

        let plot = svc.execute(create_plot("A-101", "2500000")).await.unwrap();

        assert_eq!(plot.status, plot::Status::Available);
        assert_eq!(plot.number.as_ref(), "A-101");
        assert_eq!(plot.total_value, pkr("2500000"));
        assert!(plot.purchaser_id.is_none());
    }

    #[tokio::test]
    async fn rejects_occupied_number() {
        let svc = service();
        _ = svc.execute(create_plot("A-101", "100")).await.unwrap();

        let err = svc.execute(create_plot("A-101", "200")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NumberOccupied(_)));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn rejects_worthless_plot() {
        let svc = service();

        for value in ["0", "-100"] {
            let err = svc.execute(create_plot("B-1", value)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }
}
