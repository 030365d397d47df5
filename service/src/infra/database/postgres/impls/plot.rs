//! [`Plot`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{plot, Plot},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `plots` table.
const PLOT_COLUMNS: &str = "\
    id, number, area, location, \
    total_value, total_value_currency, \
    status, purchaser_id, service_provider_id, \
    reserved_at, created_at";

/// Maps the provided [`Row`] of the `plots` table into a [`Plot`].
fn plot_from_row(row: &Row) -> Plot {
    Plot {
        id: row.get("id"),
        number: row.get("number"),
        area: row.get("area"),
        location: row.get("location"),
        total_value: Money {
            amount: row.get("total_value"),
            currency: row.get("total_value_currency"),
        },
        status: row.get("status"),
        purchaser_id: row.get("purchaser_id"),
        service_provider_id: row.get("service_provider_id"),
        reserved_at: row.get("reserved_at"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Plot>, plot::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Plot>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Plot>, plot::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: plot::Id = by.into_inner();

        let sql = format!(
            "SELECT {PLOT_COLUMNS} \
             FROM plots \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(plot_from_row))
    }
}

impl<C> Database<Select<By<Option<Plot>, plot::Number>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Plot>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Plot>, plot::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();

        let sql = format!(
            "SELECT {PLOT_COLUMNS} \
             FROM plots \
             WHERE number = $1::VARCHAR \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&number])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(plot_from_row))
    }
}

impl<C> Database<Insert<Plot>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(plot): Insert<Plot>,
    ) -> Result<Self::Ok, Self::Err> {
        let Plot {
            id,
            number,
            area,
            location,
            total_value,
            status,
            purchaser_id,
            service_provider_id,
            reserved_at,
            created_at,
        } = plot;

        const SQL: &str = "\
            INSERT INTO plots (\
                id, number, area, location, \
                total_value, total_value_currency, \
                status, purchaser_id, service_provider_id, \
                reserved_at, created_at \
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::VARCHAR, \
                $5::NUMERIC, $6::INT2, \
                $7::INT2, $8::UUID, $9::UUID, \
                $10::TIMESTAMPTZ, $11::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET number = EXCLUDED.number, \
                area = EXCLUDED.area, \
                location = EXCLUDED.location, \
                total_value = EXCLUDED.total_value, \
                total_value_currency = EXCLUDED.total_value_currency, \
                status = EXCLUDED.status, \
                purchaser_id = EXCLUDED.purchaser_id, \
                service_provider_id = EXCLUDED.service_provider_id, \
                reserved_at = EXCLUDED.reserved_at";
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &area,
                &location,
                &total_value.amount,
                &total_value.currency,
                &status,
                &purchaser_id,
                &service_provider_id,
                &reserved_at,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Plot>> for Postgres<C>
where
    C: Connection,
    Self: Database<Insert<Plot>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(plot): Update<Plot>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(plot)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Lock<By<Plot, plot::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Plot, plot::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: plot::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM plots \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Option<plot::Details>, plot::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<plot::Details>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<plot::Details>, plot::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let plot_id: plot::Id = by.into_inner();

        const SQL: &str = "\
            SELECT plot_id, \
                   allotment, allocation, possession, clearance, \
                   created_at \
            FROM plot_details \
            WHERE plot_id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&plot_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| plot::Details {
                plot_id: row.get("plot_id"),
                allotment: row.get("allotment"),
                allocation: row.get("allocation"),
                possession: row.get("possession"),
                clearance: row.get("clearance"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Insert<plot::Details>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(details): Insert<plot::Details>,
    ) -> Result<Self::Ok, Self::Err> {
        let plot::Details {
            plot_id,
            allotment,
            allocation,
            possession,
            clearance,
            created_at,
        } = details;

        // Slots are never cleared once set.
        const SQL: &str = "\
            INSERT INTO plot_details (\
                plot_id, \
                allotment, allocation, possession, clearance, \
                created_at \
            ) VALUES (\
                $1::UUID, \
                $2::VARCHAR, $3::VARCHAR, $4::VARCHAR, $5::VARCHAR, \
                $6::TIMESTAMPTZ \
            ) \
            ON CONFLICT (plot_id) DO UPDATE \
            SET allotment = COALESCE(plot_details.allotment, \
                                     EXCLUDED.allotment), \
                allocation = COALESCE(plot_details.allocation, \
                                      EXCLUDED.allocation), \
                possession = COALESCE(plot_details.possession, \
                                      EXCLUDED.possession), \
                clearance = COALESCE(plot_details.clearance, \
                                     EXCLUDED.clearance)";
        self.exec(
            SQL,
            &[
                &plot_id,
                &allotment,
                &allocation,
                &possession,
                &clearance,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<plot::Details>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Insert<plot::Details>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(details): Update<plot::Details>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(details)).await.map_err(tracerr::wrap!())
    }
}
