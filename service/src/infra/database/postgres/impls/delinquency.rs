//! [`Delinquency`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select, Update},
    Currency, Money,
};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        delinquency::{self, Case},
        plot, Delinquency,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::delinquency::Active,
};

/// Columns of the `delinquencies` table.
const COLUMNS: &str = "\
    id, plot_id, amount, currency, description, status, \
    grace_period_ends_at, \
    case_id, court_date, charge_code, amount_charged, filed_by, filed_at, \
    recorded_at";

/// Maps the provided [`Row`] of the `delinquencies` table into a
/// [`Delinquency`].
fn from_row(row: &Row) -> Delinquency {
    let currency: Currency = row.get("currency");
    let case = row
        .get::<_, Option<delinquency::CaseId>>("case_id")
        .map(|id| Case {
            id,
            court_date: row.get("court_date"),
            charge_code: row.get("charge_code"),
            amount_charged: row
                .get::<_, Option<Decimal>>("amount_charged")
                .map(|amount| Money { amount, currency }),
            filed_by: row.get("filed_by"),
            filed_at: row.get::<_, Option<_>>("filed_at").expect(
                "`filed_at` is set for every `case_id` by constraint",
            ),
        });
    Delinquency {
        id: row.get("id"),
        plot_id: row.get("plot_id"),
        amount: Money {
            amount: row.get("amount"),
            currency,
        },
        description: row.get("description"),
        status: row.get("status"),
        grace_period_ends_at: row.get("grace_period_ends_at"),
        case,
        recorded_at: row.get("recorded_at"),
    }
}

impl<C> Database<Select<By<Option<Delinquency>, delinquency::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Delinquency>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Delinquency>, delinquency::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: delinquency::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM delinquencies \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Option<Active<Delinquency>>, plot::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Active<Delinquency>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Active<Delinquency>>, plot::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let plot_id: plot::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM delinquencies \
             WHERE plot_id = $1::UUID \
               AND status IN ($2::INT2, $3::INT2, $4::INT2) \
             LIMIT 1",
        );
        Ok(self
            .query_opt(
                &sql,
                &[
                    &plot_id,
                    &delinquency::Status::Recorded,
                    &delinquency::Status::Filed,
                    &delinquency::Status::InProgress,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row)
            .map(Active))
    }
}

impl<C> Database<Insert<Delinquency>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(delinquency): Insert<Delinquency>,
    ) -> Result<Self::Ok, Self::Err> {
        let Delinquency {
            id,
            plot_id,
            amount,
            description,
            status,
            grace_period_ends_at,
            case,
            recorded_at,
        } = delinquency;

        let case_id = case.as_ref().map(|c| &c.id);
        let court_date = case.as_ref().and_then(|c| c.court_date);
        let charge_code = case.as_ref().and_then(|c| c.charge_code.as_ref());
        let amount_charged =
            case.as_ref().and_then(|c| c.amount_charged).map(|m| m.amount);
        let filed_by = case.as_ref().and_then(|c| c.filed_by);
        let filed_at = case.as_ref().map(|c| c.filed_at);

        const SQL: &str = "\
            INSERT INTO delinquencies (\
                id, plot_id, amount, currency, description, status, \
                grace_period_ends_at, \
                case_id, court_date, charge_code, amount_charged, \
                filed_by, filed_at, \
                recorded_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::NUMERIC, $4::INT2, $5::TEXT, \
                $6::INT2, \
                $7::TIMESTAMPTZ, \
                $8::VARCHAR, $9::TIMESTAMPTZ, $10::VARCHAR, $11::NUMERIC, \
                $12::UUID, $13::TIMESTAMPTZ, \
                $14::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET description = EXCLUDED.description, \
                status = EXCLUDED.status, \
                grace_period_ends_at = EXCLUDED.grace_period_ends_at, \
                case_id = EXCLUDED.case_id, \
                court_date = EXCLUDED.court_date, \
                charge_code = EXCLUDED.charge_code, \
                amount_charged = EXCLUDED.amount_charged, \
                filed_by = EXCLUDED.filed_by, \
                filed_at = EXCLUDED.filed_at";
        self.exec(
            SQL,
            &[
                &id,
                &plot_id,
                &amount.amount,
                &amount.currency,
                &description,
                &status,
                &grace_period_ends_at,
                &case_id,
                &court_date,
                &charge_code,
                &amount_charged,
                &filed_by,
                &filed_at,
                &recorded_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Delinquency>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Insert<Delinquency>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(delinquency): Update<Delinquency>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(delinquency))
            .await
            .map_err(tracerr::wrap!())
    }
}
