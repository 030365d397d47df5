//! [`Installment`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select, Update},
    Currency, Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{installment, plot, Installment},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `installments` table.
const COLUMNS: &str = "\
    id, plot_id, number, \
    amount, amount_paid, balance, currency, \
    status, due_at, paid_at, \
    proof, receipt, created_at";

/// Maps the provided [`Row`] of the `installments` table into an
/// [`Installment`].
fn from_row(row: &Row) -> Installment {
    let currency: Currency = row.get("currency");
    let money = |column: &str| Money {
        amount: row.get(column),
        currency,
    };
    Installment {
        id: row.get("id"),
        plot_id: row.get("plot_id"),
        number: installment::Number::try_from(row.get::<_, i32>("number"))
            .expect("`number` overflow"),
        amount: money("amount"),
        amount_paid: money("amount_paid"),
        balance: money("balance"),
        status: row.get("status"),
        due_at: row.get("due_at"),
        paid_at: row.get("paid_at"),
        proof: row.get("proof"),
        receipt: row.get("receipt"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Installment>, installment::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Installment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Installment>, installment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: installment::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM installments \
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

impl<C> Database<Select<By<Vec<Installment>, plot::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Installment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Installment>, plot::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let plot_id: plot::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM installments \
             WHERE plot_id = $1::UUID \
             ORDER BY number ASC",
        );
        Ok(self
            .query(&sql, &[&plot_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Installment>, read::installment::PastDue>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Installment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Installment>, read::installment::PastDue>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::installment::PastDue(now) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM installments \
             WHERE status IN ($1::INT2, $2::INT2) \
               AND due_at < $3::TIMESTAMPTZ \
             ORDER BY due_at ASC",
        );
        Ok(self
            .query(
                &sql,
                &[
                    &installment::Status::Pending,
                    &installment::Status::Partial,
                    &now,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Installment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(installment): Insert<Installment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Installment {
            id,
            plot_id,
            number,
            amount,
            amount_paid,
            balance,
            status,
            due_at,
            paid_at,
            proof,
            receipt,
            created_at,
        } = installment;

        let number = i32::from(number);

        const SQL: &str = "\
            INSERT INTO installments (\
                id, plot_id, number, \
                amount, amount_paid, balance, currency, \
                status, due_at, paid_at, \
                proof, receipt, created_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::INT4, \
                $4::NUMERIC, $5::NUMERIC, $6::NUMERIC, $7::INT2, \
                $8::INT2, $9::TIMESTAMPTZ, $10::TIMESTAMPTZ, \
                $11::VARCHAR, $12::VARCHAR, $13::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET amount = EXCLUDED.amount, \
                amount_paid = EXCLUDED.amount_paid, \
                balance = EXCLUDED.balance, \
                currency = EXCLUDED.currency, \
                status = EXCLUDED.status, \
                due_at = EXCLUDED.due_at, \
                paid_at = EXCLUDED.paid_at, \
                proof = EXCLUDED.proof, \
                receipt = EXCLUDED.receipt";
        self.exec(
            SQL,
            &[
                &id,
                &plot_id,
                &number,
                &amount.amount,
                &amount_paid.amount,
                &balance.amount,
                &amount.currency,
                &status,
                &due_at,
                &paid_at,
                &proof,
                &receipt,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Installment>> for Postgres<C>
where
    C: Connection,
    Self: Database<Insert<Installment>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(installment): Update<Installment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(installment))
            .await
            .map_err(tracerr::wrap!())
    }
}
