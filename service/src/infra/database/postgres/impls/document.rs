//! [`Document`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{document, milestone::DocumentKind, plot, Document, Milestone},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `milestone_documents` table.
const COLUMNS: &str = "\
    id, plot_id, threshold, kind, status, \
    amount_paid, amount_paid_currency, \
    reference, generated_at, \
    approved_at, approved_by, notes, \
    created_at";

/// Maps the provided [`Row`] of the `milestone_documents` table into a
/// [`Document`].
fn from_row(row: &Row) -> Document {
    let threshold = u8::try_from(row.get::<_, i16>("threshold"))
        .expect("`threshold` overflow");
    let kind: DocumentKind = row.get("kind");
    Document {
        id: row.get("id"),
        plot_id: row.get("plot_id"),
        milestone: Milestone::recorded(threshold, kind)
            .expect("`threshold` is checked by constraint"),
        status: row.get("status"),
        amount_paid: Money {
            amount: row.get("amount_paid"),
            currency: row.get("amount_paid_currency"),
        },
        reference: row.get("reference"),
        generated_at: row.get("generated_at"),
        approved_at: row.get("approved_at"),
        approved_by: row.get("approved_by"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Document>, document::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Document>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Document>, document::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: document::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM milestone_documents \
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

impl<C> Database<Select<By<Option<Document>, read::document::OfMilestone>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Document>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Document>, read::document::OfMilestone>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::document::OfMilestone { plot_id, milestone } =
            by.into_inner();
        let threshold = i16::from(u8::from(milestone.threshold));

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM milestone_documents \
             WHERE plot_id = $1::UUID \
               AND threshold = $2::INT2 \
               AND kind = $3::INT2 \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&plot_id, &threshold, &milestone.document])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Document>, plot::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Document>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Document>, plot::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let plot_id: plot::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM milestone_documents \
             WHERE plot_id = $1::UUID \
             ORDER BY threshold ASC",
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

impl<C> Database<Insert<Document>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(document): Insert<Document>,
    ) -> Result<Self::Ok, Self::Err> {
        let Document {
            id,
            plot_id,
            milestone,
            status,
            amount_paid,
            reference,
            generated_at,
            approved_at,
            approved_by,
            notes,
            created_at,
        } = document;

        let threshold = i16::from(u8::from(milestone.threshold));

        const SQL: &str = "\
            INSERT INTO milestone_documents (\
                id, plot_id, threshold, kind, status, \
                amount_paid, amount_paid_currency, \
                reference, generated_at, \
                approved_at, approved_by, notes, \
                created_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::INT2, $4::INT2, $5::INT2, \
                $6::NUMERIC, $7::INT2, \
                $8::VARCHAR, $9::TIMESTAMPTZ, \
                $10::TIMESTAMPTZ, $11::VARCHAR, $12::TEXT, \
                $13::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                amount_paid = EXCLUDED.amount_paid, \
                amount_paid_currency = EXCLUDED.amount_paid_currency, \
                reference = EXCLUDED.reference, \
                generated_at = EXCLUDED.generated_at, \
                approved_at = EXCLUDED.approved_at, \
                approved_by = EXCLUDED.approved_by, \
                notes = EXCLUDED.notes";
        self.exec(
            SQL,
            &[
                &id,
                &plot_id,
                &threshold,
                &milestone.document,
                &status,
                &amount_paid.amount,
                &amount_paid.currency,
                &reference,
                &generated_at,
                &approved_at,
                &approved_by,
                &notes,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Document>> for Postgres<C>
where
    C: Connection,
    Self: Database<Insert<Document>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(document): Update<Document>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(document)).await.map_err(tracerr::wrap!())
    }
}
