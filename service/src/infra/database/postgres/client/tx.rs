//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_postgres::{Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{connection, Connection},
};

use super::NonTx;

/// Transactional Postgres database client.
///
/// The transaction is opened once the client is created and lives until
/// [`Tx::commit()`] is called. Dropping all the clones of an uncommitted
/// [`Tx`] rolls the transaction back.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Open [`connection::Tx`], until committed.
    tx: Arc<Mutex<Option<connection::Tx>>>,
}

/// Error of using a committed [`Tx`] client.
#[derive(Clone, Copy, Debug, derive_more::Display, derive_more::Error)]
#[display("transaction is already committed")]
pub struct CommittedError;

impl Tx {
    /// Opens a new [`Tx`] client upon a [`Connection`] of the provided
    /// [`NonTx`] client.
    ///
    /// # Errors
    ///
    /// If failed to take a [`Connection`] or to open a transaction.
    pub async fn begin(client: &NonTx) -> Result<Self, Traced<database::Error>> {
        let conn = client.connection().await.map_err(tracerr::wrap!())?;
        let tx = connection::Tx::begin(conn)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        })
    }

    /// Commits this [`Tx`] client.
    ///
    /// Committing an already committed [`Tx`] is a no-op.
    ///
    /// # Errors
    ///
    /// If failed to commit transaction of this [`Tx`] client.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.tx.lock().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

/// Runs the provided [`Connection`] method upon the open transaction of the
/// provided [`Tx`] client.
macro_rules! run_in_tx {
    ($client:expr, $method:ident($stmt:expr, $params:expr)) => {{
        let guard = $client.tx.lock().await;
        let Some(tx) = guard.as_ref() else {
            return Err(tracerr::new!(database::Error::from(
                crate::infra::database::postgres::Error::from(CommittedError),
            )));
        };
        tx.$method($stmt, $params).await.map_err(tracerr::wrap!())
    }};
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: connection::Params<'_>,
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        run_in_tx!(self, query(stmt, params))
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: connection::Params<'_>,
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        run_in_tx!(self, query_opt(stmt, params))
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: connection::Params<'_>,
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        run_in_tx!(self, exec(stmt, params))
    }
}
