//! In-memory [`Database`] implementation.
//!
//! Keeps every row in process memory and enforces the same unique constraints
//! as [`Postgres`] does. [`Transact`]ing shares the same state, so writes are
//! visible immediately and are never rolled back. [`Plot`] row [`Lock`]s are
//! held by a transaction until it's [`Commit`]ted or dropped.
//!
//! [`Postgres`]: crate::infra::Postgres

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Update};
use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex as RowMutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{
        delinquency, document, installment, plot, Delinquency, Document,
        Installment, Plot,
    },
    infra::{database, Database},
    read::{self, delinquency::Active},
};

use super::constraint;

/// In-memory [`Database`].
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Shared rows of this [`Memory`].
    state: Arc<Mutex<State>>,

    /// Row locks of [`Plot`]s, shared by all the transactions.
    plot_locks: Arc<Mutex<HashMap<plot::Id, Arc<RowMutex<()>>>>>,

    /// [`Plot`] row locks held by this transaction.
    ///
    /// [`None`] if this [`Memory`] is not transacted.
    held: Option<Arc<Mutex<HashMap<plot::Id, OwnedMutexGuard<()>>>>>,
}

/// Rows stored in a [`Memory`].
#[derive(Debug, Default)]
struct State {
    /// [`Plot`]s by their IDs.
    plots: HashMap<plot::Id, Plot>,

    /// [`plot::Details`] by IDs of their [`Plot`]s.
    details: HashMap<plot::Id, plot::Details>,

    /// [`Installment`]s by their IDs.
    installments: HashMap<installment::Id, Installment>,

    /// [`Document`]s by their IDs.
    documents: HashMap<document::Id, Document>,

    /// [`Delinquency`]s by their IDs.
    delinquencies: HashMap<delinquency::Id, Delinquency>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the [`State`] of this [`Memory`].
    fn state(&self) -> MutexGuard<'_, State> {
        guard(&self.state)
    }
}

/// Locks the provided [`Mutex`], ignoring its poisoning.
fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |x| x == *c),
        }
    }
}

/// Fails with the provided unique `constraint` violation if `conflicts`.
fn ensure_unique(
    conflicts: bool,
    constraint: &'static str,
) -> Result<(), Traced<database::Error>> {
    if conflicts {
        return Err(tracerr::new!(database::Error::from(
            Error::UniqueViolation(constraint)
        )));
    }
    Ok(())
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Self {
            state: Arc::clone(&self.state),
            plot_locks: Arc::clone(&self.plot_locks),
            held: Some(self.held.clone().unwrap_or_default()),
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        if let Some(held) = &self.held {
            guard(held).clear();
        }
        Ok(())
    }
}

impl Database<Lock<By<Plot, plot::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Plot, plot::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Outside a transaction the lock is released right away.
        let Some(held) = &self.held else {
            return Ok(());
        };
        let id = by.into_inner();
        if guard(held).contains_key(&id) {
            return Ok(());
        }

        let row = Arc::clone(guard(&self.plot_locks).entry(id).or_default());
        let locked = row.lock_owned().await;
        _ = guard(held).insert(id, locked);
        Ok(())
    }
}

impl Database<Select<By<Option<Plot>, plot::Id>>> for Memory {
    type Ok = Option<Plot>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Plot>, plot::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().plots.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Option<Plot>, plot::Number>>> for Memory {
    type Ok = Option<Plot>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Plot>, plot::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();
        Ok(self
            .state()
            .plots
            .values()
            .find(|p| p.number == number)
            .cloned())
    }
}

impl Database<Insert<Plot>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(plot): Insert<Plot>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        ensure_unique(
            state
                .plots
                .values()
                .any(|p| p.id != plot.id && p.number == plot.number),
            constraint::PLOT_NUMBER,
        )?;
        _ = state.plots.insert(plot.id, plot);
        Ok(())
    }
}

impl Database<Select<By<Option<plot::Details>, plot::Id>>> for Memory {
    type Ok = Option<plot::Details>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<plot::Details>, plot::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().details.get(&by.into_inner()).cloned())
    }
}

impl Database<Insert<plot::Details>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(details): Insert<plot::Details>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().details.insert(details.plot_id, details);
        Ok(())
    }
}

impl Database<Select<By<Option<Installment>, installment::Id>>> for Memory {
    type Ok = Option<Installment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Installment>, installment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().installments.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Vec<Installment>, plot::Id>>> for Memory {
    type Ok = Vec<Installment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Installment>, plot::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let plot_id = by.into_inner();
        let mut list = self
            .state()
            .installments
            .values()
            .filter(|i| i.plot_id == plot_id)
            .cloned()
            .collect::<Vec<_>>();
        list.sort_by_key(|i| i.number);
        Ok(list)
    }
}

impl Database<Select<By<Vec<Installment>, read::installment::PastDue>>>
    for Memory
{
    type Ok = Vec<Installment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Installment>, read::installment::PastDue>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::installment::PastDue(now) = by.into_inner();
        let mut list = self
            .state()
            .installments
            .values()
            .filter(|i| i.is_past_due(now))
            .cloned()
            .collect::<Vec<_>>();
        list.sort_by_key(|i| i.due_at);
        Ok(list)
    }
}

impl Database<Insert<Installment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(installment): Insert<Installment>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        ensure_unique(
            state.installments.values().any(|i| {
                i.id != installment.id
                    && i.plot_id == installment.plot_id
                    && i.number == installment.number
            }),
            constraint::INSTALLMENT_NUMBER,
        )?;
        _ = state.installments.insert(installment.id, installment);
        Ok(())
    }
}

impl Database<Select<By<Option<Document>, document::Id>>> for Memory {
    type Ok = Option<Document>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Document>, document::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().documents.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Option<Document>, read::document::OfMilestone>>>
    for Memory
{
    type Ok = Option<Document>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Document>, read::document::OfMilestone>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::document::OfMilestone { plot_id, milestone } =
            by.into_inner();
        Ok(self
            .state()
            .documents
            .values()
            .find(|d| d.plot_id == plot_id && d.milestone == milestone)
            .cloned())
    }
}

impl Database<Select<By<Vec<Document>, plot::Id>>> for Memory {
    type Ok = Vec<Document>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Document>, plot::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let plot_id = by.into_inner();
        let mut list = self
            .state()
            .documents
            .values()
            .filter(|d| d.plot_id == plot_id)
            .cloned()
            .collect::<Vec<_>>();
        list.sort_by_key(|d| d.milestone.threshold);
        Ok(list)
    }
}

impl Database<Insert<Document>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(document): Insert<Document>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        ensure_unique(
            state.documents.values().any(|d| {
                d.id != document.id
                    && d.plot_id == document.plot_id
                    && d.milestone == document.milestone
            }),
            constraint::MILESTONE_DOCUMENT,
        )?;
        _ = state.documents.insert(document.id, document);
        Ok(())
    }
}

impl Database<Select<By<Option<Delinquency>, delinquency::Id>>> for Memory {
    type Ok = Option<Delinquency>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Delinquency>, delinquency::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().delinquencies.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Option<Active<Delinquency>>, plot::Id>>> for Memory {
    type Ok = Option<Active<Delinquency>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Active<Delinquency>>, plot::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let plot_id = by.into_inner();
        Ok(self
            .state()
            .delinquencies
            .values()
            .find(|d| d.plot_id == plot_id && d.is_active())
            .cloned()
            .map(Active))
    }
}

impl Database<Insert<Delinquency>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(delinquency): Insert<Delinquency>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        ensure_unique(
            delinquency.is_active()
                && state.delinquencies.values().any(|d| {
                    d.id != delinquency.id
                        && d.plot_id == delinquency.plot_id
                        && d.is_active()
                }),
            constraint::ACTIVE_DELINQUENCY,
        )?;
        _ = state.delinquencies.insert(delinquency.id, delinquency);
        Ok(())
    }
}

impl<T> Database<Update<T>> for Memory
where
    Self: Database<Insert<T>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(row): Update<T>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(row)).await.map_err(tracerr::wrap!())
    }
}
