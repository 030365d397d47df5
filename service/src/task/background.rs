//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
    iter,
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Error of a [`Task`] running in the [`Background`].
pub type TaskError = Box<dyn Error + 'static>;

/// Background environment for running [`Task`]s.
///
/// Resolves once all the spawned [`Task`]s finish, or with the first error
/// any of them fails with.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set of tasks.
    set: task::LocalSet,

    /// Handles of spawned tasks.
    handles: Vec<task::JoinHandle<Result<(), TaskError>>>,
}

impl Background {
    /// Spawns a new named [`Task`] inside the [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        log::debug!("spawning `{name}` background task");
        self.handles.push(self.set.spawn_local(future.map_err(move |e| {
            log::error!("`{name}` background task failed: {e}");
            TaskError::from(Box::new(e))
        })));
    }

    /// Returns the number of spawned [`Task`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Indicates whether no [`Task`]s are spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl IntoFuture for Background {
    type Output = Result<(), TaskError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        let tasks = handles.into_iter().map(|h| {
            h.map(|joined| joined.unwrap_or_else(|e| Err(Box::new(e).into())))
                .boxed_local()
        });
        future::try_join_all(iter::once(set.map(Ok).boxed_local()).chain(tasks))
            .map_ok(drop)
            .boxed_local()
    }
}
