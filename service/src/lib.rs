//! Service contains the business logic of plot sales: payment schedules,
//! payment progress, milestone documents and delinquencies.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod error;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::time::Duration;

use common::operations::{By, Start};
use derive_more::{Debug, Error};
use smart_default::SmartDefault;

#[cfg(doc)]
use infra::Database;

pub use self::{
    command::Command,
    error::{Classify, ErrorKind},
    query::Query,
    task::Task,
};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Grace period given to a purchaser to settle a failed payment before a
    /// legal case may be filed, unless specified explicitly.
    #[default(Duration::from_secs(30 * 24 * 60 * 60))]
    pub default_grace_period: Duration,

    /// [`task::MarkOverdueInstallments`] configuration.
    pub mark_overdue_installments: task::mark_overdue_installments::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters, along with the
    /// [`task::Background`] running its periodic [`Task`]s.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::MarkOverdueInstallments<Self>,
                        task::mark_overdue_installments::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Self::without_tasks(config, database);

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("mark_overdue_installments", async move {
            svc.execute(Start(By::new(svc.config().mark_overdue_installments)))
                .await
        });

        (this, bg)
    }

    /// Creates a new [`Service`] with the provided parameters, not running any
    /// periodic [`Task`]s.
    #[must_use]
    pub fn without_tasks(config: Config, database: Db) -> Self {
        Self { config, database }
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }
}

#[cfg(test)]
pub(crate) mod spec {
    //! Helpers for testing [`Command`]s and [`Query`]s.

    use crate::{infra::database::Memory, Config, Service};

    /// Creates a new [`Service`] upon an empty in-memory database.
    pub(crate) fn service() -> Service<Memory> {
        Service::without_tasks(Config::default(), Memory::new())
    }
}
