//! [`Query`] collection related to milestone [`Document`]s.

use common::operations::By;

use crate::{
    domain::{document, plot, Document},
    read,
};
#[cfg(doc)]
use crate::{
    domain::{Milestone, Plot},
    Query,
};

use super::DatabaseQuery;

/// Queries a [`Document`] by its [`document::Id`].
pub type ById = DatabaseQuery<By<Option<Document>, document::Id>>;

/// Queries all the [`Document`]s of a [`Plot`] in their [`Milestone`] order.
pub type ByPlot = DatabaseQuery<By<Vec<Document>, plot::Id>>;

/// Queries the [`Document`] of a [`Plot`] issued at a [`Milestone`].
pub type OfMilestone =
    DatabaseQuery<By<Option<Document>, read::document::OfMilestone>>;
