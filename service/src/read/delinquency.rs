//! [`Delinquency`] read model definition.

#[cfg(doc)]
use crate::domain::Delinquency;

/// Wrapper around [`Delinquency`] indicating that it [`is_active()`].
///
/// [`is_active()`]: Delinquency::is_active
#[derive(Clone, Copy, Debug)]
pub struct Active<T>(pub T);
