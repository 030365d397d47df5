//! [`Initiator`] definitions.

use common::define_kind;

use crate::domain::{purchaser, service_provider, Plot};

/// Identity of whoever initiates an operation.
///
/// Authentication happens outside of this service: an [`Initiator`] is
/// trusted as provided, and the service only compares the IDs it carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Initiator {
    /// [`Role`] of this [`Initiator`].
    pub role: Role,

    /// ID of the purchaser this [`Initiator`] acts as, if any.
    pub purchaser_id: Option<purchaser::Id>,

    /// ID of the service provider this [`Initiator`] acts as, if any.
    pub service_provider_id: Option<service_provider::Id>,
}

impl Initiator {
    /// Creates a new [`Initiator`] acting as the provided purchaser.
    #[must_use]
    pub fn purchaser(id: purchaser::Id) -> Self {
        Self {
            role: Role::Purchaser,
            purchaser_id: Some(id),
            service_provider_id: None,
        }
    }

    /// Creates a new [`Initiator`] acting as the provided service provider.
    #[must_use]
    pub fn service_provider(id: service_provider::Id) -> Self {
        Self {
            role: Role::ServiceProvider,
            purchaser_id: None,
            service_provider_id: Some(id),
        }
    }

    /// Creates a new [`Initiator`] of the provided staff [`Role`], not acting
    /// as any purchaser or service provider.
    #[must_use]
    pub fn staff(role: Role) -> Self {
        Self {
            role,
            purchaser_id: None,
            service_provider_id: None,
        }
    }

    /// Indicates whether this [`Initiator`] is the purchaser of the provided
    /// [`Plot`].
    ///
    /// Fails closed: a [`Plot`] without a purchaser, or an [`Initiator`] not
    /// acting as a purchaser, never match.
    #[must_use]
    pub fn is_purchaser_of(&self, plot: &Plot) -> bool {
        matches!(
            (self.purchaser_id, plot.purchaser_id),
            (Some(mine), Some(theirs)) if mine == theirs,
        )
    }

    /// Indicates whether this [`Initiator`] is the service provider selling
    /// the provided [`Plot`].
    ///
    /// Fails closed the same way [`Initiator::is_purchaser_of()`] does.
    #[must_use]
    pub fn is_service_provider_of(&self, plot: &Plot) -> bool {
        matches!(
            (self.service_provider_id, plot.service_provider_id),
            (Some(mine), Some(theirs)) if mine == theirs,
        )
    }

    /// Indicates whether this [`Initiator`] is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

define_kind! {
    #[doc = "Role of an [`Initiator`]."]
    enum Role {
        #[doc = "Buyer of plots."]
        Purchaser = 1,

        #[doc = "Agency selling plots on behalf of the developer."]
        ServiceProvider = 2,

        #[doc = "Administrator of the platform."]
        Admin = 3,

        #[doc = "Legal department handling delinquency cases."]
        Legal = 4,
    }
}

#[cfg(test)]
mod spec {
    use crate::domain::{plot, purchaser, service_provider};

    use super::{Initiator, Role};

    #[test]
    fn purchaser_ownership_fails_closed() {
        let owner = purchaser::Id::new();
        let mut plot = plot::spec::plot("100000");

        assert!(!Initiator::purchaser(owner).is_purchaser_of(&plot));
        assert!(!Initiator::staff(Role::Admin).is_purchaser_of(&plot));

        plot.purchaser_id = Some(owner);
        assert!(Initiator::purchaser(owner).is_purchaser_of(&plot));
        assert!(!Initiator::purchaser(purchaser::Id::new())
            .is_purchaser_of(&plot));
        assert!(!Initiator::staff(Role::Admin).is_purchaser_of(&plot));
    }

    #[test]
    fn service_provider_ownership_fails_closed() {
        let provider = service_provider::Id::new();
        let mut plot = plot::spec::plot("100000");

        assert!(!Initiator::service_provider(provider)
            .is_service_provider_of(&plot));

        plot.service_provider_id = Some(provider);
        assert!(Initiator::service_provider(provider)
            .is_service_provider_of(&plot));
        assert!(!Initiator::service_provider(service_provider::Id::new())
            .is_service_provider_of(&plot));
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("SERVICE_PROVIDER".parse::<Role>(), Ok(Role::ServiceProvider));
        assert_eq!(Role::Legal.to_string(), "legal");
        assert!("lawyer".parse::<Role>().is_err());
    }
}
