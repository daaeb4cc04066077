use clap::ValueEnum;

use crate::permissions::Permission;

/// Backend resources the client lists and caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Resource {
    Teams,
    Sellers,
    Users,
    Pipeline,
    Stages,
    Invoices,
    Orders,
    Customers,
}

/// Operations the backend announces over the websocket.
pub const OPERATIONS: &[&str] = &["created", "updated", "deleted"];

impl Resource {
    pub const ALL: &'static [Resource] = &[
        Self::Teams,
        Self::Sellers,
        Self::Users,
        Self::Pipeline,
        Self::Stages,
        Self::Invoices,
        Self::Orders,
        Self::Customers,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Self::Teams => "/teams",
            Self::Sellers => "/sellers",
            Self::Users => "/users",
            Self::Pipeline => "/pipeline",
            Self::Stages => "/stage",
            Self::Invoices => "/invoice",
            Self::Orders => "/order",
            Self::Customers => "/customer",
        }
    }

    pub const fn cache_key(self) -> &'static str {
        match self {
            Self::Teams => "teamsCache",
            Self::Sellers => "sellersCache",
            Self::Users => "usersCache",
            Self::Pipeline => "dealsCache",
            Self::Stages => "stagesCache",
            Self::Invoices => "invoicesCache",
            Self::Orders => "ordersCache",
            Self::Customers => "customersCache",
        }
    }

    /// Entity name in `entity:operation` events.
    pub const fn entity(self) -> &'static str {
        match self {
            Self::Teams => "team",
            Self::Sellers => "seller",
            Self::Users => "user",
            Self::Pipeline => "deal",
            Self::Stages => "stage",
            Self::Invoices => "invoice",
            Self::Orders => "order",
            Self::Customers => "customer",
        }
    }

    pub const fn permission(self) -> Permission {
        match self {
            Self::Teams => Permission::ManageTeams,
            Self::Sellers => Permission::ManageSellers,
            Self::Users => Permission::ManageUsers,
            Self::Pipeline | Self::Stages => Permission::ManagePipeline,
            Self::Invoices => Permission::ManageInvoices,
            Self::Orders => Permission::ManageOrders,
            Self::Customers => Permission::ManageCustomers,
        }
    }

    /// Every `entity:operation` event that invalidates this resource's cache.
    pub fn events(self) -> Vec<String> {
        OPERATIONS
            .iter()
            .map(|operation| format!("{}:{operation}", self.entity()))
            .collect()
    }

    pub fn from_cache_key(key: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|resource| resource.cache_key() == key)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_unique_keys() {
        let keys = Resource::ALL
            .iter()
            .map(|r| r.cache_key())
            .collect::<HashSet<_>>();
        let entities = Resource::ALL
            .iter()
            .map(|r| r.entity())
            .collect::<HashSet<_>>();

        assert_eq!(keys.len(), Resource::ALL.len());
        assert_eq!(entities.len(), Resource::ALL.len());
    }

    #[test]
    fn test_events() {
        assert_eq!(
            Resource::Customers.events(),
            vec!["customer:created", "customer:updated", "customer:deleted"]
        );
        assert_eq!(
            Resource::from_cache_key("dealsCache"),
            Some(Resource::Pipeline)
        );
        assert_eq!(Resource::from_cache_key("nope"), None);
    }
}
