use std::fmt;

/// Capability strings granted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ManageTeams,
    ManageSellers,
    ManagePipeline,
    ManageTasks,
    ManageInvoices,
    ManageOrders,
    ManageCustomers,
    ManageUsers,
}

impl Permission {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManageTeams => "manageTeams",
            Self::ManageSellers => "manageSellers",
            Self::ManagePipeline => "managePipeline",
            Self::ManageTasks => "manageTasks",
            Self::ManageInvoices => "manageInvoices",
            Self::ManageOrders => "manageOrders",
            Self::ManageCustomers => "manageCustomers",
            Self::ManageUsers => "manageUsers",
        }
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact membership of `required` in `roles`. No hierarchy, no wildcards.
pub fn has_permission<R, P>(roles: &[R], required: P) -> bool
where
    R: AsRef<str>,
    P: AsRef<str>,
{
    let required = required.as_ref();

    roles.iter().any(|role| role.as_ref() == required)
}

/// Returns `render()` when the permission is held, `fallback` otherwise.
///
/// Evaluated on every call, nothing is cached between calls.
pub fn guard<R, P, T, F>(roles: &[R], required: P, render: F, fallback: Option<T>) -> Option<T>
where
    R: AsRef<str>,
    P: AsRef<str>,
    F: FnOnce() -> T,
{
    if has_permission(roles, required) {
        Some(render())
    } else {
        fallback
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
    pub required: Permission,
}

pub static NAVIGATION: &[NavItem] = &[
    NavItem {
        label: "Grupos",
        href: "/teams",
        required: Permission::ManageTeams,
    },
    NavItem {
        label: "Vendedores",
        href: "/sellers",
        required: Permission::ManageSellers,
    },
    NavItem {
        label: "Pipeline",
        href: "/pipeline",
        required: Permission::ManagePipeline,
    },
    NavItem {
        label: "Tarefas",
        href: "/tasks",
        required: Permission::ManageTasks,
    },
    NavItem {
        label: "Faturas",
        href: "/invoices",
        required: Permission::ManageInvoices,
    },
    NavItem {
        label: "Pedidos",
        href: "/orders",
        required: Permission::ManageOrders,
    },
    NavItem {
        label: "Clientes",
        href: "/customers",
        required: Permission::ManageCustomers,
    },
    NavItem {
        label: "Usuários",
        href: "/users",
        required: Permission::ManageUsers,
    },
];

/// Navigation entries the roles can see, in `NAVIGATION` order.
pub fn visible_navigation<R: AsRef<str>>(roles: &[R]) -> Vec<&'static NavItem> {
    NAVIGATION
        .iter()
        .filter(|item| has_permission(roles, item.required))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_has_permission() {
        let none: [&str; 0] = [];

        assert!(!has_permission(&none, "x"));
        assert!(has_permission(&["x", "y"], "x"));
        assert!(!has_permission(&["xy"], "x"));
        assert!(!has_permission(&["ManageTeams"], Permission::ManageTeams));
    }

    #[test]
    fn test_visible_navigation_membership() {
        let all = NAVIGATION
            .iter()
            .map(|item| item.required.as_str())
            .collect::<Vec<_>>();

        // every subset of the known permissions
        for mask in 0u32..(1 << all.len()) {
            let roles = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << *i) != 0)
                .map(|(_, role)| *role)
                .collect::<Vec<_>>();

            let visible = visible_navigation(&roles);

            for item in NAVIGATION {
                assert_eq!(
                    visible.contains(&item),
                    roles.contains(&item.required.as_str()),
                    "{} with {roles:?}",
                    item.label
                );
            }
        }
    }

    #[test]
    fn test_visible_navigation_order() {
        let visible = visible_navigation(&["manageUsers", "manageCustomers", "manageTeams"]);

        let labels = visible.iter().map(|item| item.label).collect::<Vec<_>>();

        assert_eq!(labels, vec!["Grupos", "Clientes", "Usuários"]);
    }

    #[test]
    fn test_manager_navigation() {
        let visible = visible_navigation(&["manageTeams"]);

        assert!(visible.iter().any(|item| item.label == "Grupos"));
        assert!(!visible.iter().any(|item| item.label == "Usuários"));
    }

    #[test]
    fn test_guard() {
        let roles = vec!["manageUsers".to_string()];

        assert_eq!(
            guard(&roles, Permission::ManageUsers, || "users", Some("nope")),
            Some("users")
        );
        assert_eq!(
            guard(&roles, Permission::ManageTeams, || "teams", Some("nope")),
            Some("nope")
        );
        assert_eq!(guard(&roles, "manageTeams", || "teams", None), None);
    }
}
