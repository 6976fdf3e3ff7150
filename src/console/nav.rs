use crate::identity::roles::{self, ADMIN, LAWYER, MANAGER};
use crate::identity::{Navigator, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
    pub allowed_roles: &'static [&'static str],
}

pub const NAV_ITEMS: &[NavItem] = &[
    NavItem { label: "Dashboard", href: "/dashboard", allowed_roles: &[ADMIN, LAWYER, MANAGER] },
    NavItem { label: "User Management", href: "/userManagement", allowed_roles: &[ADMIN] },
    NavItem { label: "Properties", href: "/properties", allowed_roles: &[LAWYER, MANAGER] },
    NavItem { label: "Insurance Management", href: "/insurance-management", allowed_roles: &[MANAGER] },
    NavItem { label: "Cases", href: "/cases", allowed_roles: &[MANAGER, LAWYER] },
    NavItem { label: "Clients", href: "/clients", allowed_roles: &[MANAGER, LAWYER] },
];

/// Menu entries the current operator may see. Empty without a session.
pub fn visible_items(store: &SessionStore) -> Vec<NavItem> {
    let snap = store.snapshot();
    if !snap.is_active() {
        return Vec::new();
    }
    NAV_ITEMS
        .iter()
        .filter(|item| snap.is_authorized(&roles::set(item.allowed_roles.iter())))
        .copied()
        .collect()
}

pub fn profile_link(store: &SessionStore) -> Option<String> {
    store
        .identity()
        .map(|id| format!("/profile/{}", urlencoding::encode(&id.subject_id)))
}

/// Menu logout: end the session, then go to the login page.
pub fn sign_out(store: &SessionStore, navigator: &dyn Navigator, login_path: &str) {
    store.logout();
    navigator.navigate(login_path);
}
