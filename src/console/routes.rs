//! Page table of the console and the access policy each page declares.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::identity::roles::{ADMIN, LAWYER, MANAGER};
use crate::identity::{AuthorizationRequirement, DEFAULT_LOGIN_PATH, DEFAULT_UNAUTHORIZED_PATH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Roles(&'static [&'static str]),
    /// Role allow-list, or the operator whose subject id equals the named path parameter.
    RolesOrOwner { roles: &'static [&'static str], owner_param: &'static str },
}

#[derive(Debug, Clone, Copy)]
pub struct RouteSpec {
    pub pattern: &'static str,
    pub label: &'static str,
    pub access: Access,
}

const LAWYER_MANAGER: &[&str] = &[LAWYER, MANAGER];

pub const ROUTES: &[RouteSpec] = &[
    RouteSpec { pattern: "/", label: "Home", access: Access::Public },
    RouteSpec { pattern: "/login", label: "Login", access: Access::Public },
    RouteSpec { pattern: "/verify-otp", label: "Verify OTP", access: Access::Public },
    RouteSpec { pattern: "/reset-password", label: "Reset password", access: Access::Public },
    RouteSpec { pattern: "/dashboard", label: "Dashboard", access: Access::Roles(&[ADMIN, LAWYER, MANAGER]) },
    RouteSpec { pattern: "/userManagement", label: "User management", access: Access::Roles(&[ADMIN, LAWYER]) },
    RouteSpec { pattern: "/add-user", label: "Add user", access: Access::Roles(&[ADMIN]) },
    RouteSpec {
        pattern: "/profile/{userId}",
        label: "Profile",
        access: Access::RolesOrOwner { roles: &[ADMIN], owner_param: "userId" },
    },
    RouteSpec { pattern: "/properties", label: "Properties", access: Access::Roles(LAWYER_MANAGER) },
    RouteSpec { pattern: "/add-property", label: "Add property", access: Access::Roles(LAWYER_MANAGER) },
    RouteSpec { pattern: "/property/{id}/claim", label: "Property claim form", access: Access::Roles(LAWYER_MANAGER) },
    RouteSpec { pattern: "/property-claims", label: "Property claims", access: Access::Roles(LAWYER_MANAGER) },
    RouteSpec { pattern: "/property-claims/{id}", label: "Property claim", access: Access::Roles(LAWYER_MANAGER) },
    RouteSpec { pattern: "/insurance-management", label: "Insurance management", access: Access::Roles(&[MANAGER]) },
    RouteSpec { pattern: "/client-claims", label: "Client claims", access: Access::Roles(LAWYER_MANAGER) },
    RouteSpec { pattern: "/client-claims/{id}", label: "Client claim", access: Access::Roles(&[LAWYER]) },
    RouteSpec { pattern: "/add-client-claim", label: "Add client claim", access: Access::Roles(LAWYER_MANAGER) },
    RouteSpec { pattern: "/cases", label: "Cases", access: Access::Roles(LAWYER_MANAGER) },
    RouteSpec { pattern: "/cases/add", label: "Register case", access: Access::Roles(LAWYER_MANAGER) },
    RouteSpec { pattern: "/cases/view/{id}", label: "Case", access: Access::Roles(&[LAWYER]) },
    RouteSpec { pattern: "/cases/edit/{id}", label: "Edit case", access: Access::Roles(LAWYER_MANAGER) },
    RouteSpec { pattern: "/hearings/add/{id}", label: "Add hearing", access: Access::Roles(&[LAWYER]) },
    RouteSpec { pattern: "/hearings/edit/{id}", label: "Edit hearing", access: Access::Roles(&[LAWYER]) },
    RouteSpec { pattern: "/clients", label: "Clients", access: Access::Roles(LAWYER_MANAGER) },
    RouteSpec { pattern: "/clients/add", label: "Add client", access: Access::Roles(LAWYER_MANAGER) },
    RouteSpec { pattern: "/clients/view/{id}", label: "Client", access: Access::Roles(LAWYER_MANAGER) },
    RouteSpec { pattern: "/clients/edit/{id}", label: "Edit client", access: Access::Roles(LAWYER_MANAGER) },
];

enum Segment {
    Literal(&'static str),
    Param(&'static str),
}

struct CompiledRoute {
    spec: RouteSpec,
    segments: Vec<Segment>,
}

static COMPILED: Lazy<Vec<CompiledRoute>> = Lazy::new(|| {
    ROUTES
        .iter()
        .map(|spec| CompiledRoute {
            spec: *spec,
            segments: split(spec.pattern)
                .map(|s| match s.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                    Some(name) => Segment::Param(name),
                    None => Segment::Literal(s),
                })
                .collect(),
        })
        .collect()
});

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub pattern: &'static str,
    pub label: &'static str,
    pub path: String,
    pub params: BTreeMap<String, String>,
    /// `None` for public pages.
    pub requirement: Option<AuthorizationRequirement>,
}

/// Resolves console paths to pages, stamping each requirement with the configured redirects.
#[derive(Debug, Clone)]
pub struct RouteTable {
    login_path: String,
    unauthorized_path: String,
}

impl Default for RouteTable {
    fn default() -> Self { Self::new(DEFAULT_LOGIN_PATH, DEFAULT_UNAUTHORIZED_PATH) }
}

impl RouteTable {
    pub fn new(login_path: impl Into<String>, unauthorized_path: impl Into<String>) -> Self {
        Self { login_path: login_path.into(), unauthorized_path: unauthorized_path.into() }
    }

    pub fn routes(&self) -> &'static [RouteSpec] { ROUTES }

    pub fn resolve(&self, raw_path: &str) -> Option<ResolvedRoute> {
        let path = raw_path.split(['?', '#']).next().unwrap_or("");
        let parts: Vec<&str> = split(path).collect();
        COMPILED.iter().find_map(|route| {
            let params = match_segments(&route.segments, &parts)?;
            let requirement = self.requirement_for(route.spec.access, &params);
            let canonical = if parts.is_empty() { "/".to_string() } else { format!("/{}", parts.join("/")) };
            Some(ResolvedRoute {
                pattern: route.spec.pattern,
                label: route.spec.label,
                path: canonical,
                params,
                requirement,
            })
        })
    }

    fn requirement_for(&self, access: Access, params: &BTreeMap<String, String>) -> Option<AuthorizationRequirement> {
        let req = match access {
            Access::Public => return None,
            Access::Roles(roles) => AuthorizationRequirement::roles(roles.iter()),
            Access::RolesOrOwner { roles, owner_param } => {
                let base = AuthorizationRequirement::roles(roles.iter());
                match params.get(owner_param) {
                    Some(owner) => base.with_owner(owner.clone()),
                    None => base,
                }
            }
        };
        Some(
            req.redirect_unauthenticated_to(self.login_path.clone())
                .redirect_unauthorized_to(self.unauthorized_path.clone()),
        )
    }
}

fn match_segments(pattern: &[Segment], parts: &[&str]) -> Option<BTreeMap<String, String>> {
    if pattern.len() != parts.len() {
        return None;
    }
    let mut params = BTreeMap::new();
    for (seg, part) in pattern.iter().zip(parts) {
        match seg {
            Segment::Literal(lit) => {
                if lit != part {
                    return None;
                }
            }
            Segment::Param(name) => {
                let value = urlencoding::decode(part).ok()?.into_owned();
                params.insert((*name).to_string(), value);
            }
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::roles;

    #[test]
    fn resolves_literal_pages() {
        let t = RouteTable::default();
        let r = t.resolve("/insurance-management").unwrap();
        assert_eq!(r.label, "Insurance management");
        let req = r.requirement.unwrap();
        assert_eq!(req.allowed_roles, roles::set([MANAGER]));
        assert!(!req.owner_access);
        assert_eq!(req.redirect_unauthenticated, "/login");
        assert_eq!(req.redirect_unauthorized, "/dashboard");
    }

    #[test]
    fn public_pages_have_no_requirement() {
        let t = RouteTable::default();
        assert_eq!(t.resolve("/login").unwrap().requirement, None);
        assert_eq!(t.resolve("/").unwrap().requirement, None);
    }

    #[test]
    fn literal_beats_parameter_when_listed_first() {
        let t = RouteTable::default();
        assert_eq!(t.resolve("/cases/add").unwrap().pattern, "/cases/add");
        let view = t.resolve("/cases/view/c-12").unwrap();
        assert_eq!(view.pattern, "/cases/view/{id}");
        assert_eq!(view.params.get("id").map(String::as_str), Some("c-12"));
    }

    #[test]
    fn profile_binds_owner_from_path() {
        let t = RouteTable::new("/signin", "/home");
        let r = t.resolve("/profile/u%201/").unwrap();
        assert_eq!(r.path, "/profile/u%201");
        let req = r.requirement.unwrap();
        assert!(req.owner_access);
        assert_eq!(req.owner_id.as_deref(), Some("u 1"));
        assert_eq!(req.allowed_roles, roles::set([ADMIN]));
        assert_eq!(req.redirect_unauthenticated, "/signin");
        assert_eq!(req.redirect_unauthorized, "/home");
    }

    #[test]
    fn query_and_fragment_are_ignored_and_unknown_paths_miss() {
        let t = RouteTable::default();
        assert_eq!(t.resolve("/clients?page=2#top").unwrap().pattern, "/clients");
        assert!(t.resolve("/nowhere").is_none());
        assert!(t.resolve("/cases/view").is_none());
        assert!(t.resolve("/cases/view/1/extra").is_none());
    }

    #[test]
    fn every_protected_page_names_known_roles() {
        for spec in ROUTES {
            let allowed: &[&str] = match spec.access {
                Access::Public => continue,
                Access::Roles(r) => r,
                Access::RolesOrOwner { roles: r, .. } => r,
            };
            assert!(!allowed.is_empty(), "{} has no roles", spec.pattern);
            assert!(allowed.iter().all(|r| roles::ALL.contains(r)), "{}", spec.pattern);
        }
    }
}
