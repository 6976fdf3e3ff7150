//! The console around the session core: page table, menu, navigation and the
//! HTTP collaborators that sign operators in and fetch backend resources.

pub mod api;
pub mod auth_client;
pub mod login_flow;
pub mod nav;
pub mod navigator;
pub mod routes;

pub use api::BackendClient;
pub use auth_client::{AuthClient, CredentialsAccepted, OtpVerified};
pub use login_flow::{LoginFlow, LoginStep, RESET_PASSWORD_PATH, VERIFY_OTP_PATH};
pub use nav::{profile_link, sign_out, visible_items, NavItem, NAV_ITEMS};
pub use navigator::HistoryNavigator;
pub use routes::{Access, ResolvedRoute, RouteSpec, RouteTable, ROUTES};
