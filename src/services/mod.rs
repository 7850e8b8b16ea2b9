pub mod auth_service;
pub use auth_service::{AuthError, AuthService};

pub mod auth_service_impl;
pub use auth_service_impl::CredentialStore;

pub mod user_service;
pub use user_service::{NewUser, UserChanges, UserError, UserService};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;
