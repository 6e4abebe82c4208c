//! Users Domain
//!
//! Registration, credential verification and role-based authorization for user
//! accounts.
//!
//! # Architecture
//!
//! ```text
//!            writes                               reads
//! ┌──────────────────────┐        ┌──────────────────────────────────────┐
//! │     UserService      │        │ AuthenticationService                │
//! │  (AddUser workflow)  │        │ AuthorizationService                 │
//! └──────────┬───────────┘        └──────────────────┬───────────────────┘
//!            │                                       │
//! ┌──────────▼───────────┐        ┌──────────────────▼───────────────────┐
//! │  UnitOfWorkFactory   │        │          UserQueryService            │
//! │  └─ UnitOfWork       │        │   (no transaction, read-only view)   │
//! │     └─ UserRepository│        └──────────────────────────────────────┘
//! └──────────────────────┘
//!            │ CredentialDigest (salted, one-way) feeds both sides
//! ```
//!
//! Postgres adapters live in [`postgres`]; [`in_memory`] backs tests and local runs.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{InMemoryUserStore, Role, Sha256Digest, UserService};
//!
//! # async fn demo() -> domain_users::UserResult<()> {
//! let store = InMemoryUserStore::new();
//! let service = UserService::new(store.clone(), Sha256Digest::new("salt"));
//!
//! let id = service.register("a@x.com", "secret", Role::Creator).await?;
//! # let _ = id;
//! # Ok(())
//! # }
//! ```

pub mod auth;
#[cfg(feature = "config")]
pub mod config;
pub mod digest;
pub mod entity;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod query;
pub mod repository;
pub mod service;
pub mod unit_of_work;

// Re-export commonly used types
pub use auth::{AuthenticatedUser, AuthenticationService, AuthorizationService};
#[cfg(feature = "config")]
pub use config::DigestConfig;
pub use digest::{CredentialDigest, Sha256Digest};
pub use error::{UserError, UserKey, UserResult};
pub use in_memory::InMemoryUserStore;
pub use models::{Role, User, UserId};
pub use postgres::{PgUnitOfWork, PgUnitOfWorkFactory, PgUserQueryService, PgUserRepository};
pub use query::{UserQueryService, UserView};
pub use repository::UserRepository;
pub use service::UserService;
pub use unit_of_work::{UnitOfWork, UnitOfWorkFactory, run_in_unit_of_work};
