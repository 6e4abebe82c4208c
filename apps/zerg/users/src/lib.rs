//! Users gRPC Service
//!
//! Account registration, credential checks and content authorization over gRPC.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   ↓ (gRPC, Zstd, x-request-id)
//! UsersGrpc / AuthenticationGrpc / AuthorizationGrpc (service.rs)
//!   ↓ (proto ↔ domain conversions, UserError → Status)
//! UserService / AuthenticationService / AuthorizationService (domain_users)
//!   ↓
//! PgUnitOfWorkFactory + PgUserQueryService
//!   ↓
//! PostgreSQL
//! ```
//!
//! ## Modules
//!
//! - `server`: bootstrap, health reporting and graceful shutdown
//! - `service`: tonic trait implementations
//! - `conversions`: role/id mapping and error classification

pub mod conversions;
pub mod server;
pub mod service;

pub use server::{run, serve};
pub use service::{AuthenticationGrpc, AuthorizationGrpc, UsersGrpc};
