//! Protobuf contract for the `users.v1` package.
//!
//! Code under `generated/` is produced by `buf generate` from
//! `proto/users/v1/users.proto` and checked in, so building this crate needs no `protoc`.

#[allow(clippy::all)]
mod generated;

pub use generated::users;
