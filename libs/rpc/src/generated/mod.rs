// @generated
// This file wires up buf-generated protobuf code
// Note: The prost files already include!() the tonic files automatically

pub mod users {
    include!("users.v1.rs");
    // users.v1.tonic.rs is auto-included by users.v1.rs
}
