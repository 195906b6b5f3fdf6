//! Top-level facade crate for crudscope.
//!
//! Re-exports core types and the server library so users can depend on a single crate.

pub mod core {
    pub use crudscope_core::*;
}

pub mod server {
    pub use crudscope_server::*;
}
