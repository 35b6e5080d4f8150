//! Shared types for the storefront client: catalog and chat models, the
//! backend's wire protocol, and the client error taxonomy.

pub mod error;
pub mod models;
pub mod protocol;

pub use error::*;
pub use models::*;
pub use protocol::*;
