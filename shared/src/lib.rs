//! Shared types and business rules for the AgriTech-Benin cooperative platform
//!
//! This crate contains the domain model and the pure rules (yield, stock alerts,
//! movement application, role resolution) shared between the backend and the
//! browser-side WASM module. Nothing here touches the database or the network.

pub mod mailbox;
pub mod models;
pub mod types;
pub mod validation;

pub use mailbox::*;
pub use models::*;
pub use types::*;
pub use validation::*;
