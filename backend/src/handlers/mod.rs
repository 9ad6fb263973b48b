//! HTTP request handlers

pub mod admin;
pub mod auth;
pub mod contact;
pub mod dashboard;
pub mod geography;
pub mod harvest;
pub mod health;
pub mod producer;
pub mod stock;

pub use admin::*;
pub use auth::*;
pub use contact::*;
pub use dashboard::*;
pub use geography::*;
pub use harvest::*;
pub use health::*;
pub use producer::*;
pub use stock::*;
