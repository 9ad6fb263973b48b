//! Domain models for the AgriTech-Benin platform

mod account;
mod contact;
mod geography;
mod harvest;
mod producer;
mod warehouse;

pub use account::*;
pub use contact::*;
pub use geography::*;
pub use harvest::*;
pub use producer::*;
pub use warehouse::*;
