//! Type definitions for Rebound

mod execution;
mod policy;
mod strategy;

pub use execution::*;
pub use policy::*;
pub use strategy::*;
