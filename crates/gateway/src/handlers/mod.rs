//! API handlers module

pub mod assist;
pub mod health;
pub mod search;
