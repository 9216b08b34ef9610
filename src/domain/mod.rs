//! Core domain types and logic.

pub mod error;
pub mod strategy;
pub mod holding;
pub mod price_history;
pub mod portfolio;
pub mod risk;
pub mod summary;
pub mod config_validation;
