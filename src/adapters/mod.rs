//! Concrete adapter implementations for ports.

pub mod assigner;
pub mod console_report_adapter;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod html_report_adapter;
#[cfg(feature = "ibkr")]
pub mod ibkr_adapter;
pub mod json_cache_adapter;
