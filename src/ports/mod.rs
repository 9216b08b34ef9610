//! Port traits between the domain and the outside world.

pub mod assigner_port;
pub mod broker_port;
pub mod config_port;
pub mod report_port;
pub mod store_port;
