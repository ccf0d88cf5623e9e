pub mod change_event;
pub mod config;
pub mod error;
pub mod metrics;
pub mod record;
pub mod salesforce;
pub mod sink;
pub mod transport;
