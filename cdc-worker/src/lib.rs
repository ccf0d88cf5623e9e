pub mod collector;
pub mod config;
pub mod context;
pub mod error;
pub mod fields;
pub mod pipeline;
pub mod planner;
pub mod publisher;
pub mod router;
