pub mod catalog;
pub mod config;
pub mod coverage;
pub mod error;
pub mod financing;
pub mod invoice;
pub mod json_faker;
pub mod logging;
pub mod message;
pub mod reader;
pub mod recompute;
pub mod reporter;
pub mod sanitize;
pub mod schema;
pub mod session;
pub mod simulation;
pub mod state;
