pub mod config;
pub mod error;
pub mod order;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod section;
