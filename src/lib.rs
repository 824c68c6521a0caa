pub mod builder;
pub mod config;
pub mod errors;
pub mod manifest;
pub mod orchestrator;
pub mod render;
pub mod revision;
pub mod site_config;
pub mod tracker;
pub mod ui;
pub mod util;
