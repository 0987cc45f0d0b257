/// Scene context and configuration.
pub mod config;
pub mod scene;
