pub mod config;
pub mod importer;
pub mod runner;
