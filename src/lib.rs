pub mod check;
pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod fix;
pub mod menu;
pub mod output;
pub mod report;
pub mod setup;
pub mod sysroot;
