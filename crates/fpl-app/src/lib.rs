// Application layer for the fpl-squad binary: configuration, command line
// and run orchestration over fpl-core.

pub mod cli;
pub mod config;
pub mod run;
