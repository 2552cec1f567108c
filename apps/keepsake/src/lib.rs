//! # keepsake (library surface)
//!
//! The binary's modules, exposed as a library so integration tests can
//! build the router and configuration without spawning a process.

pub mod api;
pub mod cli;
pub mod config;
pub mod timesync;
