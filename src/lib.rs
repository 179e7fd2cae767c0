//! entity-relations library: relationship graphs over the types and callables of a Python unit.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod server;
