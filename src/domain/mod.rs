pub mod entity;
pub mod signature;
pub mod annotation;
pub mod scanner;
pub mod edge;
pub mod graph;
pub mod builder;
pub mod analysis;
pub mod error;
pub mod ports;
