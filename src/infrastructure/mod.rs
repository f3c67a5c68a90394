pub mod bootstrap;
pub mod config;
pub mod csv;
pub mod model;
pub mod storage;
