pub mod connection;
pub mod migrations;
pub mod routine_repo;
pub mod task_repo;

pub use connection::*;
