pub mod routine;
pub mod task;

pub use routine::*;
pub use task::*;
