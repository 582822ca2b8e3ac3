pub mod mutations;
pub mod response;
pub mod views;

pub use mutations::*;
pub use response::*;
pub use views::*;
