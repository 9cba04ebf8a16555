pub mod conversation;
pub mod response;
pub mod statement;

pub use conversation::*;
pub use response::*;
pub use statement::*;
