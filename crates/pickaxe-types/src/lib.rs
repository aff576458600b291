pub mod chat;
pub mod types;

pub use chat::*;
pub use types::*;
