mod chat;
mod chunk;
mod common;
mod conversation;

pub use chat::*;
pub use chunk::*;
pub use common::*;
pub use conversation::*;
