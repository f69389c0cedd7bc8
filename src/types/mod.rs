//! Public types for the Huginn API.

mod generate;
mod reply;

pub use generate::{DEFAULT_MAX_TOKENS, GenerateOptions};
pub use reply::{Reply, ReplySource};
