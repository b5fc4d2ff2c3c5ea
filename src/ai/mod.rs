mod client;
mod inference;
pub mod interpreter;

pub use client::{ChatCompletionsClient, JudgmentClient};
pub use interpreter::{interpret, Judgment};
