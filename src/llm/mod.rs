// Generation backends, retry policy and prompt building

pub mod client;
pub mod prompts;
pub mod retry;

pub use client::LlmClient;
pub use prompts::{ChildDoc, Documenter};
pub use retry::{AttemptError, RetryPolicy};

use crate::error::Result;

/// Turns a prompt into generated text
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt)
    }
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt)
    }
}
