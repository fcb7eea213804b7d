pub mod entities;
pub mod ollama;
pub mod traits;
