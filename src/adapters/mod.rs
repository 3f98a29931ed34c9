// Adapters layer: concrete implementations of the domain ports for external systems.
// The marketplace scraper lives in core::marketplace next to its extraction heuristics.

pub mod gemini;

pub use gemini::{GeminiClient, GeminiSettings};
