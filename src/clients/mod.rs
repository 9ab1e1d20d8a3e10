// src/clients/mod.rs
//! Remote collaborators: trademark lookup, text embedding, text generation.
//! Each is a trait with one production implementation, so handlers and
//! tests can swap in mocks.

pub mod embedding;
pub mod generative;
pub mod trademark;

pub use embedding::{Embedder, GeminiEmbedder};
pub use generative::{GeminiGenerator, GenerateRequest, PhraseGenerator};
pub use trademark::{LookupOutcome, RapidApiTrademarkClient, TrademarkLookup};
