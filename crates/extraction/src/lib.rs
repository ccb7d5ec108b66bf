//! Knowledge-extraction client.
//!
//! Turns free text into question/answer pairs by calling an external
//! chat-completion API and parsing its reply as a strict JSON array.
//! The model is asked for bare JSON but routinely wraps it in Markdown
//! fences or prose, so parsing recovers by fence-stripping and slicing to
//! the outermost brackets before giving up.

mod client;

pub use client::{ExtractionClient, ExtractionError, QaExtractor, QaPair};
