//! HTML5 tokenization and tree construction.
//!
//! Public API lives under [`html5`]; see that module for the tokenizer and
//! tree-builder entry points.

pub mod html5;

pub use html5::{parse_document, Document, NodeData, NodeId, QuirksMode};
