//! HTML5 parsing path: tokenizer plus tree-construction state machine,
//! wired together by [`parse_document`].

pub(crate) mod shared;
pub mod tokenizer;
pub mod tree_builder;

// Public re-exports: consumers should import from `html::html5::*` rather than `shared::*`.
pub use shared::{
    AtomId, AtomTable, Attribute, Counters, Document, DocumentParseContext, ElementData,
    ErrorPolicy, Location, Node, NodeData, NodeId, ParseError, ParseErrorKind, QuirksMode, Token,
};
pub use tokenizer::states::State as TokenizerState;
pub use tokenizer::{TokenCollector, TokenSink, Tokenizer};
pub use tree_builder::{
    SuspendReason, TreeBuilder, TreeBuilderConfig, TreeBuilderError, TreeBuilderStepResult,
};

/// Parses a complete document from a UTF-8 byte stream: decode, tokenize,
/// and drive the tree-construction state machine to completion.
///
/// This is the single entry point a consumer outside this crate needs;
/// [`Tokenizer`] and [`TreeBuilder`] remain public for callers (and tests)
/// that want to drive the two stages independently.
pub fn parse_document(bytes: &[u8]) -> (Document, AtomTable) {
    let text = shared::decode_bytes(bytes);
    let mut tokenizer = Tokenizer::new(&text);
    let mut builder = TreeBuilder::new(TreeBuilderConfig::default());
    tokenizer.run(&mut builder);
    builder.finish()
}
