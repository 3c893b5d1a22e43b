//! Shared types for the HTML5 parsing path.
//!
//! Downstream consumers import these via `html::html5::{Token, ParseError, ...}`
//! rather than reaching into this module directly, to preserve API flexibility.

mod atom;
mod context;
mod counters;
mod dom;
mod error;
mod input;
mod token;

pub use atom::{AtomId, AtomTable};
pub use context::DocumentParseContext;
pub use counters::Counters;
pub use dom::{Document, ElementData, Node, NodeData, NodeId, QuirksMode};
pub use error::{ErrorPolicy, Location, ParseError, ParseErrorKind};
pub use input::decode_bytes;
pub use token::{Attribute, Token};
