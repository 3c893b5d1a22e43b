//! A WASM binary decoder, validator, and small flat-slice interpreter.

pub mod byte_code_parser;
pub mod instructions;
pub mod interpreter;
pub mod leb128;
pub mod module;
pub mod types;
pub mod validator;

pub use byte_code_parser::{parse_module, ModuleParseError};
pub use interpreter::{Interpreter, Trap, Value};
pub use module::Module;
pub use validator::{validate_module, ValidationError};
