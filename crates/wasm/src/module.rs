//! The parsed module shape: one struct per WASM binary section.
//!
//! https://webassembly.github.io/spec/core/syntax/modules.html

use crate::instructions::Instruction;
use crate::types::{FuncIdx, FunctionType, GlobalType, MemType, TableType, TypeIdx, ValueType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSection {
    pub types: Vec<FunctionType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportDescription {
    Function(TypeIdx),
    Table(TableType),
    Memory(MemType),
    Global(GlobalType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub description: ImportDescription,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSection {
    pub imports: Vec<Import>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSection {
    pub type_indices: Vec<TypeIdx>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSection {
    pub tables: Vec<TableType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySection {
    pub memories: Vec<MemType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    pub global_type: GlobalType,
    pub init: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSection {
    pub globals: Vec<Global>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportType {
    Function = 0,
    Table = 1,
    Memory = 2,
    Global = 3,
}

impl ExportType {
    pub(crate) fn from_binary_tag(byte: u8) -> Option<ExportType> {
        match byte {
            0 => Some(ExportType::Function),
            1 => Some(ExportType::Table),
            2 => Some(ExportType::Memory),
            3 => Some(ExportType::Global),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub export_type: ExportType,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSection {
    pub exports: Vec<Export>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartSection {
    pub start: FuncIdx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Local {
    pub count: u32,
    pub value_type: ValueType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    pub code: Vec<Instruction>,
    pub locals: Vec<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSection {
    pub entries: Vec<CodeEntry>,
}

/// https://webassembly.github.io/spec/core/binary/modules.html#data-section
///
/// The three-valued tag from the binary format (0 active-default-memory, 1
/// passive, 2 active-with-memory-index) collapses to two Rust variants: an
/// active segment's `memory_idx` defaults to 0 when the binary used tag 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    Passive { data: Vec<u8> },
    Active { memory_idx: u32, offset: Vec<Instruction>, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSection {
    pub data: Vec<Data>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataCountSection {
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSection {
    pub name: String,
    pub data: Vec<u8>,
}

/// https://webassembly.github.io/spec/core/syntax/modules.html
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Module {
    pub type_section: Option<TypeSection>,
    pub import_section: Option<ImportSection>,
    pub function_section: Option<FunctionSection>,
    pub table_section: Option<TableSection>,
    pub memory_section: Option<MemorySection>,
    pub global_section: Option<GlobalSection>,
    pub export_section: Option<ExportSection>,
    pub start_section: Option<StartSection>,
    pub code_section: Option<CodeSection>,
    pub data_section: Option<DataSection>,
    pub data_count_section: Option<DataCountSection>,
    pub custom_sections: Vec<CustomSection>,
}
