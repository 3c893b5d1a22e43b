//! Decodes the WASM binary module format into a [`Module`].
//!
//! https://webassembly.github.io/spec/core/binary/modules.html

use crate::instructions::{self, opcode, BlockType, Instruction, MemArg};
use crate::leb128;
use crate::module::{
    CodeEntry, CodeSection, CustomSection, Data, DataCountSection, DataSection, Export,
    ExportSection, ExportType, FunctionSection, Global, GlobalSection, Import,
    ImportDescription, ImportSection, Local, MemorySection, Module, StartSection, TableSection,
    TypeSection,
};
use crate::types::{FunctionType, GlobalType, Limits, Mutability, TableType, TypeIdx, ValueType};

/// 100% made up, same as the upstream engine's comment admits: a bound on
/// every vector-of-T and custom-section byte count, to keep a malformed
/// length field from causing an enormous allocation.
const MAX_SEQUENCE_SIZE: usize = u16::MAX as usize;

const MAGIC: &[u8; 4] = b"\0asm";
const VERSION: &[u8; 4] = b"\x01\0\0\0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleParseError {
    InvalidMagic,
    UnsupportedVersion,
    UnexpectedEof,
    InvalidSectionId,
    InvalidSize,
    InvalidTypeSection,
    InvalidImportSection,
    InvalidFunctionSection,
    InvalidTableSection,
    InvalidMemorySection,
    InvalidGlobalSection,
    InvalidExportSection,
    InvalidStartSection,
    InvalidCodeSection,
    InvalidDataSection,
    InvalidDataCountSection,
    InvalidCustomSection,
    UnhandledSection,
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_u8(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn read_u32_leb(&mut self) -> Result<u32, leb128::Leb128ParseError> {
        leb128::decode_u32(self.data, &mut self.pos)
    }

    fn read_i32_leb(&mut self) -> Option<i32> {
        leb128::decode_i32(self.data, &mut self.pos).ok()
    }

    fn tell(&self) -> usize {
        self.pos
    }
}

fn parse_string(r: &mut Reader<'_>) -> Option<String> {
    let len = r.read_u32_leb().ok()?;
    if len as usize > MAX_SEQUENCE_SIZE {
        return None;
    }

    let bytes = r.read_bytes(len as usize)?;
    // TODO(wasm): handle non-ASCII; names must be valid UTF-8.
    if bytes.iter().any(|&b| b > 0x7f) {
        return None;
    }

    Some(String::from_utf8_lossy(bytes).into_owned())
}

fn parse_value_type(r: &mut Reader<'_>) -> Option<ValueType> {
    ValueType::from_binary_tag(r.read_u8()?)
}

fn parse_limits(r: &mut Reader<'_>) -> Option<Limits> {
    let has_max = r.read_u8()?;
    if has_max > 1 {
        return None;
    }

    let min = r.read_u32_leb().ok()?;
    if has_max == 0 {
        return Some(Limits { min, max: None });
    }

    let max = r.read_u32_leb().ok()?;
    Some(Limits { min, max: Some(max) })
}

fn parse_global_type(r: &mut Reader<'_>) -> Option<GlobalType> {
    let value_type = parse_value_type(r)?;
    let mutability = match r.read_u8()? {
        0 => Mutability::Const,
        1 => Mutability::Var,
        _ => return None,
    };
    Some(GlobalType { value_type, mutability })
}

fn parse_global(r: &mut Reader<'_>) -> Option<Global> {
    let global_type = parse_global_type(r)?;
    let init = parse_instructions(r)?;
    Some(Global { global_type, init })
}

fn parse_function_type(r: &mut Reader<'_>) -> Option<FunctionType> {
    if r.read_u8()? != 0x60 {
        return None;
    }

    let parameters = parse_vector(r, parse_value_type)?;
    let results = parse_vector(r, parse_value_type)?;
    Some(FunctionType { parameters, results })
}

fn parse_table_type(r: &mut Reader<'_>) -> Option<TableType> {
    let element_type = parse_value_type(r)?;
    if !matches!(element_type, ValueType::FunctionReference | ValueType::ExternReference) {
        return None;
    }

    let limits = parse_limits(r)?;
    Some(TableType { element_type, limits })
}

fn parse_export(r: &mut Reader<'_>) -> Option<Export> {
    let name = parse_string(r)?;
    let tag = r.read_u8()?;
    if tag > 0x03 {
        return None;
    }

    let index = r.read_u32_leb().ok()?;
    Some(Export { name, export_type: ExportType::from_binary_tag(tag)?, index })
}

fn parse_local(r: &mut Reader<'_>) -> Option<Local> {
    let count = r.read_u32_leb().ok()?;
    let value_type = parse_value_type(r)?;
    Some(Local { count, value_type })
}

fn parse_code_entry(r: &mut Reader<'_>) -> Option<CodeEntry> {
    let _size = r.read_u32_leb().ok()?;
    let locals = parse_vector(r, parse_local)?;
    let code = parse_instructions(r)?;
    Some(CodeEntry { code, locals })
}

fn parse_data(r: &mut Reader<'_>) -> Option<Data> {
    const ACTIVE_DEFAULT_MEMORY: u32 = 0;
    const PASSIVE: u32 = 1;
    const ACTIVE_WITH_MEMORY_IDX: u32 = 2;

    let tag = r.read_u32_leb().ok()?;

    if tag == PASSIVE {
        let data = parse_byte_vector(r)?;
        return Some(Data::Passive { data });
    }

    let memory_idx = if tag == ACTIVE_WITH_MEMORY_IDX {
        r.read_u32_leb().ok()?
    } else if tag == ACTIVE_DEFAULT_MEMORY {
        0
    } else {
        return None;
    };

    let offset = parse_instructions(r)?;
    let data = parse_byte_vector(r)?;
    Some(Data::Active { memory_idx, offset, data })
}

fn parse_import(r: &mut Reader<'_>) -> Option<Import> {
    let module = parse_string(r)?;
    let name = parse_string(r)?;
    let kind = r.read_u8()?;

    let description = match kind {
        0x00 => ImportDescription::Function(r.read_u32_leb().ok()? as TypeIdx),
        0x01 => ImportDescription::Table(parse_table_type(r)?),
        0x02 => ImportDescription::Memory(parse_limits(r)?),
        0x03 => ImportDescription::Global(parse_global_type(r)?),
        _ => return None,
    };

    Some(Import { module, name, description })
}

fn parse_block_type(r: &mut Reader<'_>) -> Option<BlockType> {
    const EMPTY_TAG: u8 = 0x40;
    let tag = r.read_u8()?;
    if tag == EMPTY_TAG {
        return Some(BlockType::Empty);
    }

    ValueType::from_binary_tag(tag).map(BlockType::Value)
}

fn parse_mem_arg(r: &mut Reader<'_>) -> Option<MemArg> {
    let align = r.read_u32_leb().ok()?;
    let offset = r.read_u32_leb().ok()?;
    Some(MemArg { align, offset })
}

fn parse_vector<T>(r: &mut Reader<'_>, mut parse_one: impl FnMut(&mut Reader<'_>) -> Option<T>) -> Option<Vec<T>> {
    let count = r.read_u32_leb().ok()?;
    if count as usize > MAX_SEQUENCE_SIZE {
        return None;
    }

    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        items.push(parse_one(r)?);
    }
    Some(items)
}

fn parse_byte_vector(r: &mut Reader<'_>) -> Option<Vec<u8>> {
    let count = r.read_u32_leb().ok()?;
    if count as usize > MAX_SEQUENCE_SIZE {
        return None;
    }
    r.read_bytes(count as usize).map(<[u8]>::to_vec)
}

/// https://webassembly.github.io/spec/core/binary/instructions.html
///
/// Blocks/loops push a nesting level; an End at nesting zero terminates the
/// sequence (the sequence itself is never wrapped in its own Block, matching
/// how code-entry bodies and offset/init expressions are both just "a run of
/// instructions up to the matching End").
fn parse_instructions(r: &mut Reader<'_>) -> Option<Vec<Instruction>> {
    let mut out = Vec::new();
    let mut nesting = 0i32;

    loop {
        let op = r.read_u8()?;

        match op {
            opcode::SELECT => out.push(Instruction::Select(instructions::Select)),
            opcode::BLOCK => {
                let block_type = parse_block_type(r)?;
                out.push(Instruction::Block(instructions::Block { block_type }));
                nesting += 1;
            }
            opcode::LOOP => {
                let block_type = parse_block_type(r)?;
                out.push(Instruction::Loop(instructions::Loop { block_type }));
                nesting += 1;
            }
            opcode::BRANCH => {
                let label_idx = r.read_u32_leb().ok()?;
                out.push(Instruction::Branch(instructions::Branch { label_idx }));
            }
            opcode::BRANCH_IF => {
                let label_idx = r.read_u32_leb().ok()?;
                out.push(Instruction::BranchIf(instructions::BranchIf { label_idx }));
            }
            opcode::CALL => {
                let func_idx = r.read_u32_leb().ok()?;
                out.push(Instruction::Call(instructions::Call { func_idx }));
            }
            opcode::RETURN => out.push(Instruction::Return(instructions::Return)),
            opcode::END => {
                out.push(Instruction::End(instructions::End));
                if nesting == 0 {
                    return Some(out);
                }
                nesting -= 1;
            }
            opcode::I32_CONST => {
                let value = r.read_i32_leb()?;
                out.push(Instruction::I32Const(instructions::I32Const { value }));
            }
            opcode::I32_EQZ => out.push(Instruction::I32EqualZero(instructions::I32EqualZero)),
            opcode::I32_EQ => out.push(Instruction::I32Equal(instructions::I32Equal)),
            opcode::I32_NE => out.push(Instruction::I32NotEqual(instructions::I32NotEqual)),
            opcode::I32_LT_S => out.push(Instruction::I32LessThanSigned(instructions::I32LessThanSigned)),
            opcode::I32_LT_U => out.push(Instruction::I32LessThanUnsigned(instructions::I32LessThanUnsigned)),
            opcode::I32_GT_S => out.push(Instruction::I32GreaterThanSigned(instructions::I32GreaterThanSigned)),
            opcode::I32_GT_U => out.push(Instruction::I32GreaterThanUnsigned(instructions::I32GreaterThanUnsigned)),
            opcode::I32_LE_S => out.push(Instruction::I32LessThanEqualSigned(instructions::I32LessThanEqualSigned)),
            opcode::I32_LE_U => {
                out.push(Instruction::I32LessThanEqualUnsigned(instructions::I32LessThanEqualUnsigned))
            }
            opcode::I32_GE_S => {
                out.push(Instruction::I32GreaterThanEqualSigned(instructions::I32GreaterThanEqualSigned))
            }
            opcode::I32_GE_U => {
                out.push(Instruction::I32GreaterThanEqualUnsigned(instructions::I32GreaterThanEqualUnsigned))
            }
            opcode::I32_CLZ => out.push(Instruction::I32CountLeadingZeros(instructions::I32CountLeadingZeros)),
            opcode::I32_CTZ => out.push(Instruction::I32CountTrailingZeros(instructions::I32CountTrailingZeros)),
            opcode::I32_POPCNT => out.push(Instruction::I32PopulationCount(instructions::I32PopulationCount)),
            opcode::I32_ADD => out.push(Instruction::I32Add(instructions::I32Add)),
            opcode::I32_SUB => out.push(Instruction::I32Subtract(instructions::I32Subtract)),
            opcode::I32_MUL => out.push(Instruction::I32Multiply(instructions::I32Multiply)),
            opcode::I32_DIV_S => out.push(Instruction::I32DivideSigned(instructions::I32DivideSigned)),
            opcode::I32_DIV_U => out.push(Instruction::I32DivideUnsigned(instructions::I32DivideUnsigned)),
            opcode::I32_REM_S => out.push(Instruction::I32RemainderSigned(instructions::I32RemainderSigned)),
            opcode::I32_REM_U => out.push(Instruction::I32RemainderUnsigned(instructions::I32RemainderUnsigned)),
            opcode::I32_AND => out.push(Instruction::I32And(instructions::I32And)),
            opcode::I32_OR => out.push(Instruction::I32Or(instructions::I32Or)),
            opcode::I32_XOR => out.push(Instruction::I32ExclusiveOr(instructions::I32ExclusiveOr)),
            opcode::I32_SHL => out.push(Instruction::I32ShiftLeft(instructions::I32ShiftLeft)),
            opcode::I32_SHR_S => out.push(Instruction::I32ShiftRightSigned(instructions::I32ShiftRightSigned)),
            opcode::I32_SHR_U => out.push(Instruction::I32ShiftRightUnsigned(instructions::I32ShiftRightUnsigned)),
            opcode::I32_ROTL => out.push(Instruction::I32RotateLeft(instructions::I32RotateLeft)),
            opcode::I32_ROTR => out.push(Instruction::I32RotateRight(instructions::I32RotateRight)),
            opcode::I32_WRAP_I64 => out.push(Instruction::I32WrapI64(instructions::I32WrapI64)),
            opcode::I32_TRUNC_F32_S => out.push(Instruction::I32TruncateF32Signed(instructions::I32TruncateF32Signed)),
            opcode::I32_TRUNC_F32_U => {
                out.push(Instruction::I32TruncateF32Unsigned(instructions::I32TruncateF32Unsigned))
            }
            opcode::I32_TRUNC_F64_S => out.push(Instruction::I32TruncateF64Signed(instructions::I32TruncateF64Signed)),
            opcode::I32_TRUNC_F64_U => {
                out.push(Instruction::I32TruncateF64Unsigned(instructions::I32TruncateF64Unsigned))
            }
            opcode::I32_REINTERPRET_F32 => out.push(Instruction::I32ReinterpretF32(instructions::I32ReinterpretF32)),
            opcode::I32_EXTEND8_S => out.push(Instruction::I32Extend8Signed(instructions::I32Extend8Signed)),
            opcode::I32_EXTEND16_S => out.push(Instruction::I32Extend16Signed(instructions::I32Extend16Signed)),
            opcode::LOCAL_GET => {
                let idx = r.read_u32_leb().ok()?;
                out.push(Instruction::LocalGet(instructions::LocalGet { idx }));
            }
            opcode::LOCAL_SET => {
                let idx = r.read_u32_leb().ok()?;
                out.push(Instruction::LocalSet(instructions::LocalSet { idx }));
            }
            opcode::LOCAL_TEE => {
                let idx = r.read_u32_leb().ok()?;
                out.push(Instruction::LocalTee(instructions::LocalTee { idx }));
            }
            opcode::GLOBAL_GET => {
                let global_idx = r.read_u32_leb().ok()?;
                out.push(Instruction::GlobalGet(instructions::GlobalGet { global_idx }));
            }
            opcode::GLOBAL_SET => {
                let global_idx = r.read_u32_leb().ok()?;
                out.push(Instruction::GlobalSet(instructions::GlobalSet { global_idx }));
            }
            opcode::I32_LOAD => {
                let arg = parse_mem_arg(r)?;
                out.push(Instruction::I32Load(instructions::I32Load { arg }));
            }
            opcode::I32_STORE => {
                let arg = parse_mem_arg(r)?;
                out.push(Instruction::I32Store(instructions::I32Store { arg }));
            }
            _ => {
                log::trace!(target: "wasm.parse", "unhandled opcode 0x{op:02x}");
                return None;
            }
        }
    }
}

/// https://webassembly.github.io/spec/core/binary/modules.html#sections
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionId {
    Custom = 0,
    Type = 1,
    Import = 2,
    Function = 3,
    Table = 4,
    Memory = 5,
    Global = 6,
    Export = 7,
    Start = 8,
    Element = 9,
    Code = 10,
    Data = 11,
    DataCount = 12,
}

impl SectionId {
    fn from_byte(byte: u8) -> Option<SectionId> {
        Some(match byte {
            0 => SectionId::Custom,
            1 => SectionId::Type,
            2 => SectionId::Import,
            3 => SectionId::Function,
            4 => SectionId::Table,
            5 => SectionId::Memory,
            6 => SectionId::Global,
            7 => SectionId::Export,
            8 => SectionId::Start,
            9 => SectionId::Element,
            10 => SectionId::Code,
            11 => SectionId::Data,
            12 => SectionId::DataCount,
            _ => return None,
        })
    }
}

pub fn parse_module(data: &[u8]) -> Result<Module, ModuleParseError> {
    let mut r = Reader::new(data);

    if r.read_bytes(MAGIC.len()) != Some(MAGIC.as_slice()) {
        return Err(ModuleParseError::InvalidMagic);
    }

    if r.read_bytes(VERSION.len()) != Some(VERSION.as_slice()) {
        return Err(ModuleParseError::UnsupportedVersion);
    }

    let mut module = Module::default();

    loop {
        let Some(id_byte) = r.read_u8() else {
            // Zero or more complete sections read; we're done.
            break;
        };

        let Some(id) = SectionId::from_byte(id_byte) else {
            return Err(ModuleParseError::InvalidSectionId);
        };

        let size = match r.read_u32_leb() {
            Ok(size) => size,
            Err(leb128::Leb128ParseError::UnexpectedEof) => return Err(ModuleParseError::UnexpectedEof),
            Err(_) => return Err(ModuleParseError::InvalidSize),
        };

        match id {
            SectionId::Custom => {
                let before = r.tell();
                let name = parse_string(&mut r).ok_or(ModuleParseError::InvalidCustomSection)?;
                let consumed_by_name = r.tell() - before;
                let remaining = (size as usize)
                    .checked_sub(consumed_by_name)
                    .ok_or(ModuleParseError::InvalidCustomSection)?;
                if remaining > MAX_SEQUENCE_SIZE {
                    return Err(ModuleParseError::InvalidCustomSection);
                }

                let data = r.read_bytes(remaining).ok_or(ModuleParseError::InvalidCustomSection)?;
                module.custom_sections.push(CustomSection { name, data: data.to_vec() });
            }
            SectionId::Type => {
                let types = parse_vector(&mut r, parse_function_type).ok_or(ModuleParseError::InvalidTypeSection)?;
                module.type_section = Some(TypeSection { types });
            }
            SectionId::Import => {
                let imports = parse_vector(&mut r, parse_import).ok_or(ModuleParseError::InvalidImportSection)?;
                module.import_section = Some(ImportSection { imports });
            }
            SectionId::Function => {
                let type_indices =
                    parse_vector(&mut r, |r| r.read_u32_leb().ok()).ok_or(ModuleParseError::InvalidFunctionSection)?;
                module.function_section = Some(FunctionSection { type_indices });
            }
            SectionId::Table => {
                let tables = parse_vector(&mut r, parse_table_type).ok_or(ModuleParseError::InvalidTableSection)?;
                module.table_section = Some(TableSection { tables });
            }
            SectionId::Memory => {
                let memories = parse_vector(&mut r, parse_limits).ok_or(ModuleParseError::InvalidMemorySection)?;
                module.memory_section = Some(MemorySection { memories });
            }
            SectionId::Global => {
                let globals = parse_vector(&mut r, parse_global).ok_or(ModuleParseError::InvalidGlobalSection)?;
                module.global_section = Some(GlobalSection { globals });
            }
            SectionId::Export => {
                let exports = parse_vector(&mut r, parse_export).ok_or(ModuleParseError::InvalidExportSection)?;
                module.export_section = Some(ExportSection { exports });
            }
            SectionId::Start => {
                let start = r.read_u32_leb().map_err(|_| ModuleParseError::InvalidStartSection)?;
                module.start_section = Some(StartSection { start });
            }
            SectionId::Element => {
                log::trace!(target: "wasm.parse", "element sections are not supported");
                return Err(ModuleParseError::UnhandledSection);
            }
            SectionId::Code => {
                let entries = parse_vector(&mut r, parse_code_entry).ok_or(ModuleParseError::InvalidCodeSection)?;
                module.code_section = Some(CodeSection { entries });
            }
            SectionId::Data => {
                let data = parse_vector(&mut r, parse_data).ok_or(ModuleParseError::InvalidDataSection)?;
                module.data_section = Some(DataSection { data });
            }
            SectionId::DataCount => {
                let count = r.read_u32_leb().map_err(|_| ModuleParseError::InvalidDataCountSection)?;
                module.data_count_section = Some(DataCountSection { count });
            }
        }
    }

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_module_parses() {
        let module = parse_module(b"\0asm\x01\0\0\0").unwrap();
        assert_eq!(module, Module::default());
    }

    #[test]
    fn rejects_bad_magic() {
        assert_eq!(parse_module(b"hello"), Err(ModuleParseError::InvalidMagic));
    }

    #[test]
    fn rejects_unsupported_version() {
        assert_eq!(parse_module(b"\0asm\x02\0\0\0"), Err(ModuleParseError::UnsupportedVersion));
    }

    #[test]
    fn element_section_is_unhandled() {
        // Section id 9 (Element), size 1, one arbitrary payload byte.
        let mut bytes = b"\0asm\x01\0\0\0".to_vec();
        bytes.extend_from_slice(&[9, 1, 0]);
        assert_eq!(parse_module(&bytes), Err(ModuleParseError::UnhandledSection));
    }

    #[test]
    fn function_and_code_sections_have_matching_length() {
        let mut bytes = b"\0asm\x01\0\0\0".to_vec();
        // Type section: one function type () -> ().
        bytes.extend_from_slice(&[1, 4, 1, 0x60, 0, 0]);
        // Function section: one function using type 0.
        bytes.extend_from_slice(&[3, 2, 1, 0]);
        // Code section: one empty-bodied function (just `end`).
        bytes.extend_from_slice(&[10, 4, 1, 2, 0, 0x0b]);

        let module = parse_module(&bytes).unwrap();
        let fs = module.function_section.unwrap();
        let cs = module.code_section.unwrap();
        assert_eq!(fs.type_indices.len(), cs.entries.len());
    }

    #[test]
    fn custom_section_is_preserved_verbatim() {
        let mut bytes = b"\0asm\x01\0\0\0".to_vec();
        // Custom section: name "x" (1-byte LEB length + 'x') + 2 payload bytes.
        bytes.extend_from_slice(&[0, 4, 1, b'x', 0xaa, 0xbb]);

        let module = parse_module(&bytes).unwrap();
        assert_eq!(module.custom_sections.len(), 1);
        assert_eq!(module.custom_sections[0].name, "x");
        assert_eq!(module.custom_sections[0].data, vec![0xaa, 0xbb]);
    }
}
