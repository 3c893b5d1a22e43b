//! Type-checking abstract interpretation over a parsed module's function
//! bodies.
//!
//! https://webassembly.github.io/spec/core/valid/

use crate::instructions::{BlockType, Instruction};
use crate::module::{ImportDescription, Module};
use crate::types::{FunctionType, GlobalType, Mutability, TypeIdx, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    BlockTypeInvalid,
    ControlStackEmpty,
    LabelInvalid,
    LocalUndefined,
    GlobalUndefined,
    GlobalImmutable,
    FunctionUndefined,
    TypeUndefined,
    MemoryUndefined,
    MemoryBadAlignment,
    ValueStackUnderflow,
    ValueStackHeightMismatch,
    ValueStackUnexpected,
    UnknownInstruction,
    LimitsInvalid,
    CodeFunctionCountMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    Known(ValueType),
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Function,
    Block,
    Loop,
}

struct ControlFrame {
    kind: FrameKind,
    params: Vec<ValueType>,
    results: Vec<ValueType>,
    height: usize,
    unreachable: bool,
}

impl ControlFrame {
    /// The types a branch to this frame's label must leave on the stack:
    /// a loop's label re-enters at its params, anything else exits with
    /// its results.
    fn label_types(&self) -> &[ValueType] {
        match self.kind {
            FrameKind::Loop => &self.params,
            FrameKind::Function | FrameKind::Block => &self.results,
        }
    }
}

struct FunctionValidator<'a> {
    locals: &'a [ValueType],
    func_types: &'a [TypeIdx],
    types: &'a [FunctionType],
    globals: &'a [GlobalType],
    has_memory: bool,
    operands: Vec<Operand>,
    controls: Vec<ControlFrame>,
}

impl<'a> FunctionValidator<'a> {
    fn push_val(&mut self, t: ValueType) {
        self.operands.push(Operand::Known(t));
    }

    fn push_vals(&mut self, ts: &[ValueType]) {
        for &t in ts {
            self.push_val(t);
        }
    }

    fn pop_val(&mut self) -> Result<Operand, ValidationError> {
        let frame = self.controls.last().ok_or(ValidationError::ControlStackEmpty)?;
        if self.operands.len() == frame.height {
            return if frame.unreachable {
                Ok(Operand::Unknown)
            } else {
                Err(ValidationError::ValueStackUnderflow)
            };
        }
        self.operands.pop().ok_or(ValidationError::ValueStackUnderflow)
    }

    fn pop_val_expect(&mut self, t: ValueType) -> Result<(), ValidationError> {
        match self.pop_val()? {
            Operand::Unknown => Ok(()),
            Operand::Known(actual) if actual == t => Ok(()),
            Operand::Known(_) => Err(ValidationError::ValueStackUnexpected),
        }
    }

    fn pop_vals(&mut self, ts: &[ValueType]) -> Result<(), ValidationError> {
        for &t in ts.iter().rev() {
            self.pop_val_expect(t)?;
        }
        Ok(())
    }

    fn push_ctrl(&mut self, kind: FrameKind, params: Vec<ValueType>, results: Vec<ValueType>) {
        self.push_vals(&params);
        let height = self.operands.len();
        self.controls.push(ControlFrame { kind, params, results, height, unreachable: false });
    }

    fn pop_ctrl(&mut self) -> Result<Vec<ValueType>, ValidationError> {
        let results = {
            let frame = self.controls.last().ok_or(ValidationError::ControlStackEmpty)?;
            frame.results.clone()
        };
        self.pop_vals(&results)?;
        let frame = self.controls.last().ok_or(ValidationError::ControlStackEmpty)?;
        if self.operands.len() != frame.height {
            return Err(ValidationError::ValueStackHeightMismatch);
        }
        self.controls.pop();
        Ok(results)
    }

    fn mark_unreachable(&mut self) -> Result<(), ValidationError> {
        let frame = self.controls.last_mut().ok_or(ValidationError::ControlStackEmpty)?;
        self.operands.truncate(frame.height);
        frame.unreachable = true;
        Ok(())
    }

    fn block_type_results(&self, bt: BlockType) -> Result<Vec<ValueType>, ValidationError> {
        match bt {
            BlockType::Empty => Ok(Vec::new()),
            BlockType::Value(t) => Ok(vec![t]),
            // The byte-code parser never produces this tag; reject it here
            // too so the validator stays consistent with what can exist.
            BlockType::TypeIndex(_) => Err(ValidationError::BlockTypeInvalid),
        }
    }

    fn label(&self, label_idx: u32) -> Result<&ControlFrame, ValidationError> {
        let depth = (label_idx as usize).checked_add(1).ok_or(ValidationError::LabelInvalid)?;
        let idx = self.controls.len().checked_sub(depth);
        idx.and_then(|i| self.controls.get(i)).ok_or(ValidationError::LabelInvalid)
    }

    fn numeric_unop(&mut self, t: ValueType) -> Result<(), ValidationError> {
        self.pop_val_expect(t)?;
        self.push_val(t);
        Ok(())
    }

    fn numeric_binop(&mut self, t: ValueType) -> Result<(), ValidationError> {
        self.pop_val_expect(t)?;
        self.pop_val_expect(t)?;
        self.push_val(t);
        Ok(())
    }

    fn numeric_relop(&mut self, t: ValueType) -> Result<(), ValidationError> {
        self.pop_val_expect(t)?;
        self.pop_val_expect(t)?;
        self.push_val(ValueType::Int32);
        Ok(())
    }

    fn cvtop(&mut self, from: ValueType, to: ValueType) -> Result<(), ValidationError> {
        self.pop_val_expect(from)?;
        self.push_val(to);
        Ok(())
    }

    fn step(&mut self, instr: &Instruction) -> Result<(), ValidationError> {
        use Instruction::*;
        use ValueType::*;

        match instr {
            I32Const(_) => self.push_val(Int32),
            I32EqualZero(_) => self.numeric_unop(Int32)?,
            I32Equal(_) | I32NotEqual(_) | I32LessThanSigned(_) | I32LessThanUnsigned(_)
            | I32GreaterThanSigned(_) | I32GreaterThanUnsigned(_) | I32LessThanEqualSigned(_)
            | I32LessThanEqualUnsigned(_) | I32GreaterThanEqualSigned(_)
            | I32GreaterThanEqualUnsigned(_) => self.numeric_relop(Int32)?,
            I32CountLeadingZeros(_) | I32CountTrailingZeros(_) | I32PopulationCount(_)
            | I32Extend8Signed(_) | I32Extend16Signed(_) => self.numeric_unop(Int32)?,
            I32Add(_) | I32Subtract(_) | I32Multiply(_) | I32DivideSigned(_)
            | I32DivideUnsigned(_) | I32RemainderSigned(_) | I32RemainderUnsigned(_) | I32And(_)
            | I32Or(_) | I32ExclusiveOr(_) | I32ShiftLeft(_) | I32ShiftRightSigned(_)
            | I32ShiftRightUnsigned(_) | I32RotateLeft(_) | I32RotateRight(_) => {
                self.numeric_binop(Int32)?
            }
            I32WrapI64(_) => self.cvtop(Int64, Int32)?,
            I32TruncateF32Signed(_) | I32TruncateF32Unsigned(_) | I32ReinterpretF32(_) => {
                self.cvtop(Float32, Int32)?
            }
            I32TruncateF64Signed(_) | I32TruncateF64Unsigned(_) => self.cvtop(Float64, Int32)?,

            LocalGet(g) => {
                let t = *self.locals.get(g.idx as usize).ok_or(ValidationError::LocalUndefined)?;
                self.push_val(t);
            }
            LocalSet(s) => {
                let t = *self.locals.get(s.idx as usize).ok_or(ValidationError::LocalUndefined)?;
                self.pop_val_expect(t)?;
            }
            LocalTee(t) => {
                let ty = *self.locals.get(t.idx as usize).ok_or(ValidationError::LocalUndefined)?;
                self.pop_val_expect(ty)?;
                self.push_val(ty);
            }
            GlobalGet(g) => {
                let global = self
                    .globals
                    .get(g.global_idx as usize)
                    .ok_or(ValidationError::GlobalUndefined)?;
                self.push_val(global.value_type);
            }
            GlobalSet(g) => {
                let global = self
                    .globals
                    .get(g.global_idx as usize)
                    .ok_or(ValidationError::GlobalUndefined)?;
                if global.mutability != Mutability::Var {
                    return Err(ValidationError::GlobalImmutable);
                }
                self.pop_val_expect(global.value_type)?;
            }

            I32Load(l) => {
                if !self.has_memory {
                    return Err(ValidationError::MemoryUndefined);
                }
                if l.arg.align > 4 {
                    return Err(ValidationError::MemoryBadAlignment);
                }
                self.pop_val_expect(Int32)?;
                self.push_val(Int32);
            }
            I32Store(s) => {
                if !self.has_memory {
                    return Err(ValidationError::MemoryUndefined);
                }
                if s.arg.align > 4 {
                    return Err(ValidationError::MemoryBadAlignment);
                }
                self.pop_val_expect(Int32)?;
                self.pop_val_expect(Int32)?;
            }

            Select(_) => {
                self.pop_val_expect(Int32)?;
                let b = self.pop_val()?;
                let a = self.pop_val()?;
                match (a, b) {
                    (Operand::Known(at), Operand::Known(bt)) if at == bt => self.push_val(at),
                    (Operand::Known(t), Operand::Unknown) | (Operand::Unknown, Operand::Known(t)) => {
                        self.push_val(t)
                    }
                    (Operand::Unknown, Operand::Unknown) => self.operands.push(Operand::Unknown),
                    _ => return Err(ValidationError::ValueStackUnexpected),
                }
            }

            Block(b) => {
                let results = self.block_type_results(b.block_type)?;
                self.push_ctrl(FrameKind::Block, Vec::new(), results);
            }
            Loop(l) => {
                let results = self.block_type_results(l.block_type)?;
                self.push_ctrl(FrameKind::Loop, Vec::new(), results);
            }
            Branch(b) => {
                let types = self.label(b.label_idx)?.label_types().to_vec();
                self.pop_vals(&types)?;
                self.mark_unreachable()?;
            }
            BranchIf(b) => {
                self.pop_val_expect(Int32)?;
                let types = self.label(b.label_idx)?.label_types().to_vec();
                self.pop_vals(&types)?;
                self.push_vals(&types);
            }
            Return(_) => {
                let types = self
                    .controls
                    .first()
                    .ok_or(ValidationError::ControlStackEmpty)?
                    .results
                    .clone();
                self.pop_vals(&types)?;
                self.mark_unreachable()?;
            }
            End(_) => {
                let results = self.pop_ctrl()?;
                self.push_vals(&results);
            }
            Call(c) => {
                let type_idx = *self
                    .func_types
                    .get(c.func_idx as usize)
                    .ok_or(ValidationError::FunctionUndefined)?;
                let function_type =
                    self.types.get(type_idx as usize).ok_or(ValidationError::TypeUndefined)?;
                self.pop_vals(&function_type.parameters)?;
                self.push_vals(&function_type.results);
            }
        }

        Ok(())
    }
}

/// Validates one function body against its declared type and the module's
/// index spaces, per the pipeline's validator stage.
fn validate_function(
    function_type: &FunctionType,
    locals: &[ValueType],
    func_types: &[TypeIdx],
    types: &[FunctionType],
    globals: &[GlobalType],
    has_memory: bool,
    code: &[Instruction],
) -> Result<(), ValidationError> {
    let mut validator = FunctionValidator {
        locals,
        func_types,
        types,
        globals,
        has_memory,
        operands: Vec::new(),
        controls: Vec::new(),
    };

    validator.push_ctrl(FrameKind::Function, Vec::new(), function_type.results.clone());

    for instr in code {
        validator.step(instr)?;
    }

    if !validator.controls.is_empty() {
        return Err(ValidationError::ControlStackEmpty);
    }

    Ok(())
}

/// Runs the validator over every function body in `module`.
pub fn validate_module(module: &Module) -> Result<(), ValidationError> {
    let types = module.type_section.as_ref().map(|t| t.types.as_slice()).unwrap_or(&[]);

    let mut func_types: Vec<TypeIdx> = Vec::new();
    let mut imported_globals: Vec<GlobalType> = Vec::new();
    let mut has_memory = false;

    if let Some(imports) = &module.import_section {
        for import in &imports.imports {
            match import.description {
                ImportDescription::Function(type_idx) => func_types.push(type_idx),
                ImportDescription::Global(global_type) => imported_globals.push(global_type),
                ImportDescription::Memory(_) => has_memory = true,
                ImportDescription::Table(_) => {}
            }
        }
    }

    if let Some(functions) = &module.function_section {
        func_types.extend(functions.type_indices.iter().copied());
    }

    let mut globals = imported_globals;
    if let Some(section) = &module.global_section {
        globals.extend(section.globals.iter().map(|g| g.global_type));
    }

    if let Some(memories) = &module.memory_section {
        has_memory |= !memories.memories.is_empty();
        for limits in &memories.memories {
            if !limits.is_valid(1 << 16) {
                return Err(ValidationError::LimitsInvalid);
            }
        }
    }

    if let Some(tables) = &module.table_section {
        for table in &tables.tables {
            if !table.limits.is_valid(u32::MAX as u64) {
                return Err(ValidationError::LimitsInvalid);
            }
        }
    }

    let defined_type_indices =
        module.function_section.as_ref().map(|f| f.type_indices.as_slice()).unwrap_or(&[]);
    let code = module.code_section.as_ref().map(|c| c.entries.as_slice()).unwrap_or(&[]);

    if defined_type_indices.len() != code.len() {
        return Err(ValidationError::CodeFunctionCountMismatch);
    }

    for (type_idx, entry) in defined_type_indices.iter().zip(code) {
        let function_type = types.get(*type_idx as usize).ok_or(ValidationError::TypeUndefined)?;

        let mut locals = function_type.parameters.clone();
        for local in &entry.locals {
            for _ in 0..local.count {
                locals.push(local.value_type);
            }
        }

        validate_function(function_type, &locals, &func_types, types, &globals, has_memory, &entry.code)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_code_parser::parse_module;

    fn empty_fn_module(body: &[u8]) -> Vec<u8> {
        let mut bytes = b"\0asm\x01\0\0\0".to_vec();
        bytes.extend_from_slice(&[1, 4, 1, 0x60, 0, 0]); // type () -> ()
        bytes.extend_from_slice(&[3, 2, 1, 0]); // function 0 uses type 0

        // Code section: one entry, zero locals, `body` as its instructions.
        let entry_size = (1 + body.len()) as u8; // locals-count byte + body
        let section_size = (1 + 1 + entry_size as usize) as u8; // entry count + entry_size byte + entry
        bytes.push(10);
        bytes.push(section_size);
        bytes.push(1); // one code entry
        bytes.push(entry_size);
        bytes.push(0); // zero locals
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn leftover_value_at_function_end_is_rejected() {
        // i32.const 1; i32.const 2; i32.add; end -- leaves one i32 on the
        // stack at a () -> () function's end, which the height check rejects.
        let bytes = empty_fn_module(&[0x41, 0x01, 0x41, 0x02, 0x6a, 0x0b]);
        let module = parse_module(&bytes).unwrap();
        assert_eq!(validate_module(&module), Err(ValidationError::ValueStackHeightMismatch));
    }

    #[test]
    fn empty_module_validates() {
        let module = parse_module(b"\0asm\x01\0\0\0").unwrap();
        assert_eq!(validate_module(&module), Ok(()));
    }

    #[test]
    fn local_get_out_of_range_is_rejected() {
        // local.get 0 with zero locals declared, then end.
        let bytes = empty_fn_module(&[0x20, 0x00, 0x0b]);
        let module = parse_module(&bytes).unwrap();
        assert_eq!(validate_module(&module), Err(ValidationError::LocalUndefined));
    }

    #[test]
    fn i32_load_without_memory_is_rejected() {
        let bytes = empty_fn_module(&[0x41, 0x00, 0x28, 0x02, 0x00, 0x0b]);
        let module = parse_module(&bytes).unwrap();
        assert_eq!(validate_module(&module), Err(ValidationError::MemoryUndefined));
    }

    #[test]
    fn branch_to_invalid_label_is_rejected() {
        let bytes = empty_fn_module(&[0x0c, 0x05, 0x0b]);
        let module = parse_module(&bytes).unwrap();
        assert_eq!(validate_module(&module), Err(ValidationError::LabelInvalid));
    }
}
