use wasm::interpreter::{Interpreter, Value};
use wasm::{parse_module, validate_module, ValidationError};

/// A module with a single memory, one global (mutable i32, init 0), and one
/// function of type `() -> i32` that adds its two locals and returns.
fn adder_module() -> Vec<u8> {
    let mut bytes = b"\0asm\x01\0\0\0".to_vec();

    // Type section: type 0 = () -> (i32).
    bytes.extend_from_slice(&[1, 5, 1, 0x60, 0, 1, 0x7f]);

    // Function section: function 0 uses type 0.
    bytes.extend_from_slice(&[3, 2, 1, 0]);

    // Memory section: one memory, min 1 page, no max.
    bytes.extend_from_slice(&[5, 3, 1, 0, 1]);

    // Code section: locals = two i32 locals; body sets local0=1, local1=2,
    // pushes their sum, and ends.
    let body: &[u8] = &[
        0x41, 0x01, // i32.const 1
        0x21, 0x00, // local.set 0
        0x41, 0x02, // i32.const 2
        0x21, 0x01, // local.set 1
        0x20, 0x00, // local.get 0
        0x20, 0x01, // local.get 1
        0x6a, // i32.add
        0x0b, // end
    ];
    let locals_decl: &[u8] = &[1, 2, 0x7f]; // one locals-run: 2 x i32
    let entry_size = (locals_decl.len() + body.len()) as u8;
    let section_size = 1 + 1 + entry_size as usize;
    bytes.push(10);
    bytes.push(section_size as u8);
    bytes.push(1); // one code entry
    bytes.push(entry_size);
    bytes.extend_from_slice(locals_decl);
    bytes.extend_from_slice(body);

    bytes
}

#[test]
fn decode_validate_and_run_a_small_function() {
    let bytes = adder_module();
    let module = parse_module(&bytes).expect("module decodes");
    validate_module(&module).expect("module type-checks");

    let entry = &module.code_section.as_ref().unwrap().entries[0];
    let mut interp = Interpreter::new(vec![Value::I32(0), Value::I32(0)], vec![], vec![0u8; 1 << 16]);
    let result = interp.run(&entry.code).unwrap();
    assert_eq!(result, Some(Value::I32(3)));
}

#[test]
fn truncated_module_fails_to_decode() {
    let bytes = &adder_module()[..10];
    assert!(parse_module(bytes).is_err());
}

#[test]
fn store_then_load_through_memory_end_to_end() {
    let mut bytes = b"\0asm\x01\0\0\0".to_vec();
    bytes.extend_from_slice(&[1, 4, 1, 0x60, 0, 0]); // type () -> ()
    bytes.extend_from_slice(&[3, 2, 1, 0]);
    bytes.extend_from_slice(&[5, 3, 1, 0, 1]); // memory

    let body: &[u8] = &[
        0x41, 0x00, // i32.const 0 (address)
        0x41, 0x7b, // i32.const 123 (value)
        0x36, 0x02, 0x00, // i32.store align=2 offset=0
        0x41, 0x00, // i32.const 0 (address)
        0x28, 0x02, 0x00, // i32.load align=2 offset=0
        0x0b, // end
    ];
    let entry_size = (1 + body.len()) as u8;
    bytes.push(10);
    bytes.push((2 + entry_size as usize) as u8);
    bytes.push(1);
    bytes.push(entry_size);
    bytes.push(0);
    bytes.extend_from_slice(body);

    let module = parse_module(&bytes).expect("module decodes");
    validate_module(&module).expect("module type-checks");

    let entry = &module.code_section.as_ref().unwrap().entries[0];
    let mut interp = Interpreter::new(vec![], vec![], vec![0u8; 1 << 16]);
    assert_eq!(interp.run(&entry.code).unwrap(), Some(Value::I32(123)));
}

#[test]
fn module_that_returns_a_value_from_a_void_function_is_rejected() {
    let mut bytes = b"\0asm\x01\0\0\0".to_vec();
    bytes.extend_from_slice(&[1, 4, 1, 0x60, 0, 0]); // type () -> ()
    bytes.extend_from_slice(&[3, 2, 1, 0]);
    let body: &[u8] = &[0x41, 0x2a, 0x0b]; // i32.const 42; end
    let entry_size = (1 + body.len()) as u8; // locals-count byte + body
    bytes.extend_from_slice(&[10, 2 + entry_size, 1, entry_size, 0]);
    bytes.extend_from_slice(body);

    let module = parse_module(&bytes).expect("module decodes");
    assert_eq!(validate_module(&module), Err(ValidationError::ValueStackHeightMismatch));
}
