//! Integration tests for COP2 instruction decoding

mod utils;

use ee_cop2_core::cop2::opcodes::{InstructionDefinition, DEFINITIONS};
use ee_cop2_core::{
    Component, Cop2Decoder, Cop2Error, FlagCondition, InstructionKind, OpcodeTable, Operand,
    OperandRole, Register, INSTRUCTION_SIZE,
};
use utils::{bc0_word, cache_word, cop2_word};

fn decoder() -> Cop2Decoder {
    Cop2Decoder::new().expect("tables are valid")
}

fn register(role: OperandRole, register: Register) -> Operand {
    Operand::Register {
        role,
        register,
        field: None,
    }
}

#[test]
fn test_every_table_opcode_decodes_to_its_definition() {
    let decoder = decoder();
    assert_eq!(decoder.table().len(), DEFINITIONS.len());

    for definition in decoder.table().iter() {
        for (dest, ft, fs, fd) in [(0, 0, 0, 0), (0xF, 31, 31, 31), (0x5, 7, 19, 12)] {
            let word = cop2_word(definition.opcode, dest, ft, fs, fd);
            let decoded = decoder
                .decode(word, 0x0010_0000)
                .unwrap_or_else(|| panic!("{} (0x{:08X}) not decoded", definition.mnemonic, word));
            assert_eq!(decoded.definition(), Some(definition));
            assert_eq!(decoded.size, INSTRUCTION_SIZE);
            assert_eq!(decoded.raw, word);
        }
    }
}

#[test]
fn test_opcodes_missing_from_their_cluster_are_rejected() {
    let decoder = decoder();

    // Reachable through the 11-bit key
    for opcode in [0x2BF, 0x33E, 0x33F, 0x47C] {
        let word = cop2_word(opcode, 0xF, 1, 2, 0);
        assert!(decoder.decode(word, 0).is_none(), "0x{:03X} matched", opcode);
    }

    // Reachable through the 6-bit key
    for opcode in [0x033, 0x036, 0x037, 0x03A, 0x03B] {
        let word = cop2_word(opcode, 0, 1, 2, 3);
        assert!(decoder.decode(word, 0).is_none(), "0x{:03X} matched", opcode);
    }

    // Direct lookups in every cluster
    let table = decoder.table();
    for opcode in [0x140, 0x2A0, 0x300, 0x401] {
        assert!(table.lookup(opcode).is_none(), "0x{:03X} matched", opcode);
    }
    assert!(table.lookup(0x500).is_none());
}

#[test]
fn test_words_outside_the_three_paths_are_rejected() {
    let decoder = decoder();
    for word in [0x0000_0000, 0x2402_0001, 0x4820_1000, 0x48A2_0800, 0xD800_0000] {
        assert!(decoder.classify(word).is_none());
        assert!(decoder.decode(word, 0x1000).is_none());
    }
}

#[test]
fn test_decode_three_register_broadcast() {
    let decoded = decoder().decode(0x4A80_8000, 0x0010_0000).unwrap();
    let definition = decoded.definition().unwrap();
    assert_eq!(definition.mnemonic, "vaddx");
    assert_eq!(definition.format, 23);
    assert_eq!(
        decoded.operands.as_slice(),
        &[
            register(OperandRole::VectorRegister, Register::Vector(0)),
            register(OperandRole::VectorRegister, Register::Vector(16)),
            Operand::Register {
                role: OperandRole::VectorBroadcast,
                register: Register::Vector(0),
                field: Some(Component::X),
            },
        ]
    );
    assert_eq!(decoded.dest.map(|d| d.suffix()), Some(".y".to_string()));
}

#[test]
fn test_decode_is_idempotent() {
    let decoder = decoder();
    for word in [0x4A80_8000, 0x4BC3_1068, bc0_word(3, 0x8000), cache_word(7, 4, 0x40)] {
        let first = decoder.decode(word, 0x0020_0000).unwrap();
        let second = decoder.decode(word, 0x0020_0000).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_decode_accumulator_broadcast_captures_component() {
    // vaddaw.x ACC, vf1, vf2w
    let decoded = decoder().decode(0x4B02_083F, 0).unwrap();
    assert_eq!(decoded.definition().unwrap().mnemonic, "vaddaw");
    assert_eq!(
        decoded.operands.as_slice(),
        &[
            register(OperandRole::Accumulator, Register::Accumulator),
            register(OperandRole::VectorRegister, Register::Vector(1)),
            Operand::Register {
                role: OperandRole::VectorBroadcast,
                register: Register::Vector(2),
                field: Some(Component::W),
            },
        ]
    );
}

#[test]
fn test_decode_divide_field_selects() {
    // vdiv Q, vf5.y, vf4.w
    let decoded = decoder().decode(0x4BA4_2BBC, 0).unwrap();
    assert_eq!(decoded.definition().unwrap().mnemonic, "vdiv");
    assert!(decoded.dest.is_none());
    assert_eq!(
        decoded.operands.as_slice(),
        &[
            register(OperandRole::ControlRegister, Register::Q),
            Operand::Register {
                role: OperandRole::VectorFieldSelect,
                register: Register::Vector(5),
                field: Some(Component::Y),
            },
            Operand::Register {
                role: OperandRole::VectorFieldSelect,
                register: Register::Vector(4),
                field: Some(Component::W),
            },
        ]
    );
}

#[test]
fn test_load_store_operand_order() {
    let decoder = decoder();
    // ft = 2, fs = 1 for every word
    let cases = [
        (0x37D, "vsqi", Register::Vector(1), Register::Integer(2), OperandRole::IntegerRegisterPostIncrement),
        (0x37F, "vsqd", Register::Vector(1), Register::Integer(2), OperandRole::IntegerRegisterPreDecrement),
        (0x37C, "vlqi", Register::Vector(2), Register::Integer(1), OperandRole::IntegerRegisterPostIncrement),
        (0x37E, "vlqd", Register::Vector(2), Register::Integer(1), OperandRole::IntegerRegisterPreDecrement),
    ];
    for (opcode, mnemonic, data, address, role) in cases {
        let decoded = decoder.decode(cop2_word(opcode, 0xF, 2, 1, 0), 0).unwrap();
        assert_eq!(decoded.definition().unwrap().mnemonic, mnemonic);
        assert_eq!(
            decoded.operands.as_slice(),
            &[register(OperandRole::VectorRegister, data), register(role, address)]
        );
    }
}

#[test]
fn test_decode_integer_immediate() {
    // viaddi vi1, vi2, 0x1F
    let decoded = decoder().decode(0x4A01_17F2, 0).unwrap();
    assert_eq!(decoded.definition().unwrap().mnemonic, "viaddi");
    assert_eq!(
        decoded.operands.as_slice(),
        &[
            register(OperandRole::IntegerRegister, Register::Integer(1)),
            register(OperandRole::IntegerRegister, Register::Integer(2)),
            Operand::Immediate(0x1F),
        ]
    );
}

#[test]
fn test_decode_micro_subroutine_call() {
    let decoded = decoder().decode(0x4A00_0438, 0).unwrap();
    assert_eq!(decoded.definition().unwrap().mnemonic, "vcallms");
    assert_eq!(decoded.operands.as_slice(), &[Operand::MicroAddress(0x10)]);
}

#[test]
fn test_decode_branch_on_flag() {
    let decoder = decoder();

    let forward = decoder.decode(bc0_word(0, 0x0002), 0x1000).unwrap();
    assert_eq!(forward.kind, InstructionKind::BranchOnFlag(FlagCondition::False));
    assert_eq!(forward.branch_target(), Some(0x100C));
    assert_eq!(forward.size, 4);

    let backward = decoder.decode(bc0_word(3, 0xFFFE), 0x1000).unwrap();
    assert_eq!(backward.kind, InstructionKind::BranchOnFlag(FlagCondition::TrueLikely));
    assert_eq!(backward.operands.as_slice(), &[Operand::NearAddress(0x0FFC)]);

    let conditions: Vec<_> = (0..4)
        .map(|c| decoder.decode(bc0_word(c, 0), 0).unwrap().kind)
        .collect();
    assert_eq!(
        conditions,
        [
            InstructionKind::BranchOnFlag(FlagCondition::False),
            InstructionKind::BranchOnFlag(FlagCondition::True),
            InstructionKind::BranchOnFlag(FlagCondition::FalseLikely),
            InstructionKind::BranchOnFlag(FlagCondition::TrueLikely),
        ]
    );
}

#[test]
fn test_decode_cache() {
    let decoded = decoder().decode(cache_word(0x07, 4, 0xFFF0), 0x2000).unwrap();
    assert_eq!(decoded.kind, InstructionKind::Cache);
    assert_eq!(decoded.size, 4);
    assert_eq!(
        decoded.operands.as_slice(),
        &[
            Operand::CacheFunction(0x07),
            Operand::Displacement {
                base: 4,
                offset: 0xFFF0
            },
        ]
    );
}

#[test]
fn test_missing_format_is_fatal() {
    static BROKEN: &[InstructionDefinition] = &[InstructionDefinition {
        opcode: 0x028,
        mnemonic: "vadd",
        format: 28,
        has_dest: true,
        description: "Addition",
    }];
    let table = OpcodeTable::from_definitions(BROKEN).unwrap();
    assert_eq!(
        Cop2Decoder::with_table(table).unwrap_err(),
        Cop2Error::MissingFormat {
            mnemonic: "vadd",
            format: 28
        }
    );
}

#[test]
fn test_decoded_instruction_serializes() {
    let decoded = decoder().decode(0x4BC3_1068, 0x100).unwrap();
    let json = serde_json::to_value(&decoded).unwrap();
    assert_eq!(json["address"], 0x100);
    assert_eq!(json["size"], 4);
    assert_eq!(json["kind"]["Table"]["mnemonic"], "vadd");
    assert_eq!(json["operands"].as_array().unwrap().len(), 3);
}
