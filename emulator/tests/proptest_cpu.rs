//! Property-based tests for the arithmetic and control-flow invariants.

use chip8_emulator::constants::{MAX_ADDRESS, PROGRAM_START};
use chip8_emulator::hooks::{Framebuffer, Keypad, RecordingSink};
use chip8_emulator::runtime::Reg;
use chip8_emulator::{Computer, Rom};
use proptest::prelude::*;

fn setup(program: &[u8]) -> Computer {
    let mut computer = Computer::default()
        .with_seed(7)
        .with_sink(RecordingSink::default());
    computer
        .load(&Rom::from_bytes(program.to_vec()).unwrap())
        .unwrap();
    computer
}

fn step(computer: &mut Computer) {
    computer.step(&mut Framebuffer::default(), &Keypad::default());
}

/// `8XY_` opcode with two distinct registers, neither of them `VF`
fn alu_operands() -> impl Strategy<Value = (u8, u8)> {
    (0u8..0xF, 0u8..0xF).prop_filter("distinct registers", |(x, y)| x != y)
}

proptest! {
    #[test]
    fn jump_lands_exactly(nnn in 0u16..=0xFFF) {
        let mut computer = setup(&(0x1000 | nnn).to_be_bytes());
        step(&mut computer);
        prop_assert_eq!(computer.registers.pc, nnn);
    }

    #[test]
    fn call_then_return_resumes_after_call(target in 0x202u16..0xFFE) {
        let target = target & !1;
        let mut computer = setup(&(0x2000 | target).to_be_bytes());
        computer.memory.write_all(target, &[0x00, 0xEE]).unwrap();

        step(&mut computer);
        prop_assert_eq!(computer.registers.pc, target);
        step(&mut computer);
        prop_assert_eq!(computer.registers.pc, PROGRAM_START + 2);
        prop_assert_eq!(computer.stack.sp(), 0);
    }

    #[test]
    fn add_sets_carry((x, y) in alu_operands(), a: u8, b: u8) {
        let mut computer = setup(&[0x80 | x, (y << 4) | 0x4]);
        computer.registers.set(Reg::from_nibble(x), a);
        computer.registers.set(Reg::from_nibble(y), b);
        step(&mut computer);

        let sum = u16::from(a) + u16::from(b);
        prop_assert_eq!(computer.registers.get(Reg::VF), u8::from(sum > 0xFF));
        prop_assert_eq!(computer.registers.get(Reg::from_nibble(x)), a.wrapping_add(b));
    }

    #[test]
    fn sub_sets_no_borrow((x, y) in alu_operands(), a: u8, b: u8) {
        let mut computer = setup(&[0x80 | x, (y << 4) | 0x5]);
        computer.registers.set(Reg::from_nibble(x), a);
        computer.registers.set(Reg::from_nibble(y), b);
        step(&mut computer);

        prop_assert_eq!(computer.registers.get(Reg::VF), u8::from(a > b));
        prop_assert_eq!(computer.registers.get(Reg::from_nibble(x)), a.wrapping_sub(b));
    }

    #[test]
    fn subn_sets_no_borrow((x, y) in alu_operands(), a: u8, b: u8) {
        let mut computer = setup(&[0x80 | x, (y << 4) | 0x7]);
        computer.registers.set(Reg::from_nibble(x), a);
        computer.registers.set(Reg::from_nibble(y), b);
        step(&mut computer);

        prop_assert_eq!(computer.registers.get(Reg::VF), u8::from(b > a));
        prop_assert_eq!(computer.registers.get(Reg::from_nibble(x)), b.wrapping_sub(a));
    }

    #[test]
    fn block_transfer_is_all_or_nothing(x in 0u8..=0xF, i in 0xF00u16..=MAX_ADDRESS, store: bool) {
        let sub = if store { 0x55 } else { 0x65 };
        let mut computer = setup(&[0xF0 | x, sub]);
        computer.registers.i = i;
        for (reg, value) in Reg::ALL.iter().zip(0xA0u8..) {
            computer.registers.set(*reg, value);
        }
        let memory = computer.memory.clone();
        let registers = computer.registers.v;

        step(&mut computer);

        let fits = i + u16::from(x) <= MAX_ADDRESS;
        if fits {
            let count = usize::from(x) + 1;
            prop_assert_eq!(computer.registers.pc, PROGRAM_START + 2);
            prop_assert_eq!(
                computer.memory.slice(i, count).unwrap(),
                &computer.registers.v[..count]
            );
        } else {
            prop_assert_eq!(computer.registers.pc, 0);
            prop_assert_eq!(computer.registers.i, 0);
            prop_assert_eq!(&computer.memory, &memory);
            prop_assert_eq!(computer.registers.v, registers);
        }
    }

    #[test]
    fn step_never_panics(opcode: u16, pc in 0u16..0x1100) {
        let mut computer = setup(&opcode.to_be_bytes());
        computer.registers.pc = pc;
        for _ in 0..4 {
            step(&mut computer);
            prop_assert!(computer.stack.sp() <= chip8_emulator::constants::STACK_DEPTH);
        }
    }
}
