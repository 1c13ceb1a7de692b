use std::str::FromStr;

use chip8_emulator::constants as C;
use chip8_emulator::runtime::{Computer, Reg};
use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{char, digit1, hex_digit1, one_of, space0};
use nom::combinator::{all_consuming, map, map_res, opt, recognize, value};
use nom::error::{convert_error, VerboseError};
use nom::sequence::{delimited, pair, preceded};
use nom::{Finish, IResult};
use thiserror::Error;

type ParseResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// A value read from the machine or a literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Literal(u16),
    Register(Reg),
    Index,
    ProgramCounter,
    StackPointer,
}

impl Operand {
    fn evaluate(self, computer: &Computer) -> i32 {
        match self {
            Operand::Literal(value) => value.into(),
            Operand::Register(reg) => computer.registers.get(reg).into(),
            Operand::Index => computer.registers.i.into(),
            Operand::ProgramCounter => computer.registers.pc.into(),
            Operand::StackPointer => i32::try_from(computer.stack.sp()).unwrap_or(i32::MAX),
        }
    }
}

/// An operand with an optional offset, like `i+2` or `pc - 4`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argument {
    base: Operand,
    offset: i32,
}

#[derive(Debug, Error)]
#[error("{0} is out of range")]
pub struct EvaluationError(i32);

impl Argument {
    pub fn evaluate(self, computer: &Computer) -> Result<C::Address, EvaluationError> {
        let value = self.base.evaluate(computer) + self.offset;
        C::Address::try_from(value).map_err(|_| EvaluationError(value))
    }
}

/// What the `set` command writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentTarget {
    Register(Reg),
    Index,
    ProgramCounter,
    DelayTimer,
    SoundTimer,
    Memory(Argument),
}

#[derive(Debug, Error)]
#[error("could not parse expression: {0}")]
pub struct ParseError(String);

fn parse_number(input: &str) -> ParseResult<u16> {
    alt((
        map_res(preceded(tag_no_case("0x"), hex_digit1), |digits| {
            u16::from_str_radix(digits, 16)
        }),
        map_res(digit1, u16::from_str),
    ))(input)
}

fn parse_register(input: &str) -> ParseResult<Reg> {
    map_res(
        recognize(pair(one_of("vV"), one_of("0123456789abcdefABCDEF"))),
        Reg::from_str,
    )(input)
}

fn parse_operand(input: &str) -> ParseResult<Operand> {
    alt((
        map(parse_number, Operand::Literal),
        map(parse_register, Operand::Register),
        value(Operand::ProgramCounter, tag_no_case("pc")),
        value(Operand::StackPointer, tag_no_case("sp")),
        value(Operand::Index, tag_no_case("i")),
    ))(input)
}

fn parse_argument(input: &str) -> ParseResult<Argument> {
    let (rest, base) = parse_operand(input)?;
    let (rest, offset) = opt(pair(
        delimited(space0, one_of("+-"), space0),
        parse_number,
    ))(rest)?;

    let offset = match offset {
        Some(('-', n)) => -i32::from(n),
        Some((_, n)) => i32::from(n),
        None => 0,
    };

    Ok((rest, Argument { base, offset }))
}

fn parse_target(input: &str) -> ParseResult<AssignmentTarget> {
    alt((
        map(
            delimited(
                pair(char('['), space0),
                parse_argument,
                pair(space0, char(']')),
            ),
            AssignmentTarget::Memory,
        ),
        map(parse_register, AssignmentTarget::Register),
        value(AssignmentTarget::DelayTimer, tag_no_case("dt")),
        value(AssignmentTarget::SoundTimer, tag_no_case("st")),
        value(AssignmentTarget::ProgramCounter, tag_no_case("pc")),
        value(AssignmentTarget::Index, tag_no_case("i")),
    ))(input)
}

fn parse_all<'a, T>(
    input: &'a str,
    parser: impl FnMut(&'a str) -> ParseResult<'a, T>,
) -> Result<T, ParseError> {
    all_consuming(parser)(input)
        .finish()
        .map(|(_, ret)| ret)
        .map_err(|e| ParseError(convert_error(input, e)))
}

impl FromStr for Argument {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_all(s, parse_argument)
    }
}

impl FromStr for AssignmentTarget {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_all(s, parse_target)
    }
}

/// Parse a keypad code, a single hexadecimal digit
pub fn parse_key(s: &str) -> Result<u8, String> {
    let digits = s.trim_start_matches("0x");
    match u8::from_str_radix(digits, 16) {
        Ok(code) if usize::from(code) < C::KEY_COUNT => Ok(code),
        _ => Err(format!("{s} is not a key, expected 0 to F")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_test() {
        let mut computer = Computer::default();
        computer.registers.i = 0x300;
        computer.registers.pc = 0x204;
        computer.registers.set(Reg::VA, 0x10);

        let eval = |s: &str| s.parse::<Argument>().unwrap().evaluate(&computer).unwrap();
        assert_eq!(eval("0x200"), 0x200);
        assert_eq!(eval("512"), 512);
        assert_eq!(eval("i"), 0x300);
        assert_eq!(eval("i+2"), 0x302);
        assert_eq!(eval("pc - 4"), 0x200);
        assert_eq!(eval("vA"), 0x10);
        assert_eq!(eval("sp"), 0);

        assert!("i-0x301".parse::<Argument>().unwrap().evaluate(&computer).is_err());
        assert!("0xZZ".parse::<Argument>().is_err());
        assert!("pc+".parse::<Argument>().is_err());
    }

    #[test]
    fn target_test() {
        assert_eq!(
            "v3".parse::<AssignmentTarget>().unwrap(),
            AssignmentTarget::Register(Reg::V3)
        );
        assert_eq!(
            "DT".parse::<AssignmentTarget>().unwrap(),
            AssignmentTarget::DelayTimer
        );
        assert_eq!(
            "[i + 1]".parse::<AssignmentTarget>().unwrap(),
            AssignmentTarget::Memory(Argument {
                base: Operand::Index,
                offset: 1
            })
        );
        assert!("[i".parse::<AssignmentTarget>().is_err());
    }

    #[test]
    fn key_test() {
        assert_eq!(parse_key("a"), Ok(0xA));
        assert_eq!(parse_key("0xF"), Ok(0xF));
        assert!(parse_key("10").is_err());
        assert!(parse_key("g").is_err());
    }
}
