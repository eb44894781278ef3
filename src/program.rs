//! # IPPcode23 Source Loader & Program Representation
//!
//! This module is the "source loader" collaborator from spec §1: it parses
//! the IPPcode23 XML document (spec §6.2) into an order-sorted sequence of
//! [`Instruction`]s the dispatcher can execute, and reports structural
//! errors with the distinguished `Fault::InvalidXml` (31) /
//! `Fault::MalformedProgram` (32) kinds.
//!
//! ## Shape
//! - [`OpCode`] — the closed set of IPPcode23 opcodes.
//! - [`Arg`] — a decoded instruction argument: a literal [`Value`], a
//!   variable reference, a label name, or a type-name (used only by
//!   `READ`'s second argument).
//! - [`Instruction`] — one opcode plus its decoded argument vector.
//! - [`load_program`] — entry point: XML text in, `Vec<Instruction>` out.
//!
//! ## Parsing approach
//! The parser walks `quick_xml` events by hand (`Start`/`Empty`/`Text`/
//! `CData`/`End`), gathering each `instruction` element's raw `(order, opcode,
//! args)` tuple before validating it against the opcode's expected arity
//! and argument kinds: a manual, single-pass decode driven by a `match`
//! table, rather than a derive-based deserializer — the per-field fault
//! attribution (bad `order`, unknown `opcode`, wrong arg count/kind) needs
//! more precision than a generic deserialize error gives.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::Fault;
use crate::frame::FrameTag;
use crate::value::Value;

/// The closed set of IPPcode23 opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Move,
    CreateFrame,
    PushFrame,
    PopFrame,
    DefVar,
    Call,
    Return,
    Pushs,
    Pops,
    Add,
    Sub,
    Mul,
    IDiv,
    Lt,
    Gt,
    Eq,
    And,
    Or,
    Not,
    Int2Char,
    Stri2Int,
    Read,
    Write,
    Concat,
    StrLen,
    GetChar,
    SetChar,
    Type,
    Label,
    Jump,
    JumpIfEq,
    JumpIfNeq,
    Exit,
    DPrint,
    Break,
}

impl OpCode {
    /// Case-insensitive opcode name lookup (spec §6.2: "case-insensitive
    /// opcode name").
    fn parse(name: &str) -> Option<OpCode> {
        Some(match name.to_ascii_uppercase().as_str() {
            "MOVE" => OpCode::Move,
            "CREATEFRAME" => OpCode::CreateFrame,
            "PUSHFRAME" => OpCode::PushFrame,
            "POPFRAME" => OpCode::PopFrame,
            "DEFVAR" => OpCode::DefVar,
            "CALL" => OpCode::Call,
            "RETURN" => OpCode::Return,
            "PUSHS" => OpCode::Pushs,
            "POPS" => OpCode::Pops,
            "ADD" => OpCode::Add,
            "SUB" => OpCode::Sub,
            "MUL" => OpCode::Mul,
            "IDIV" => OpCode::IDiv,
            "LT" => OpCode::Lt,
            "GT" => OpCode::Gt,
            "EQ" => OpCode::Eq,
            "AND" => OpCode::And,
            "OR" => OpCode::Or,
            "NOT" => OpCode::Not,
            "INT2CHAR" => OpCode::Int2Char,
            "STRI2INT" => OpCode::Stri2Int,
            "READ" => OpCode::Read,
            "WRITE" => OpCode::Write,
            "CONCAT" => OpCode::Concat,
            "STRLEN" => OpCode::StrLen,
            "GETCHAR" => OpCode::GetChar,
            "SETCHAR" => OpCode::SetChar,
            "TYPE" => OpCode::Type,
            "LABEL" => OpCode::Label,
            "JUMP" => OpCode::Jump,
            "JUMPIFEQ" => OpCode::JumpIfEq,
            "JUMPIFNEQ" => OpCode::JumpIfNeq,
            "EXIT" => OpCode::Exit,
            "DPRINT" => OpCode::DPrint,
            "BREAK" => OpCode::Break,
            _ => return None,
        })
    }
}

/// The kind an argument position expects, used only to validate a raw
/// argument against its opcode during loading.
#[derive(Clone, Copy, PartialEq, Eq)]
enum ArgSlot {
    /// A variable reference (`DEFVAR`, `POPS`, destination of any op).
    Var,
    /// A literal-or-variable-reference, resolved at execution time.
    Symbol,
    /// A label name (`LABEL`, `JUMP`, `CALL`, ...).
    Label,
    /// A type-name literal (`READ`'s second argument only).
    Type,
}

/// A decoded instruction argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A literal value (int/bool/string/nil).
    Const(Value),
    /// A variable reference: which frame, and the variable's name.
    Var(FrameTag, String),
    /// A label name.
    Label(String),
    /// A type-name literal: `"int"` | `"bool"` | `"string"` | `"nil"`.
    Type(String),
}

/// One instruction: an opcode plus its positional arguments, already
/// validated against the opcode's expected shape.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: OpCode,
    pub args: Vec<Arg>,
}

/// The expected argument slots for each opcode, in positional order.
fn expected_slots(op: OpCode) -> &'static [ArgSlot] {
    use ArgSlot::*;
    match op {
        OpCode::CreateFrame | OpCode::PushFrame | OpCode::PopFrame => &[],
        OpCode::Return | OpCode::Break => &[],
        OpCode::DefVar | OpCode::Pops => &[Var],
        OpCode::Call | OpCode::Label | OpCode::Jump => &[Label],
        OpCode::Pushs | OpCode::Write | OpCode::Exit | OpCode::DPrint => &[Symbol],
        OpCode::Move | OpCode::Not | OpCode::Int2Char | OpCode::StrLen | OpCode::Type => {
            &[Var, Symbol]
        }
        OpCode::Read => &[Var, Type],
        OpCode::Add
        | OpCode::Sub
        | OpCode::Mul
        | OpCode::IDiv
        | OpCode::Lt
        | OpCode::Gt
        | OpCode::Eq
        | OpCode::And
        | OpCode::Or
        | OpCode::Stri2Int
        | OpCode::Concat
        | OpCode::GetChar
        | OpCode::SetChar => &[Var, Symbol, Symbol],
        OpCode::JumpIfEq | OpCode::JumpIfNeq => &[Label, Symbol, Symbol],
    }
}

/// Raw, not-yet-validated argument: the `type` attribute and the decoded
/// text payload.
struct RawArg {
    kind: String,
    text: String,
}

/// Raw, not-yet-sorted instruction: the `order`/`opcode` attributes and
/// its raw argument list.
struct RawInstruction {
    order: i64,
    opcode_name: String,
    args: Vec<RawArg>,
}

/// Decode the `\ddd` escape (exactly three decimal digits) into its
/// Unicode scalar value; every other character passes through unchanged.
fn decode_string_escapes(raw: &str) -> Result<String, Fault> {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            if i + 4 > chars.len() || !chars[i + 1..i + 4].iter().all(|c| c.is_ascii_digit()) {
                return Err(Fault::MalformedProgram(
                    "string escape is not exactly three decimal digits".to_string(),
                ));
            }
            let digits: String = chars[i + 1..i + 4].iter().collect();
            let code: u32 = digits.parse().expect("validated as three ascii digits");
            let ch = char::from_u32(code).ok_or_else(|| {
                Fault::MalformedProgram(format!("\\{} is not a valid code point", digits))
            })?;
            out.push(ch);
            i += 4;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Parse a variable reference's text, `<frame>@<name>`.
fn parse_var_ref(text: &str) -> Result<(FrameTag, String), Fault> {
    let (frame_s, name) = text.split_once('@').ok_or_else(|| {
        Fault::MalformedProgram(format!("'{}' is not a valid variable reference", text))
    })?;
    let frame = FrameTag::parse(frame_s)
        .ok_or_else(|| Fault::MalformedProgram(format!("unknown frame '{}'", frame_s)))?;
    if name.is_empty() {
        return Err(Fault::MalformedProgram(
            "variable reference has an empty name".to_string(),
        ));
    }
    Ok((frame, name.to_string()))
}

/// Decode one raw argument into a typed [`Arg`], given what slot kind the
/// opcode expects at this position.
fn build_arg(raw: RawArg, slot: ArgSlot) -> Result<Arg, Fault> {
    match (slot, raw.kind.as_str()) {
        (ArgSlot::Var, "var") => {
            let (frame, name) = parse_var_ref(raw.text.trim())?;
            Ok(Arg::Var(frame, name))
        }
        (ArgSlot::Label, "label") => Ok(Arg::Label(raw.text.trim().to_string())),
        (ArgSlot::Type, "type") => {
            let t = raw.text.trim();
            if matches!(t, "int" | "bool" | "string" | "nil") {
                Ok(Arg::Type(t.to_string()))
            } else {
                Err(Fault::MalformedProgram(format!(
                    "'{}' is not a valid type name",
                    t
                )))
            }
        }
        (ArgSlot::Symbol, "var") => {
            let (frame, name) = parse_var_ref(raw.text.trim())?;
            Ok(Arg::Var(frame, name))
        }
        (ArgSlot::Symbol, "int") => {
            let t = raw.text.trim();
            let v: i64 = t
                .parse()
                .map_err(|_| Fault::MalformedProgram(format!("'{}' is not a valid int", t)))?;
            Ok(Arg::Const(Value::Int(v)))
        }
        (ArgSlot::Symbol, "bool") => {
            let t = raw.text.trim();
            match t {
                "true" => Ok(Arg::Const(Value::Bool(true))),
                "false" => Ok(Arg::Const(Value::Bool(false))),
                _ => Err(Fault::MalformedProgram(format!(
                    "'{}' is not a valid bool",
                    t
                ))),
            }
        }
        (ArgSlot::Symbol, "string") => {
            let decoded = if raw.text.trim().is_empty() {
                String::new()
            } else {
                decode_string_escapes(&raw.text)?
            };
            Ok(Arg::Const(Value::Str(decoded)))
        }
        (ArgSlot::Symbol, "nil") => {
            if raw.text.trim() == "nil" {
                Ok(Arg::Const(Value::Nil))
            } else {
                Err(Fault::MalformedProgram(format!(
                    "'{}' is not a valid nil literal",
                    raw.text.trim()
                )))
            }
        }
        (_, other) => Err(Fault::MalformedProgram(format!(
            "argument of type '{}' is not valid here",
            other
        ))),
    }
}

/// Validate and convert a [`RawInstruction`] into a typed [`Instruction`].
fn build_instruction(raw: RawInstruction) -> Result<Instruction, Fault> {
    let opcode = OpCode::parse(&raw.opcode_name)
        .ok_or_else(|| Fault::MalformedProgram(format!("unknown opcode '{}'", raw.opcode_name)))?;
    let slots = expected_slots(opcode);
    if raw.args.len() != slots.len() {
        return Err(Fault::MalformedProgram(format!(
            "{} expects {} argument(s), found {}",
            raw.opcode_name,
            slots.len(),
            raw.args.len()
        )));
    }
    let mut args = Vec::with_capacity(slots.len());
    for (raw_arg, slot) in raw.args.into_iter().zip(slots.iter()) {
        args.push(build_arg(raw_arg, *slot)?);
    }
    Ok(Instruction { opcode, args })
}

/// Parse IPPcode23 XML source text into an order-sorted instruction
/// sequence (spec §6.2).
///
/// Returns `Fault::InvalidXml` for malformed XML (bad tags, unclosed
/// elements, encoding errors) and `Fault::MalformedProgram` for
/// well-formed XML that does not meet the IPPcode23 program shape.
/// Mutable cursor state threaded through the event loop in [`load_program`].
/// Grouped into a struct so `Start` and `Empty` events (self-closing tags)
/// can share one code path instead of duplicating the body of the match
/// arm.
#[derive(Default)]
struct ParserState {
    saw_program_root: bool,
    raw_instructions: Vec<RawInstruction>,
    cur_order: Option<i64>,
    cur_opcode: Option<String>,
    cur_args: Vec<RawArg>,
    cur_arg_kind: Option<String>,
    cur_arg_text: String,
    in_instruction: bool,
    in_arg: bool,
}

impl ParserState {
    fn finish_instruction(&mut self) {
        self.raw_instructions.push(RawInstruction {
            order: self.cur_order.take().unwrap(),
            opcode_name: self.cur_opcode.take().unwrap(),
            args: std::mem::take(&mut self.cur_args),
        });
        self.in_instruction = false;
    }

    fn finish_arg(&mut self, text: String) {
        self.cur_args.push(RawArg {
            kind: self.cur_arg_kind.take().unwrap(),
            text,
        });
        self.in_arg = false;
    }

    /// Handle a `Start` (`is_empty = false`) or `Empty` (`is_empty = true`,
    /// a self-closing tag) element.
    fn start_element(
        &mut self,
        e: &quick_xml::events::BytesStart,
        is_empty: bool,
    ) -> Result<(), Fault> {
        let name_bytes = e.name().as_ref().to_vec();
        if name_bytes == b"program" {
            let language = find_attr(e, b"language")?;
            if language.as_deref() != Some("IPPcode23") {
                return Err(Fault::MalformedProgram(
                    "program element must have language=\"IPPcode23\"".to_string(),
                ));
            }
            self.saw_program_root = true;
        } else if name_bytes == b"instruction" {
            if self.in_instruction {
                return Err(Fault::MalformedProgram(
                    "nested instruction elements are not allowed".to_string(),
                ));
            }
            let order_s = find_attr(e, b"order")?.ok_or_else(|| {
                Fault::MalformedProgram("instruction is missing 'order'".to_string())
            })?;
            let order: i64 = order_s.parse().map_err(|_| {
                Fault::MalformedProgram(format!("'{}' is not a valid order", order_s))
            })?;
            if order <= 0 {
                return Err(Fault::MalformedProgram(
                    "instruction 'order' must be a positive integer".to_string(),
                ));
            }
            let opcode_name = find_attr(e, b"opcode")?.ok_or_else(|| {
                Fault::MalformedProgram("instruction is missing 'opcode'".to_string())
            })?;
            self.cur_order = Some(order);
            self.cur_opcode = Some(opcode_name);
            self.cur_args = Vec::new();
            self.in_instruction = true;
            if is_empty {
                self.finish_instruction();
            }
        } else if is_arg_element(&name_bytes) {
            if !self.in_instruction {
                return Err(Fault::MalformedProgram(
                    "argument element outside of an instruction".to_string(),
                ));
            }
            let kind = find_attr(e, b"type")?.ok_or_else(|| {
                Fault::MalformedProgram("argument is missing 'type'".to_string())
            })?;
            self.cur_arg_kind = Some(kind);
            self.cur_arg_text = String::new();
            self.in_arg = true;
            if is_empty {
                self.finish_arg(String::new());
            }
        } else {
            return Err(Fault::MalformedProgram(format!(
                "unexpected element '{}'",
                String::from_utf8_lossy(&name_bytes)
            )));
        }
        Ok(())
    }

    fn end_element(&mut self, name_bytes: &[u8]) {
        if name_bytes == b"instruction" {
            if self.in_instruction {
                self.finish_instruction();
            }
        } else if is_arg_element(name_bytes) && self.in_arg {
            let text = std::mem::take(&mut self.cur_arg_text);
            self.finish_arg(text);
        }
    }
}

/// Parse IPPcode23 XML source text into an order-sorted instruction
/// sequence (spec §6.2).
///
/// Returns `Fault::InvalidXml` for malformed XML (bad tags, unclosed
/// elements, encoding errors) and `Fault::MalformedProgram` for
/// well-formed XML that does not meet the IPPcode23 program shape.
pub fn load_program(xml: &str) -> Result<Vec<Instruction>, Fault> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text = false;

    let mut state = ParserState::default();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Fault::InvalidXml(e.to_string()))?;
        match event {
            Event::Eof => break,
            Event::Start(e) => state.start_element(&e, false)?,
            Event::Empty(e) => state.start_element(&e, true)?,
            Event::Text(e) => {
                if state.in_arg {
                    let text = e.unescape().map_err(|e| Fault::InvalidXml(e.to_string()))?;
                    state.cur_arg_text.push_str(&text);
                }
            }
            Event::CData(e) => {
                if state.in_arg {
                    let bytes = e.into_inner();
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|err| Fault::InvalidXml(err.to_string()))?;
                    state.cur_arg_text.push_str(text);
                }
            }
            Event::End(e) => state.end_element(e.name().as_ref()),
            _ => {}
        }
    }

    if !state.saw_program_root {
        return Err(Fault::MalformedProgram(
            "missing root <program> element".to_string(),
        ));
    }

    let mut raw_instructions = state.raw_instructions;
    raw_instructions.sort_by_key(|r| r.order);
    for window in raw_instructions.windows(2) {
        if window[0].order == window[1].order {
            return Err(Fault::MalformedProgram(format!(
                "duplicate instruction order {}",
                window[0].order
            )));
        }
    }

    raw_instructions.into_iter().map(build_instruction).collect()
}

fn is_arg_element(name: &[u8]) -> bool {
    name == b"arg1" || name == b"arg2" || name == b"arg3"
}

fn find_attr(e: &quick_xml::events::BytesStart, key: &[u8]) -> Result<Option<String>, Fault> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Fault::InvalidXml(e.to_string()))?;
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| Fault::InvalidXml(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
