//! Text front-end for the circuit format.
//!
//! A circuit file is a header followed by a gate list:
//!
//! ```text
//! # a controlled-NOT
//! .v a,b
//! .i a,b
//! .o a,b
//! .c
//! BEGIN
//! t2 a,b
//! END
//! ```
//!
//! Header tags (`.v`/`.i`/`.o`/`.c`) are case-sensitive; `BEGIN`/`END` are
//! not. `.v` declares every variable top-to-bottom (id 0 is the topmost
//! line), `.i`/`.o` mark subsets as inputs/outputs, and `.c` assigns
//! constants to the non-input variables in variable order. Gate mnemonics
//! are one letter, optionally `'` for an inverse, then the operand count
//! and a comma-separated operand list in strictly increasing variable
//! order. `#` starts a comment.
//!
//! Every error carries the 1-based line and 0-based column where parsing
//! stopped and renders as `line:col: message`.

use std::collections::HashMap;

use thiserror::Error;

use crate::circuit::{Gate, GateKind};

/// Largest accepted operand count and constant value.
const MAX_PARAM: u32 = 0x7fff;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{line}:{col}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub col: usize,
    pub kind: ErrorKind,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("missing variable listing (.v)")]
    MissingVariables,
    #[error("missing input variable listing (.i)")]
    MissingInputs,
    #[error("missing output variable listing (.o)")]
    MissingOutputs,
    #[error("missing constant input variable listing (.c)")]
    MissingConstants,
    #[error("duplicate variable listing (.v)")]
    DuplicateVariables,
    #[error("duplicate input variable listing (.i)")]
    DuplicateInputs,
    #[error("duplicate output variable listing (.o)")]
    DuplicateOutputs,
    #[error("duplicate constant input variable listing (.c)")]
    DuplicateConstants,
    #[error("variable names must begin with an alpha character")]
    BadName,
    #[error("duplicate variable name")]
    DuplicateName,
    #[error("missing variable name")]
    MissingName,
    #[error("whitespace at beginning or end of variable name")]
    PaddedName,
    #[error("undeclared input")]
    UndeclaredInput,
    #[error("duplicate input")]
    DuplicateInput,
    #[error("undeclared output")]
    UndeclaredOutput,
    #[error("duplicate output")]
    DuplicateOutput,
    #[error("undeclared variable")]
    UndeclaredVariable,
    #[error("expected number >= 0")]
    BadConstant,
    #[error("constant value too big")]
    ConstantTooBig,
    #[error("more constants than missing inputs")]
    TooManyConstants,
    #[error("constant count mismatch")]
    ConstantCountMismatch,
    #[error("expected parameter count")]
    BadParamCount,
    #[error("parameter count too big")]
    ParamCountTooBig,
    #[error("too many parameters")]
    TooManyParams,
    #[error("too few parameters")]
    TooFewParams,
    #[error("parameters must be in variable order")]
    UnorderedParams,
    #[error("expected tag or BEGIN")]
    ExpectedTag,
    #[error("expected gate or END")]
    ExpectedGate,
    #[error("expected eol or comment")]
    ExpectedEol,
}

/// A parsed circuit: the variable declarations plus the gate stream the
/// compiler consumes.
#[derive(Debug, Clone)]
pub struct Program {
    pub variables: Vec<String>,
    pub is_input: Vec<bool>,
    pub is_output: Vec<bool>,
    /// Constant assignment per variable; inputs stay `None`.
    pub constants: Vec<Option<u32>>,
    pub inputs: Vec<u32>,
    pub outputs: Vec<u32>,
    pub gates: Vec<Gate>,
    name_to_id: HashMap<String, u32>,
}

impl Program {
    pub fn num_vars(&self) -> u32 {
        self.variables.len() as u32
    }

    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }
}

/// Cursor over a single line, tracking the byte column for errors.
struct Cursor<'a> {
    line: &'a str,
    pos: usize,
    line_no: usize,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str, line_no: usize) -> Self {
        Self { line, pos: 0, line_no }
    }

    fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// At end of meaningful input: end of line or start of a comment.
    fn at_end(&self) -> bool {
        matches!(self.peek(), None | Some('#'))
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }
    }

    fn error(&self, kind: ErrorKind) -> ParseError {
        ParseError {
            line: self.line_no,
            col: self.pos,
            kind,
        }
    }

    /// Consume a keyword (case-insensitive) followed by end or whitespace.
    fn keyword_ci(&mut self, kw: &str) -> bool {
        // Byte-wise so that stray non-ASCII input cannot split a
        // character at the keyword boundary.
        let rest = self.rest().as_bytes();
        if rest.len() >= kw.len() && rest[..kw.len()].eq_ignore_ascii_case(kw.as_bytes()) {
            let after_ok = match rest.get(kw.len()) {
                None => true,
                Some(b) => b.is_ascii_whitespace(),
            };
            if after_ok {
                self.pos += kw.len();
                return true;
            }
        }
        false
    }

    /// Consume a tag (case-sensitive) followed by end or whitespace.
    fn tag(&mut self, tag: &str) -> bool {
        let rest = self.rest();
        if let Some(after) = rest.strip_prefix(tag) {
            if after.is_empty() || after.starts_with(|c: char| c.is_whitespace()) {
                self.pos += tag.len();
                return true;
            }
        }
        false
    }

    /// Walk a comma-separated list up to end of line or comment, handing
    /// each raw item (with its column) to the callback.
    fn list(&mut self, mut each: impl FnMut(&'a str, usize) -> Result<(), ParseError>) -> Result<(), ParseError> {
        while !self.at_end() {
            let start = self.pos;
            while !self.at_end() && self.peek() != Some(',') {
                self.bump();
            }
            let item = &self.line[start..self.pos];
            if item.is_empty() {
                return Err(ParseError {
                    line: self.line_no,
                    col: start,
                    kind: ErrorKind::MissingName,
                });
            }
            if item.starts_with(|c: char| c.is_whitespace())
                || item.ends_with(|c: char| c.is_whitespace())
            {
                return Err(ParseError {
                    line: self.line_no,
                    col: start,
                    kind: ErrorKind::PaddedName,
                });
            }
            each(item, start)?;
            if self.peek() == Some(',') {
                self.bump();
            }
        }
        Ok(())
    }

    /// Decimal count after a gate mnemonic: no leading zero, bounded,
    /// followed by end or whitespace.
    fn param_count(&mut self) -> Result<u32, ParseError> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c.is_ascii_digit() && c != '0' => {}
            _ => return Err(self.error(ErrorKind::BadParamCount)),
        }
        let mut count: u32 = 0;
        while let Some(c) = self.peek() {
            let Some(digit) = c.to_digit(10) else { break };
            count = count * 10 + digit;
            if count > MAX_PARAM {
                return Err(self.error(ErrorKind::ParamCountTooBig));
            }
            self.bump();
        }
        if self.peek().is_some_and(|c| !c.is_whitespace()) {
            return Err(self.error(ErrorKind::BadParamCount));
        }
        Ok(count)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum State {
    Tags,
    Gates,
    End,
}

struct Parser {
    program: Program,
    state: State,
    has_variables: bool,
    has_inputs: bool,
    has_outputs: bool,
    has_constants: bool,
}

pub fn parse(text: &str) -> Result<Program, ParseError> {
    let mut parser = Parser {
        program: Program {
            variables: Vec::new(),
            is_input: Vec::new(),
            is_output: Vec::new(),
            constants: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            gates: Vec::new(),
            name_to_id: HashMap::new(),
        },
        state: State::Tags,
        has_variables: false,
        has_inputs: false,
        has_outputs: false,
        has_constants: false,
    };

    for (index, line) in text.lines().enumerate() {
        if parser.state == State::End {
            break;
        }
        let mut cursor = Cursor::new(line, index + 1);
        parser.line(&mut cursor)?;
    }

    Ok(parser.program)
}

impl Parser {
    fn line(&mut self, cursor: &mut Cursor<'_>) -> Result<(), ParseError> {
        cursor.skip_ws();
        if cursor.at_end() {
            return Ok(());
        }

        match self.state {
            State::Tags => self.tag_line(cursor)?,
            State::Gates => self.gate_line(cursor)?,
            State::End => unreachable!("lines after END are never dispatched"),
        }

        cursor.skip_ws();
        if !cursor.at_end() {
            return Err(cursor.error(ErrorKind::ExpectedEol));
        }
        Ok(())
    }

    fn tag_line(&mut self, cursor: &mut Cursor<'_>) -> Result<(), ParseError> {
        if cursor.keyword_ci("BEGIN") {
            if !self.has_variables {
                return Err(cursor.error(ErrorKind::MissingVariables));
            }
            if !self.has_inputs {
                return Err(cursor.error(ErrorKind::MissingInputs));
            }
            if !self.has_outputs {
                return Err(cursor.error(ErrorKind::MissingOutputs));
            }
            if !self.has_constants {
                return Err(cursor.error(ErrorKind::MissingConstants));
            }
            let missing = self
                .program
                .is_input
                .iter()
                .zip(&self.program.constants)
                .any(|(&input, constant)| !input && constant.is_none());
            if missing {
                return Err(cursor.error(ErrorKind::ConstantCountMismatch));
            }
            self.state = State::Gates;
            return Ok(());
        }

        if cursor.tag(".v") {
            if self.has_variables {
                return Err(cursor.error(ErrorKind::DuplicateVariables));
            }
            self.has_variables = true;
            cursor.skip_ws();

            let program = &mut self.program;
            let line_no = cursor.line_no;
            cursor.list(|name, col| {
                if !name.starts_with(|c: char| c.is_alphabetic()) {
                    return Err(ParseError { line: line_no, col, kind: ErrorKind::BadName });
                }
                let id = program.variables.len() as u32;
                if program.name_to_id.insert(name.to_string(), id).is_some() {
                    return Err(ParseError { line: line_no, col, kind: ErrorKind::DuplicateName });
                }
                program.variables.push(name.to_string());
                Ok(())
            })?;

            let n = self.program.variables.len();
            self.program.is_input = vec![false; n];
            self.program.is_output = vec![false; n];
            self.program.constants = vec![None; n];
            return Ok(());
        }

        if cursor.tag(".i") {
            if !self.has_variables {
                return Err(cursor.error(ErrorKind::MissingVariables));
            }
            if self.has_inputs {
                return Err(cursor.error(ErrorKind::DuplicateInputs));
            }
            self.has_inputs = true;
            cursor.skip_ws();

            let program = &mut self.program;
            let line_no = cursor.line_no;
            cursor.list(|name, col| {
                if !name.starts_with(|c: char| c.is_alphabetic()) {
                    return Err(ParseError { line: line_no, col, kind: ErrorKind::BadName });
                }
                let Some(&id) = program.name_to_id.get(name) else {
                    return Err(ParseError { line: line_no, col, kind: ErrorKind::UndeclaredInput });
                };
                if program.is_input[id as usize] {
                    return Err(ParseError { line: line_no, col, kind: ErrorKind::DuplicateInput });
                }
                program.is_input[id as usize] = true;
                program.inputs.push(id);
                Ok(())
            })?;
            return Ok(());
        }

        if cursor.tag(".o") {
            if !self.has_variables {
                return Err(cursor.error(ErrorKind::MissingVariables));
            }
            if self.has_outputs {
                return Err(cursor.error(ErrorKind::DuplicateOutputs));
            }
            self.has_outputs = true;
            cursor.skip_ws();

            let program = &mut self.program;
            let line_no = cursor.line_no;
            cursor.list(|name, col| {
                if !name.starts_with(|c: char| c.is_alphabetic()) {
                    return Err(ParseError { line: line_no, col, kind: ErrorKind::BadName });
                }
                let Some(&id) = program.name_to_id.get(name) else {
                    return Err(ParseError { line: line_no, col, kind: ErrorKind::UndeclaredOutput });
                };
                if program.is_output[id as usize] {
                    return Err(ParseError { line: line_no, col, kind: ErrorKind::DuplicateOutput });
                }
                program.is_output[id as usize] = true;
                program.outputs.push(id);
                Ok(())
            })?;
            return Ok(());
        }

        if cursor.tag(".c") {
            if !self.has_variables {
                return Err(cursor.error(ErrorKind::MissingVariables));
            }
            if !self.has_inputs {
                return Err(cursor.error(ErrorKind::MissingInputs));
            }
            if self.has_constants {
                return Err(cursor.error(ErrorKind::DuplicateConstants));
            }
            self.has_constants = true;
            cursor.skip_ws();

            let program = &mut self.program;
            let line_no = cursor.line_no;
            // Constants fill the non-input variables in variable order.
            let mut next_var = 0usize;
            cursor.list(|item, col| {
                let mut value: u32 = 0;
                for c in item.chars() {
                    let Some(digit) = c.to_digit(10) else {
                        return Err(ParseError { line: line_no, col, kind: ErrorKind::BadConstant });
                    };
                    value = value * 10 + digit;
                    if value > MAX_PARAM {
                        return Err(ParseError {
                            line: line_no,
                            col,
                            kind: ErrorKind::ConstantTooBig,
                        });
                    }
                }
                while next_var < program.variables.len() && program.is_input[next_var] {
                    next_var += 1;
                }
                if next_var >= program.variables.len() {
                    return Err(ParseError {
                        line: line_no,
                        col,
                        kind: ErrorKind::TooManyConstants,
                    });
                }
                program.constants[next_var] = Some(value);
                next_var += 1;
                Ok(())
            })?;
            return Ok(());
        }

        Err(cursor.error(ErrorKind::ExpectedTag))
    }

    fn gate_line(&mut self, cursor: &mut Cursor<'_>) -> Result<(), ParseError> {
        if cursor.keyword_ci("END") {
            self.state = State::End;
            return Ok(());
        }

        let Some(letter) = cursor.peek().map(|c| c.to_ascii_lowercase()) else {
            return Err(cursor.error(ErrorKind::ExpectedGate));
        };
        if !letter.is_ascii_alphabetic() {
            return Err(cursor.error(ErrorKind::ExpectedGate));
        }
        cursor.bump();
        let inverse = cursor.peek() == Some('\'');
        if inverse {
            cursor.bump();
        }

        let kind = match (letter, inverse) {
            ('t', false) => GateKind::Toffoli,
            ('f', false) => GateKind::Fredkin,
            ('y', false) => GateKind::PauliY,
            ('z', false) => GateKind::PauliZ,
            ('v', false) => GateKind::SqrtNot,
            ('v', true) => GateKind::SqrtNotInv,
            ('h', false) => GateKind::Hadamard,
            ('q', false) => GateKind::Phase,
            ('q', true) => GateKind::PhaseInv,
            _ => return Err(cursor.error(ErrorKind::ExpectedGate)),
        };

        let count = cursor.param_count()? as usize;
        let min_operands = if kind == GateKind::Fredkin { 2 } else { 1 };
        if count < min_operands {
            return Err(cursor.error(ErrorKind::TooFewParams));
        }
        cursor.skip_ws();

        let program = &mut self.program;
        let line_no = cursor.line_no;
        let mut operands: Vec<u32> = Vec::with_capacity(count);
        cursor.list(|name, col| {
            if operands.len() >= count {
                return Err(ParseError { line: line_no, col, kind: ErrorKind::TooManyParams });
            }
            let Some(&id) = program.name_to_id.get(name) else {
                return Err(ParseError {
                    line: line_no,
                    col,
                    kind: ErrorKind::UndeclaredVariable,
                });
            };
            if operands.last().is_some_and(|&last| last >= id) {
                return Err(ParseError {
                    line: line_no,
                    col,
                    kind: ErrorKind::UnorderedParams,
                });
            }
            operands.push(id);
            Ok(())
        })?;
        if operands.len() < count {
            return Err(cursor.error(ErrorKind::TooFewParams));
        }

        self.program.gates.push(Gate::new(kind, operands));
        Ok(())
    }
}
