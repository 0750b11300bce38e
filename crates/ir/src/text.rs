//! The textual form of the IR.
//!
//! ```text
//! func @clamp(%x) {
//!   range %x [0, 10]
//! entry:
//!   %c = icmp sgt %x, 20
//!   br %c, big, small
//! big:
//!   ret 20
//! small:
//!   ret %x
//! }
//! ```
//!
//! `range` lines annotate a value with the interval a range analysis computed for it. They are
//! not part of the function itself and are returned next to it by [`parse_module`].

use crate::function::{
    BinOp, BlockIdx, Function, Inst, InstKind, Predicate, Terminator, Value, ValueId,
};
use crate::range::Range;
use rustc_hash::FxHashMap;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unexpected character `{ch}`")]
    UnexpectedChar { line: usize, ch: char },
    #[error("line {line}: invalid integer literal `{text}`")]
    InvalidInt { line: usize, text: String },
    #[error("line {line}: expected {expected}, found {found}")]
    Expected {
        line: usize,
        expected: &'static str,
        found: String,
    },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },
    #[error("line {line}: unknown instruction `{name}`")]
    UnknownOpcode { line: usize, name: String },
    #[error("line {line}: unknown value `%{name}`")]
    UnknownValue { line: usize, name: String },
    #[error("line {line}: unknown block `{name}`")]
    UnknownBlock { line: usize, name: String },
    #[error("line {line}: `%{name}` is defined more than once")]
    Redefinition { line: usize, name: String },
    #[error("line {line}: block `{name}` is defined more than once")]
    DuplicateBlock { line: usize, name: String },
    #[error("line {line}: block `{name}` does not end in a terminator")]
    MissingTerminator { line: usize, name: String },
    #[error("line {line}: statement is not inside a block")]
    OutsideBlock { line: usize },
    #[error("line {line}: function `@{name}` has no blocks")]
    EmptyFunction { line: usize, name: String },
    #[error("expected a single function, found {count}")]
    NotSingleFunction { count: usize },
    #[error("line {line}: range [{lo}, {hi}] has its lower bound above its upper bound")]
    InvalidRange { line: usize, lo: i64, hi: i64 },
}

/// A function read from text together with the range annotations found in its body.
#[derive(Debug)]
pub struct ParsedFunction {
    pub func: Function,
    pub ranges: Vec<(ValueId, Range)>,
}

pub fn parse_module(src: &str) -> Result<Vec<ParsedFunction>, ParseError> {
    let tokens = Lexer::lex(src)?;
    let mut parser = Parser { tokens, pos: 0 };
    let mut functions = Vec::new();
    while parser.peek().is_some() {
        functions.push(parser.parse_function()?);
    }
    Ok(functions)
}

/// Parses text that must hold exactly one function.
pub fn parse_function(src: &str) -> Result<ParsedFunction, ParseError> {
    let mut functions = parse_module(src)?;
    match functions.len() {
        1 => Ok(functions.remove(0)),
        0 => Err(ParseError::UnexpectedEof {
            expected: "`func`",
        }),
        count => Err(ParseError::NotSingleFunction { count }),
    }
}

#[derive(PartialEq, Debug, Clone)]
enum Token {
    /// Any bare word: keywords, opcodes and block labels
    Ident(String),
    /// @name
    Global(String),
    /// %name
    Value(String),
    Int(i64),
    Colon,
    Comma,
    Equals,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftCurlyBrace,
    RightCurlyBrace,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(word) => write!(f, "`{}`", word),
            Token::Global(name) => write!(f, "`@{}`", name),
            Token::Value(name) => write!(f, "`%{}`", name),
            Token::Int(int) => write!(f, "`{}`", int),
            Token::Colon => write!(f, "`:`"),
            Token::Comma => write!(f, "`,`"),
            Token::Equals => write!(f, "`=`"),
            Token::LeftParen => write!(f, "`(`"),
            Token::RightParen => write!(f, "`)`"),
            Token::LeftBracket => write!(f, "`[`"),
            Token::RightBracket => write!(f, "`]`"),
            Token::LeftCurlyBrace => write!(f, "`{{`"),
            Token::RightCurlyBrace => write!(f, "`}}`"),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

struct Lexer<'a> {
    src_iter: Peekable<Chars<'a>>,
    line: usize,
    tokens: Vec<(Token, usize)>,
}

impl<'a> Lexer<'a> {
    fn lex(input: &'a str) -> Result<Vec<(Token, usize)>, ParseError> {
        let mut lexer = Lexer {
            src_iter: input.chars().peekable(),
            line: 1,
            tokens: Vec::new(),
        };
        while let Some(&c) = lexer.src_iter.peek() {
            let token = match c {
                ':' => Token::Colon,
                ',' => Token::Comma,
                '=' => Token::Equals,
                '(' => Token::LeftParen,
                ')' => Token::RightParen,
                '[' => Token::LeftBracket,
                ']' => Token::RightBracket,
                '{' => Token::LeftCurlyBrace,
                '}' => Token::RightCurlyBrace,
                '#' => {
                    lexer.skip_line();
                    continue;
                }
                '%' => {
                    lexer.src_iter.next();
                    let name = lexer.read_ident();
                    lexer.push(Token::Value(name));
                    continue;
                }
                '@' => {
                    lexer.src_iter.next();
                    let name = lexer.read_ident();
                    lexer.push(Token::Global(name));
                    continue;
                }
                '\n' => {
                    lexer.line += 1;
                    lexer.src_iter.next();
                    continue;
                }
                _ if c.is_whitespace() => {
                    lexer.src_iter.next();
                    continue;
                }
                '-' => {
                    lexer.read_int()?;
                    continue;
                }
                _ if c.is_ascii_digit() => {
                    lexer.read_int()?;
                    continue;
                }
                _ if c.is_ascii_alphabetic() || c == '_' => {
                    let word = lexer.read_ident();
                    lexer.push(Token::Ident(word));
                    continue;
                }
                _ => {
                    return Err(ParseError::UnexpectedChar {
                        line: lexer.line,
                        ch: c,
                    })
                }
            };
            lexer.push(token);
            lexer.src_iter.next();
        }
        Ok(lexer.tokens)
    }

    fn push(&mut self, token: Token) {
        self.tokens.push((token, self.line));
    }

    fn read_ident(&mut self) -> String {
        let mut str = String::new();
        while let Some(&c) = self.src_iter.peek() {
            if !is_ident_char(c) {
                break;
            }
            str.push(c);
            self.src_iter.next();
        }
        str
    }

    fn read_int(&mut self) -> Result<(), ParseError> {
        let mut num_string = String::new();
        if let Some(c) = self.src_iter.next_if_eq(&'-') {
            num_string.push(c);
        }
        while let Some(c) = self.src_iter.next_if(char::is_ascii_digit) {
            num_string.push(c);
        }
        let num = num_string.parse().map_err(|_| ParseError::InvalidInt {
            line: self.line,
            text: num_string.clone(),
        })?;
        self.push(Token::Int(num));
        Ok(())
    }

    fn skip_line(&mut self) {
        for c in self.src_iter.by_ref() {
            if c == '\n' {
                self.line += 1;
                break;
            }
        }
    }
}

/// A statement with its operands still named, resolved once every definition in the function is
/// known.
enum RawOperand {
    Value(String),
    Const(i64),
}

enum RawInst {
    Cmp(Predicate, RawOperand, RawOperand),
    Binary(BinOp, RawOperand, RawOperand),
    Copy(RawOperand),
    Call(String, Vec<RawOperand>),
}

enum RawTerm {
    Jump(String),
    Branch(RawOperand, String, String),
    Return(Option<RawOperand>),
}

struct RawBlock {
    name: String,
    line: usize,
    insts: Vec<(Option<String>, RawInst, usize)>,
    term: Option<(RawTerm, usize)>,
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(token, _)| token)
    }

    fn line(&self) -> usize {
        match self.tokens.get(self.pos) {
            Some(&(_, line)) => line,
            None => self.tokens.last().map_or(1, |&(_, line)| line),
        }
    }

    fn next(&mut self, expected: &'static str) -> Result<Token, ParseError> {
        match self.tokens.get(self.pos) {
            Some((token, _)) => {
                self.pos += 1;
                Ok(token.clone())
            }
            None => Err(ParseError::UnexpectedEof { expected }),
        }
    }

    fn unexpected(&self, expected: &'static str, found: &Token) -> ParseError {
        ParseError::Expected {
            // The offending token was already consumed.
            line: self.tokens[self.pos - 1].1,
            expected,
            found: found.to_string(),
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), ParseError> {
        let found = self.next(expected)?;
        if found != token {
            return Err(self.unexpected(expected, &found));
        }
        Ok(())
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.next(expected)? {
            Token::Ident(word) => Ok(word),
            found => Err(self.unexpected(expected, &found)),
        }
    }

    fn expect_int(&mut self) -> Result<i64, ParseError> {
        match self.next("an integer")? {
            Token::Int(int) => Ok(int),
            found => Err(self.unexpected("an integer", &found)),
        }
    }

    fn parse_operand(&mut self) -> Result<RawOperand, ParseError> {
        match self.next("an operand")? {
            Token::Value(name) => Ok(RawOperand::Value(name)),
            Token::Int(int) => Ok(RawOperand::Const(int)),
            found => Err(self.unexpected("an operand", &found)),
        }
    }

    fn parse_two_operands(&mut self) -> Result<(RawOperand, RawOperand), ParseError> {
        let lhs = self.parse_operand()?;
        self.expect(Token::Comma, "`,`")?;
        let rhs = self.parse_operand()?;
        Ok((lhs, rhs))
    }

    fn parse_inst(&mut self) -> Result<RawInst, ParseError> {
        let line = self.line();
        let opcode = self.expect_ident("an instruction")?;
        if let Some(op) = BinOp::from_mnemonic(&opcode) {
            let (lhs, rhs) = self.parse_two_operands()?;
            return Ok(RawInst::Binary(op, lhs, rhs));
        }
        match opcode.as_str() {
            "icmp" => {
                let line = self.line();
                let mnemonic = self.expect_ident("a comparison predicate")?;
                let Some(pred) = Predicate::from_mnemonic(&mnemonic) else {
                    return Err(ParseError::Expected {
                        line,
                        expected: "a comparison predicate",
                        found: format!("`{}`", mnemonic),
                    });
                };
                let (lhs, rhs) = self.parse_two_operands()?;
                Ok(RawInst::Cmp(pred, lhs, rhs))
            }
            "copy" => Ok(RawInst::Copy(self.parse_operand()?)),
            "call" => {
                let callee = match self.next("a callee")? {
                    Token::Global(name) => name,
                    found => return Err(self.unexpected("a callee", &found)),
                };
                self.expect(Token::LeftParen, "`(`")?;
                let mut args = Vec::new();
                if self.peek() == Some(&Token::RightParen) {
                    self.pos += 1;
                } else {
                    loop {
                        args.push(self.parse_operand()?);
                        match self.next("`,` or `)`")? {
                            Token::Comma => continue,
                            Token::RightParen => break,
                            found => return Err(self.unexpected("`,` or `)`", &found)),
                        }
                    }
                }
                Ok(RawInst::Call(callee, args))
            }
            _ => Err(ParseError::UnknownOpcode { line, name: opcode }),
        }
    }

    fn parse_function(&mut self) -> Result<ParsedFunction, ParseError> {
        let header_line = self.line();
        let keyword = self.expect_ident("`func`")?;
        if keyword != "func" {
            return Err(self.unexpected("`func`", &Token::Ident(keyword)));
        }
        let name = match self.next("a function name")? {
            Token::Global(name) => name,
            found => return Err(self.unexpected("a function name", &found)),
        };

        self.expect(Token::LeftParen, "`(`")?;
        let mut params = Vec::new();
        if self.peek() == Some(&Token::RightParen) {
            self.pos += 1;
        } else {
            loop {
                let line = self.line();
                match self.next("a parameter")? {
                    Token::Value(param) => params.push((param, line)),
                    found => return Err(self.unexpected("a parameter", &found)),
                }
                match self.next("`,` or `)`")? {
                    Token::Comma => continue,
                    Token::RightParen => break,
                    found => return Err(self.unexpected("`,` or `)`", &found)),
                }
            }
        }
        self.expect(Token::LeftCurlyBrace, "`{`")?;

        let mut ranges = Vec::new();
        let mut blocks: Vec<RawBlock> = Vec::new();
        loop {
            let line = self.line();
            match self.peek().cloned() {
                None => return Err(ParseError::UnexpectedEof { expected: "`}`" }),
                Some(Token::RightCurlyBrace) => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Ident(word))
                    if word == "range" && self.peek_nth(1) != Some(&Token::Colon) =>
                {
                    self.pos += 1;
                    let value = match self.next("a value")? {
                        Token::Value(value) => value,
                        found => return Err(self.unexpected("a value", &found)),
                    };
                    self.expect(Token::LeftBracket, "`[`")?;
                    let lo = self.expect_int()?;
                    self.expect(Token::Comma, "`,`")?;
                    let hi = self.expect_int()?;
                    self.expect(Token::RightBracket, "`]`")?;
                    let Some(range) = Range::try_new(lo, hi) else {
                        return Err(ParseError::InvalidRange { line, lo, hi });
                    };
                    ranges.push((value, range, line));
                }
                Some(Token::Ident(_)) if self.peek_nth(1) == Some(&Token::Colon) => {
                    let label = self.expect_ident("a block label")?;
                    self.pos += 1;
                    if blocks.iter().any(|block| block.name == label) {
                        return Err(ParseError::DuplicateBlock { line, name: label });
                    }
                    blocks.push(RawBlock {
                        name: label,
                        line,
                        insts: Vec::new(),
                        term: None,
                    });
                }
                Some(_) => {
                    let block = match blocks.last_mut() {
                        Some(block) if block.term.is_none() => block,
                        _ => return Err(ParseError::OutsideBlock { line }),
                    };
                    match self.next("a statement")? {
                        Token::Value(result) => {
                            self.expect(Token::Equals, "`=`")?;
                            let inst = self.parse_inst()?;
                            block.insts.push((Some(result), inst, line));
                        }
                        Token::Ident(word) if word == "jmp" => {
                            let dest = self.expect_ident("a block label")?;
                            block.term = Some((RawTerm::Jump(dest), line));
                        }
                        Token::Ident(word) if word == "br" => {
                            let cond = self.parse_operand()?;
                            self.expect(Token::Comma, "`,`")?;
                            let then_dest = self.expect_ident("a block label")?;
                            self.expect(Token::Comma, "`,`")?;
                            let else_dest = self.expect_ident("a block label")?;
                            block.term = Some((RawTerm::Branch(cond, then_dest, else_dest), line));
                        }
                        Token::Ident(word) if word == "ret" => {
                            let value = match self.peek() {
                                Some(Token::Value(_) | Token::Int(_)) => {
                                    Some(self.parse_operand()?)
                                }
                                _ => None,
                            };
                            block.term = Some((RawTerm::Return(value), line));
                        }
                        Token::Ident(_) => {
                            self.pos -= 1;
                            let inst = self.parse_inst()?;
                            block.insts.push((None, inst, line));
                        }
                        found => return Err(self.unexpected("a statement", &found)),
                    }
                }
            }
        }

        build_function(name, header_line, params, ranges, blocks)
    }
}

fn build_function(
    name: String,
    header_line: usize,
    params: Vec<(String, usize)>,
    ranges: Vec<(String, Range, usize)>,
    blocks: Vec<RawBlock>,
) -> Result<ParsedFunction, ParseError> {
    let Some(first) = blocks.first() else {
        return Err(ParseError::EmptyFunction {
            line: header_line,
            name,
        });
    };
    let mut func = Function::new(name, first.name.clone());

    let mut values: FxHashMap<String, ValueId> = FxHashMap::default();
    for (param, line) in &params {
        if values.contains_key(param) {
            return Err(ParseError::Redefinition {
                line: *line,
                name: param.clone(),
            });
        }
        values.insert(param.clone(), func.add_param(param.clone()));
    }
    let mut results = Vec::new();
    for (result, _, line) in blocks.iter().flat_map(|block| &block.insts) {
        let Some(result) = result else {
            results.push(None);
            continue;
        };
        if values.contains_key(result) {
            return Err(ParseError::Redefinition {
                line: *line,
                name: result.clone(),
            });
        }
        let id = func.new_value(result.clone());
        values.insert(result.clone(), id);
        results.push(Some(id));
    }

    let mut block_ids: FxHashMap<&str, BlockIdx> = FxHashMap::default();
    block_ids.insert(&first.name, func.entry());
    for block in &blocks[1..] {
        let idx = func.add_block(block.name.clone());
        block_ids.insert(&block.name, idx);
    }

    let operand = |raw: &RawOperand, line: usize| match raw {
        RawOperand::Const(int) => Ok(Value::Const(*int)),
        RawOperand::Value(name) => match values.get(name) {
            Some(&id) => Ok(Value::Local(id)),
            None => Err(ParseError::UnknownValue {
                line,
                name: name.clone(),
            }),
        },
    };
    let block_id = |name: &str, line: usize| match block_ids.get(name) {
        Some(&idx) => Ok(idx),
        None => Err(ParseError::UnknownBlock {
            line,
            name: name.to_string(),
        }),
    };

    let mut results = results.into_iter();
    for block in &blocks {
        let idx = block_ids[block.name.as_str()];
        for (_, raw, line) in &block.insts {
            let line = *line;
            let kind = match raw {
                RawInst::Cmp(pred, lhs, rhs) => InstKind::Cmp {
                    pred: *pred,
                    lhs: operand(lhs, line)?,
                    rhs: operand(rhs, line)?,
                },
                RawInst::Binary(op, lhs, rhs) => InstKind::Binary {
                    op: *op,
                    lhs: operand(lhs, line)?,
                    rhs: operand(rhs, line)?,
                },
                RawInst::Copy(value) => InstKind::Copy(operand(value, line)?),
                RawInst::Call(callee, args) => InstKind::Call {
                    callee: callee.clone(),
                    args: args
                        .iter()
                        .map(|arg| operand(arg, line))
                        .collect::<Result<_, _>>()?,
                },
            };
            let result = results.next().flatten();
            func.push_inst(idx, Inst::new(result, kind));
        }

        let Some((raw, line)) = &block.term else {
            return Err(ParseError::MissingTerminator {
                line: block.line,
                name: block.name.clone(),
            });
        };
        let line = *line;
        let term = match raw {
            RawTerm::Jump(dest) => Terminator::Jump(block_id(dest, line)?),
            RawTerm::Branch(cond, then_dest, else_dest) => Terminator::Branch {
                cond: operand(cond, line)?,
                then_dest: block_id(then_dest, line)?,
                else_dest: block_id(else_dest, line)?,
            },
            RawTerm::Return(value) => Terminator::Return(
                value
                    .as_ref()
                    .map(|value| operand(value, line))
                    .transpose()?,
            ),
        };
        func.set_terminator(idx, term);
    }

    let ranges = ranges
        .into_iter()
        .map(|(name, range, line)| match values.get(&name) {
            Some(&id) => Ok((id, range)),
            None => Err(ParseError::UnknownValue { line, name }),
        })
        .collect::<Result<_, _>>()?;

    Ok(ParsedFunction { func, ranges })
}

struct FmtContext<'a> {
    func: &'a Function,
}

impl FmtContext<'_> {
    fn value(&self, f: &mut fmt::Formatter<'_>, value: Value) -> fmt::Result {
        match value {
            Value::Local(id) => write!(f, "%{}", self.func.value_name(id)),
            Value::Const(int) => write!(f, "{}", int),
        }
    }

    fn inst(&self, f: &mut fmt::Formatter<'_>, inst: &Inst) -> fmt::Result {
        write!(f, "  ")?;
        if let Some(result) = inst.result {
            write!(f, "%{} = ", self.func.value_name(result))?;
        }
        match &inst.kind {
            InstKind::Cmp { pred, lhs, rhs } => {
                write!(f, "icmp {} ", pred.mnemonic())?;
                self.value(f, *lhs)?;
                write!(f, ", ")?;
                self.value(f, *rhs)
            }
            InstKind::Binary { op, lhs, rhs } => {
                write!(f, "{} ", op.mnemonic())?;
                self.value(f, *lhs)?;
                write!(f, ", ")?;
                self.value(f, *rhs)
            }
            InstKind::Copy(value) => {
                write!(f, "copy ")?;
                self.value(f, *value)
            }
            InstKind::Call { callee, args } => {
                write!(f, "call @{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    self.value(f, *arg)?;
                }
                write!(f, ")")
            }
        }
    }

    fn terminator(&self, f: &mut fmt::Formatter<'_>, term: &Terminator) -> fmt::Result {
        let name = |idx: BlockIdx| &self.func[idx].name;
        match *term {
            Terminator::Jump(dest) => write!(f, "  jmp {}", name(dest)),
            Terminator::Branch {
                cond,
                then_dest,
                else_dest,
            } => {
                write!(f, "  br ")?;
                self.value(f, cond)?;
                write!(f, ", {}, {}", name(then_dest), name(else_dest))
            }
            Terminator::Return(None) => write!(f, "  ret"),
            Terminator::Return(Some(value)) => {
                write!(f, "  ret ")?;
                self.value(f, value)
            }
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = FmtContext { func: self };
        write!(f, "func @{}(", self.name)?;
        for (i, &param) in self.params().iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            ctx.value(f, Value::Local(param))?;
        }
        writeln!(f, ") {{")?;
        for idx in self.block_indices() {
            let block = &self[idx];
            writeln!(f, "{}:", block.name)?;
            for inst in &block.insts {
                ctx.inst(f, inst)?;
                writeln!(f)?;
            }
            ctx.terminator(f, block.terminator())?;
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIAMOND: &str = r"
        # max of two values
        func @max(%x, %y) {
          range %x [10, 20]
          range %y [-5, 5]
        entry:
          %c = icmp sgt %x, %y
          br %c, then, else
        then:
          jmp exit
        else:
          call @log(%y, -1)
          jmp exit
        exit:
          %r = add %x, %y
          ret %r
        }
    ";

    #[test]
    fn test_lexer_branch() {
        use Token::*;
        let actual_tokens: Vec<Token> = Lexer::lex("%c = icmp ule %x, -3\n  br %c, a, b")
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect();
        let expected_tokens = &[
            Value("c".to_string()),
            Equals,
            Ident("icmp".to_string()),
            Ident("ule".to_string()),
            Value("x".to_string()),
            Comma,
            Int(-3),
            Ident("br".to_string()),
            Value("c".to_string()),
            Comma,
            Ident("a".to_string()),
            Comma,
            Ident("b".to_string()),
        ];
        assert_eq!(&actual_tokens, expected_tokens);
    }

    #[test]
    fn parses_diamond() {
        let ParsedFunction { func, ranges } = parse_function(DIAMOND).unwrap();
        assert_eq!(func.name, "max");
        assert_eq!(func.params().len(), 2);
        assert_eq!(func.block_count(), 4);
        assert_eq!(func[func.entry()].name, "entry");
        func.verify().unwrap();

        let x = func.value_by_name("x").unwrap();
        assert_eq!(ranges[0], (x, Range::new(10, 20)));
        assert_eq!(ranges[1].1, Range::new(-5, 5));

        let exit = func.block_by_name("exit").unwrap();
        assert_eq!(func.predecessor_count(exit), 2);
    }

    #[test]
    fn printing_is_stable() {
        let func = parse_function(DIAMOND).unwrap().func;
        let printed = func.to_string();
        let reparsed = parse_function(&printed).unwrap().func;
        assert_eq!(reparsed.to_string(), printed);
        assert!(printed.contains("  call @log(%y, -1)\n"));
    }

    #[test]
    fn forward_references() {
        let src = r"
            func @loop(%n) {
            entry:
              jmp head
            head:
              %i2 = add %i, 1
              %i = copy %i2
              %c = icmp slt %i2, %n
              br %c, head, done
            done:
              ret
            }
        ";
        let func = parse_function(src).unwrap().func;
        let head = func.block_by_name("head").unwrap();
        assert_eq!(func.predecessor_count(head), 2);
        func.verify().unwrap();
    }

    #[test]
    fn keyword_as_block_label() {
        let src = r"
            func @f(%x) {
              range %x [0, 1]
            entry:
              jmp range
            range:
              ret %x
            }
        ";
        let ParsedFunction { func, ranges } = parse_function(src).unwrap();
        assert_eq!(ranges.len(), 1);
        let range = func.block_by_name("range").unwrap();
        assert_eq!(*func[func.entry()].terminator(), Terminator::Jump(range));
        func.verify().unwrap();
    }

    #[test]
    fn reports_errors_with_lines() {
        let missing_term = "func @f() {\nentry:\n  %a = add 1, 2\n}";
        assert_eq!(
            parse_function(missing_term).unwrap_err(),
            ParseError::MissingTerminator {
                line: 2,
                name: "entry".to_string()
            }
        );

        let unknown_block = "func @f() {\nentry:\n  jmp nowhere\n}";
        assert_eq!(
            parse_function(unknown_block).unwrap_err(),
            ParseError::UnknownBlock {
                line: 3,
                name: "nowhere".to_string()
            }
        );

        let bad_range = "func @f(%a) {\n  range %a [3, 1]\nentry:\n  ret\n}";
        assert_eq!(
            parse_function(bad_range).unwrap_err(),
            ParseError::InvalidRange {
                line: 2,
                lo: 3,
                hi: 1
            }
        );

        let redefined = "func @f(%a) {\nentry:\n  %a = copy 1\n  ret\n}";
        assert_eq!(
            parse_function(redefined).unwrap_err(),
            ParseError::Redefinition {
                line: 3,
                name: "a".to_string()
            }
        );

        assert_eq!(
            parse_function("func @f() {\nentry:\n  ret\n  ret\n}").unwrap_err(),
            ParseError::OutsideBlock { line: 4 }
        );
        assert!(matches!(
            parse_function("func @f() {\nentry:\n  %a = frob 1\n  ret\n}"),
            Err(ParseError::UnknownOpcode { line: 3, .. })
        ));
        assert!(matches!(
            parse_function("func @f() {\nentry:\n  ret $\n}"),
            Err(ParseError::UnexpectedChar { ch: '$', .. })
        ));
    }
}
