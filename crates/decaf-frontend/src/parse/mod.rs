//! Reads three-address code back from the notation the dump prints, so that
//! dumps can be fed straight back into the backend.


use std::collections::{HashMap, HashSet};

use decaf_common::names::NameGenerator;
use decaf_common::tac::{BinaryOp, Inst, LocationId, Program, TacBuilder, RECEIVER_NAME};
use decaf_common::Failure;
use log::{info, trace};
use thiserror::Error;

use crate::lex::{lex, Span, Token};

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

pub fn parse(names: &mut NameGenerator, src: impl AsRef<str>) -> ParseResult<Program> {
    let tokens = lex(src);
    info!("parsing {} tokens", tokens.len());

    let labels = find_labels(&tokens);
    let mut parser = Parser::new(names, labels, tokens);
    parser.parse_program()?;

    let end = parser.default_span;
    let program = parser
        .builder
        .build()
        .map_err(|failure| ParseError::new(end, failure.to_string()))?;

    trace!("done parsing ({} instructions)", program.code.len());
    Ok(program)
}

fn failure_at(span: Span, failure: Failure) -> ParseError {
    ParseError::new(span, failure.to_string())
}

/// Names that are defined as code labels (`name:`) or as vtables.
fn find_labels(tokens: &[(Token, Span)]) -> HashSet<String> {
    tokens
        .windows(2)
        .filter_map(|pair| match pair {
            [(Token::Name(name), _), (Token::Colon, _)] => Some(name.clone()),
            [(Token::VTable, _), (Token::Name(name), _)] => Some(name.clone()),
            _ => None,
        })
        .collect()
}

struct Parser<'a, I> {
    tokens: I,
    curr: Option<(Token, Span)>,
    prev: Option<(Token, Span)>,
    default_span: Span,

    builder: TacBuilder<'a>,
    labels: HashSet<String>,
    globals: HashMap<String, LocationId>,
    scope: HashMap<String, LocationId>,

    /// The span of the `BeginFunc` of the function being read.
    function: Option<Span>,
}

impl<'a, I> Parser<'a, I>
where
    I: Iterator<Item = (Token, Span)>,
{
    pub fn new<In>(names: &'a mut NameGenerator, labels: HashSet<String>, tokens: In) -> Self
    where
        In: IntoIterator<Item = (Token, Span), IntoIter = I>,
    {
        let mut parser = Self {
            tokens: tokens.into_iter(),
            curr: None,
            prev: None,
            default_span: Span::default(),

            builder: TacBuilder::new(names),
            labels,
            globals: HashMap::new(),
            scope: HashMap::new(),

            function: None,
        };

        parser.advance();
        parser
    }

    fn is_done(&self) -> bool {
        self.curr.is_none()
    }

    fn advance(&mut self) {
        self.prev = self.curr.take();
        if let Some(prev) = &self.prev {
            self.default_span = Span::new(prev.1.end, prev.1.end);
        }

        self.curr = self.tokens.next();
    }

    fn peek(&self, token: &Token) -> bool {
        self.curr.as_ref().map(|(tok, _)| tok == token).unwrap_or(false)
    }

    fn consume(&mut self, token: &Token) -> bool {
        if self.peek(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn span(&self) -> Span {
        self.curr
            .as_ref()
            .map(|(_, span)| *span)
            .unwrap_or(self.default_span)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let found = match &self.curr {
            Some((Token::Invalid, _)) => "an invalid character".to_string(),
            Some((token, _)) => format!("{token:?}"),
            None => "end of input".to_string(),
        };

        ParseError::new(self.span(), format!("expected {expected}, found {found}"))
    }

    fn expect(&mut self, token: Token) -> ParseResult<Span> {
        let span = self.span();
        if self.consume(&token) {
            Ok(span)
        } else {
            Err(self.unexpected(&format!("{token:?}")))
        }
    }

    fn name(&mut self) -> ParseResult<(String, Span)> {
        if let Some((Token::Name(name), span)) = &self.curr {
            let res = (name.clone(), *span);
            self.advance();
            Ok(res)
        } else {
            Err(self.unexpected("a name"))
        }
    }

    fn number(&mut self) -> ParseResult<i32> {
        match self.curr {
            Some((Token::Number(number), _)) => {
                self.advance();
                Ok(number)
            }
            _ => Err(self.unexpected("a number")),
        }
    }

    /// ```abnf
    /// program = *item
    /// ```
    pub fn parse_program(&mut self) -> ParseResult<()> {
        while !self.is_done() {
            self.item()?;
        }

        match self.function {
            Some(span) => Err(ParseError::new(span, "this function is never closed")),
            None => Ok(()),
        }
    }

    /// ```abnf
    /// item  = "Global" name ";"
    /// item =/ name ":"
    /// item =/ "VTable" name "=" *(name [","]) ";"
    /// item =/ inst
    /// ```
    fn item(&mut self) -> ParseResult<()> {
        if self.consume(&Token::Global) {
            let (name, _) = self.name()?;
            let id = self.builder.global(name.clone());
            self.globals.insert(name, id);
            self.expect(Token::Semicolon)?;
            return Ok(());
        }

        if self.consume(&Token::VTable) {
            let (label, _) = self.name()?;
            self.expect(Token::Equal)?;

            let mut methods = Vec::new();
            while !self.consume(&Token::Semicolon) {
                let (method, _) = self.name()?;
                methods.push(method);
                self.consume(&Token::Comma);
            }

            self.builder.vtable(label, methods);
            return Ok(());
        }

        if let Some((Token::Name(_), _)) = &self.curr {
            let (name, span) = self.name()?;
            if self.consume(&Token::Colon) {
                self.builder.label(name);
                return Ok(());
            }

            self.inside(span)?;
            return self.assignment(name);
        }

        self.inst()
    }

    /// ```abnf
    /// inst  = "BeginFunc" number ["(" [name *("," name)] ")"] ";"
    /// inst =/ "EndFunc" ";"
    /// inst =/ "Goto" name ";"
    /// inst =/ "IfZ" operand "Goto" name ";"
    /// inst =/ "Return" [operand] ";"
    /// inst =/ "PushParam" operand ";"
    /// inst =/ "PopParams" number ";"
    /// inst =/ "LCall" name ";"
    /// inst =/ "ACall" operand ";"
    /// inst =/ deref "=" operand ";"
    /// ```
    fn inst(&mut self) -> ParseResult<()> {
        let span = self.span();

        if self.consume(&Token::BeginFunc) {
            return self.begin_func(span);
        }

        self.inside(span)?;

        if self.consume(&Token::EndFunc) {
            self.builder
                .end_func()
                .map_err(|failure| failure_at(span, failure))?;
            self.function = None;
        } else if self.consume(&Token::Goto) {
            let (label, _) = self.name()?;
            self.builder.goto(label);
        } else if self.consume(&Token::IfZ) {
            let test = self.location()?;
            self.expect(Token::Goto)?;
            let (label, _) = self.name()?;
            self.builder.if_z(test, label);
        } else if self.consume(&Token::Return) {
            let value = if self.peek(&Token::Semicolon) {
                None
            } else {
                Some(self.location()?)
            };
            self.builder.ret(value);
        } else if self.consume(&Token::PushParam) {
            let param = self.location()?;
            self.builder.push_param(param);
        } else if self.consume(&Token::PopParams) {
            let bytes = self.number()?;
            self.builder
                .pop_params(bytes)
                .map_err(|failure| failure_at(span, failure))?;
        } else if self.consume(&Token::LCall) {
            let (label, _) = self.name()?;
            self.builder.emit(Inst::LCall { label, dst: None });
        } else if self.consume(&Token::ACall) {
            let addr = self.location()?;
            self.builder.emit(Inst::ACall { addr, dst: None });
        } else if self.peek(&Token::Star) {
            let (dst, offset) = self.deref()?;
            self.expect(Token::Equal)?;
            let src = self.location()?;
            self.builder.store(dst, src, offset);
        } else {
            return Err(self.unexpected("an instruction"));
        }

        self.expect(Token::Semicolon)?;
        Ok(())
    }

    fn begin_func(&mut self, span: Span) -> ParseResult<()> {
        if self.function.is_some() {
            return Err(ParseError::new(span, "functions cannot be nested"));
        }

        let size = self.number()?;

        let mut params = Vec::new();
        if self.consume(&Token::LParen) {
            while !self.consume(&Token::RParen) {
                if !params.is_empty() {
                    self.expect(Token::Comma)?;
                }

                params.push(self.name()?.0);
            }
        }

        self.expect(Token::Semicolon)?;

        let is_method = params.first().map(String::as_str) == Some(RECEIVER_NAME);
        let formals = if is_method { &params[1..] } else { &params[..] };

        let frame = self
            .builder
            .begin_func(formals.iter().cloned(), is_method)
            .map_err(|failure| failure_at(span, failure))?;
        self.builder.declare_frame_size(size);

        self.scope.clear();
        for (name, id) in params.into_iter().zip(frame.params()) {
            self.scope.insert(name, id);
        }

        self.function = Some(span);
        Ok(())
    }

    /// ```abnf
    /// assignment = name "=" rhs ";"
    /// rhs  = number / string
    /// rhs =/ "LCall" name / "ACall" operand
    /// rhs =/ (name / deref) [binop operand]
    /// ```
    fn assignment(&mut self, name: String) -> ParseResult<()> {
        self.expect(Token::Equal)?;
        let dst = self.resolve(name);

        match self.curr.clone() {
            Some((Token::Number(value), _)) => {
                self.advance();
                self.builder.emit(Inst::LoadConstant { dst, value });
            }

            Some((Token::Str(value), _)) => {
                self.advance();
                self.builder.emit(Inst::LoadString { dst, value });
            }

            Some((Token::Star, _)) => {
                let (src, offset) = self.deref()?;

                if let Some(op) = self.binary_op() {
                    let lhs = self.builder.reference(src, offset);
                    let rhs = self.location()?;
                    self.builder.emit(Inst::Binary { op, dst, lhs, rhs });
                } else {
                    self.builder.emit(Inst::Load { dst, src, offset });
                }
            }

            Some((Token::LCall, _)) => {
                self.advance();
                let (label, _) = self.name()?;
                self.builder.emit(Inst::LCall {
                    label,
                    dst: Some(dst),
                });
            }

            Some((Token::ACall, _)) => {
                self.advance();
                let addr = self.location()?;
                self.builder.emit(Inst::ACall {
                    addr,
                    dst: Some(dst),
                });
            }

            Some((Token::Name(_), _)) => {
                let (src, _) = self.name()?;

                if let Some(op) = self.binary_op() {
                    let lhs = self.resolve(src);
                    let rhs = self.location()?;
                    self.builder.emit(Inst::Binary { op, dst, lhs, rhs });
                } else if self.is_label(&src) {
                    self.builder.emit(Inst::LoadLabel { dst, label: src });
                } else {
                    let src = self.resolve(src);
                    self.builder.emit(Inst::Copy { dst, src });
                }
            }

            _ => return Err(self.unexpected("a value")),
        }

        self.expect(Token::Semicolon)?;
        Ok(())
    }

    /// ```abnf
    /// deref = "*" "(" operand ["+" number] ")"
    /// ```
    fn deref(&mut self) -> ParseResult<(LocationId, i32)> {
        self.expect(Token::Star)?;
        self.expect(Token::LParen)?;
        let base = self.location()?;
        let offset = if self.consume(&Token::Plus) {
            self.number()?
        } else {
            0
        };
        self.expect(Token::RParen)?;
        Ok((base, offset))
    }

    /// ```abnf
    /// operand = name / deref
    /// ```
    fn location(&mut self) -> ParseResult<LocationId> {
        if self.peek(&Token::Star) {
            let (base, offset) = self.deref()?;
            return Ok(self.builder.reference(base, offset));
        }

        let (name, _) = self.name()?;
        Ok(self.resolve(name))
    }

    fn binary_op(&mut self) -> Option<BinaryOp> {
        let op = self.curr.as_ref().and_then(|(tok, _)| tok.binary_op())?;
        self.advance();
        Some(op)
    }

    /// Find the location a name refers to, making a fresh local the first
    /// time a name is seen in a function.
    fn resolve(&mut self, name: String) -> LocationId {
        if let Some(id) = self.scope.get(&name).or_else(|| self.globals.get(&name)) {
            return *id;
        }

        let id = self.builder.local(name.clone());
        self.scope.insert(name, id);
        id
    }

    fn is_label(&self, name: &str) -> bool {
        !self.scope.contains_key(name)
            && !self.globals.contains_key(name)
            && self.labels.contains(name)
    }

    fn inside(&self, span: Span) -> ParseResult<()> {
        match self.function {
            Some(_) => Ok(()),
            None => Err(ParseError::new(
                span,
                "instructions must be inside a `BeginFunc`/`EndFunc` pair",
            )),
        }
    }
}
