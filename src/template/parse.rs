//! Parser producing the template syntax tree.
//!
//! Function names and variables are resolved here, so a template that
//! compiles can only fail at execution time on data-dependent problems.

use std::collections::BTreeMap;
use std::fmt;

use super::error::TemplateError;
use super::lexer::{lex, Keyword, Tok, Token};
use super::value::format_float;
use crate::funcs::FuncRegistry;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Action(Pipeline),
    If(Branches),
    With(Branches),
    Range(RangeNode),
    Template(TemplateCall),
    Break(usize),
    Continue(usize),
}

/// `if`/`with` with their `else if`/`else with` chain.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Branches {
    pub line: usize,
    pub branches: Vec<(Pipeline, Vec<Node>)>,
    pub otherwise: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RangeNode {
    pub line: usize,
    pub pipe: Pipeline,
    pub body: Vec<Node>,
    pub otherwise: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TemplateCall {
    pub line: usize,
    pub name: TemplateName,
    pub pipe: Option<Pipeline>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TemplateName {
    Literal(String),
    Dynamic(Operand),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pipeline {
    pub line: usize,
    pub decl: Vec<String>,
    pub assign: bool,
    pub cmds: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Command {
    pub args: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Dot,
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Field(Vec<String>),
    Var(String, Vec<String>),
    Func(String),
    Pipe(Box<Pipeline>, Vec<String>),
}

/// A compiled source: the main body plus its `define`d templates.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Parsed {
    pub root: Vec<Node>,
    pub defines: BTreeMap<String, Vec<Node>>,
}

/// Blocks and parenthesised pipelines nested deeper than this fail to parse.
pub(crate) const MAX_NESTING: usize = 100;

pub(crate) fn parse(name: &str, src: &str, funcs: &FuncRegistry) -> Result<Parsed, TemplateError> {
    let tokens = lex(name, src)?;
    let mut parser = Parser {
        name,
        tokens,
        pos: 0,
        funcs,
        vars: vec!["$".to_string()],
        depth: 0,
        nesting: 0,
        range_depth: 0,
        defines: BTreeMap::new(),
    };
    let (root, stop) = parser.parse_list()?;
    match stop {
        Stop::Eof => Ok(Parsed {
            root,
            defines: parser.defines,
        }),
        other => Err(parser.error_at(other.line(), format!("unexpected {other}"))),
    }
}

/// What ended a list of nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Stop {
    Eof,
    End(usize),
    Else(usize),
    ElseIf(usize),
    ElseWith(usize),
}

impl Stop {
    fn line(self) -> usize {
        match self {
            Self::Eof => 0,
            Self::End(l) | Self::Else(l) | Self::ElseIf(l) | Self::ElseWith(l) => l,
        }
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eof => f.write_str("EOF"),
            Self::End(_) => f.write_str("{{end}}"),
            Self::Else(_) => f.write_str("{{else}}"),
            Self::ElseIf(_) => f.write_str("{{else if}}"),
            Self::ElseWith(_) => f.write_str("{{else with}}"),
        }
    }
}

struct Parser<'a> {
    name: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    funcs: &'a FuncRegistry,
    vars: Vec<String>,
    depth: usize,
    nesting: usize,
    range_depth: usize,
    defines: BTreeMap<String, Vec<Node>>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_tok(&self, ahead: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + ahead).map(|t| &t.tok)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Line of the next token, or of the last one at end of input.
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn error(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::parse(self.name, self.line(), message)
    }

    fn error_at(&self, line: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::parse(self.name, line, message)
    }

    fn enter(&mut self, line: usize) -> Result<(), TemplateError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error_at(line, "max depth exceeded"));
        }
        self.nesting += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    fn expect_close(&mut self, context: &str) -> Result<(), TemplateError> {
        match self.next() {
            Some(Token { tok: Tok::Close, .. }) => Ok(()),
            Some(t) => Err(self.error_at(t.line, format!("unexpected {} in {context}", t.tok.describe()))),
            None => Err(self.error("unclosed action")),
        }
    }

    fn parse_list(&mut self) -> Result<(Vec<Node>, Stop), TemplateError> {
        let mut nodes = Vec::new();
        while let Some(token) = self.next() {
            match token.tok {
                Tok::Text(text) => nodes.push(Node::Text(text)),
                Tok::Open => {
                    if let Some(stop) = self.parse_action(&mut nodes, token.line)? {
                        return Ok((nodes, stop));
                    }
                }
                other => {
                    return Err(self.error_at(token.line, format!("unexpected {}", other.describe())))
                }
            }
        }
        Ok((nodes, Stop::Eof))
    }

    /// Parse the action after `{{`, appending to `nodes`. Returns a stop
    /// marker for `end` and `else` actions.
    fn parse_action(&mut self, nodes: &mut Vec<Node>, line: usize) -> Result<Option<Stop>, TemplateError> {
        let keyword = match self.peek_tok(0) {
            Some(Tok::Keyword(k)) => Some(*k),
            _ => None,
        };
        let Some(keyword) = keyword else {
            let pipe = self.parse_pipeline("command", false)?;
            nodes.push(Node::Action(pipe));
            return Ok(None);
        };
        self.pos += 1;
        match keyword {
            Keyword::End => {
                self.expect_close("end")?;
                return Ok(Some(Stop::End(line)));
            }
            Keyword::Else => {
                return match self.peek_tok(0) {
                    Some(Tok::Keyword(Keyword::If)) => {
                        self.pos += 1;
                        Ok(Some(Stop::ElseIf(line)))
                    }
                    Some(Tok::Keyword(Keyword::With)) => {
                        self.pos += 1;
                        Ok(Some(Stop::ElseWith(line)))
                    }
                    _ => {
                        self.expect_close("else")?;
                        Ok(Some(Stop::Else(line)))
                    }
                };
            }
            Keyword::If => nodes.push(Node::If(self.parse_branches(line, "if")?)),
            Keyword::With => nodes.push(Node::With(self.parse_branches(line, "with")?)),
            Keyword::Range => nodes.push(self.parse_range(line)?),
            Keyword::Define => {
                if self.depth > 0 {
                    return Err(self.error_at(line, "unexpected <define> in command"));
                }
                let name = self.template_literal("define")?;
                self.expect_close("define clause")?;
                let body = self.parse_definition(line)?;
                self.add_define(line, name, body)?;
            }
            Keyword::Template => nodes.push(self.parse_template(line)?),
            Keyword::Block => {
                let name = self.template_literal("block")?;
                let pipe = self.parse_pipeline("block clause", false)?;
                let body = self.parse_definition(line)?;
                self.add_define(line, name.clone(), body)?;
                nodes.push(Node::Template(TemplateCall {
                    line,
                    name: TemplateName::Literal(name),
                    pipe: Some(pipe),
                }));
            }
            Keyword::Break | Keyword::Continue => {
                if self.range_depth == 0 {
                    return Err(self.error_at(
                        line,
                        format!("{{{{{}}}}} outside {{{{range}}}}", keyword.as_str()),
                    ));
                }
                self.expect_close(keyword.as_str())?;
                nodes.push(if keyword == Keyword::Break {
                    Node::Break(line)
                } else {
                    Node::Continue(line)
                });
            }
        }
        Ok(None)
    }

    fn template_literal(&mut self, context: &str) -> Result<String, TemplateError> {
        match self.next() {
            Some(Token { tok: Tok::Str(name), .. }) => Ok(name),
            Some(t) => Err(self.error_at(
                t.line,
                format!("unexpected {} in {context} clause", t.tok.describe()),
            )),
            None => Err(self.error("unclosed action")),
        }
    }

    fn add_define(&mut self, line: usize, name: String, body: Vec<Node>) -> Result<(), TemplateError> {
        if self.defines.contains_key(&name) {
            return Err(self.error_at(line, format!("template: multiple definition of template {name:?}")));
        }
        self.defines.insert(name, body);
        Ok(())
    }

    /// Body of `define` or `block`, up to its `end`, in a fresh variable scope.
    fn parse_definition(&mut self, line: usize) -> Result<Vec<Node>, TemplateError> {
        let outer_vars = std::mem::replace(&mut self.vars, vec!["$".to_string()]);
        let outer_range = std::mem::take(&mut self.range_depth);
        self.enter(line)?;
        self.depth += 1;
        let (body, stop) = self.parse_list()?;
        self.depth -= 1;
        self.leave();
        self.range_depth = outer_range;
        self.vars = outer_vars;
        match stop {
            Stop::End(_) => Ok(body),
            Stop::Eof => Err(self.error_at(line, "unexpected EOF")),
            other => Err(self.error_at(other.line(), format!("unexpected {other} in definition"))),
        }
    }

    fn parse_branches(&mut self, line: usize, context: &'static str) -> Result<Branches, TemplateError> {
        let mark = self.vars.len();
        self.enter(line)?;
        self.depth += 1;
        let mut branches = Vec::new();
        let mut otherwise = None;
        let mut pipe = self.parse_pipeline(context, false)?;
        let scope = self.vars.len();
        loop {
            let (body, stop) = self.parse_list()?;
            self.vars.truncate(scope);
            branches.push((pipe, body));
            match (stop, context) {
                (Stop::End(_), _) => break,
                (Stop::ElseIf(_), "if") | (Stop::ElseWith(_), "with") => {
                    pipe = self.parse_pipeline(context, false)?;
                }
                (Stop::Else(_), _) => {
                    let (body, stop) = self.parse_list()?;
                    if !matches!(stop, Stop::End(_)) {
                        return Err(self.error_at(stop.line(), format!("expected end; found {stop}")));
                    }
                    otherwise = Some(body);
                    break;
                }
                (Stop::Eof, _) => return Err(self.error_at(line, "unexpected EOF")),
                (other, _) => {
                    return Err(self.error_at(other.line(), format!("unexpected {other} in {context}")))
                }
            }
        }
        self.depth -= 1;
        self.leave();
        self.vars.truncate(mark);
        Ok(Branches {
            line,
            branches,
            otherwise,
        })
    }

    fn parse_range(&mut self, line: usize) -> Result<Node, TemplateError> {
        let mark = self.vars.len();
        self.enter(line)?;
        self.depth += 1;
        let pipe = self.parse_pipeline("range", true)?;
        self.range_depth += 1;
        let (body, stop) = self.parse_list()?;
        self.range_depth -= 1;
        let otherwise = match stop {
            Stop::End(_) => None,
            Stop::Else(_) => {
                let (body, stop) = self.parse_list()?;
                if !matches!(stop, Stop::End(_)) {
                    return Err(self.error_at(stop.line(), format!("expected end; found {stop}")));
                }
                Some(body)
            }
            Stop::Eof => return Err(self.error_at(line, "unexpected EOF")),
            other => return Err(self.error_at(other.line(), format!("unexpected {other} in range"))),
        };
        self.depth -= 1;
        self.leave();
        self.vars.truncate(mark);
        Ok(Node::Range(RangeNode {
            line,
            pipe,
            body,
            otherwise,
        }))
    }

    fn parse_template(&mut self, line: usize) -> Result<Node, TemplateError> {
        let name = match self.peek_tok(0) {
            Some(Tok::Str(_)) => TemplateName::Literal(self.template_literal("template")?),
            Some(Tok::Close) | None => {
                return Err(self.error_at(line, "missing name in template clause"));
            }
            Some(_) => TemplateName::Dynamic(self.parse_operand()?),
        };
        let pipe = if matches!(self.peek_tok(0), Some(Tok::Close)) {
            self.pos += 1;
            None
        } else {
            Some(self.parse_pipeline("template clause", false)?)
        };
        Ok(Node::Template(TemplateCall { line, name, pipe }))
    }

    /// Parse `[decl] command | command ... }}`, consuming the closing `}}`.
    fn parse_pipeline(&mut self, context: &str, range_decl: bool) -> Result<Pipeline, TemplateError> {
        let line = self.line();
        let mut decl = Vec::new();
        let mut assign = false;
        match (self.peek_tok(0), self.peek_tok(1), self.peek_tok(2), self.peek_tok(3)) {
            (Some(Tok::Var(v)), Some(Tok::Declare), _, _) => {
                decl.push(v.clone());
                self.pos += 2;
            }
            (Some(Tok::Var(v)), Some(Tok::Assign), _, _) => {
                if !self.vars.contains(v) {
                    return Err(self.error(format!("undefined variable {v:?}")));
                }
                decl.push(v.clone());
                assign = true;
                self.pos += 2;
            }
            (Some(Tok::Var(k)), Some(Tok::Comma), Some(Tok::Var(v)), Some(Tok::Declare)) if range_decl => {
                decl.push(k.clone());
                decl.push(v.clone());
                self.pos += 4;
            }
            _ => {}
        }
        let cmds = self.parse_commands(context, false)?;
        if cmds.is_empty() {
            return Err(self.error_at(line, format!("missing value for {context}")));
        }
        if !assign {
            self.vars.extend(decl.iter().cloned());
        }
        Ok(Pipeline {
            line,
            decl,
            assign,
            cmds,
        })
    }

    /// Commands separated by `|`, up to and including `}}` (or `)` when
    /// `in_parens`).
    fn parse_commands(&mut self, context: &str, in_parens: bool) -> Result<Vec<Command>, TemplateError> {
        let mut cmds: Vec<Command> = Vec::new();
        loop {
            let mut args = Vec::new();
            while self.at_operand() {
                args.push(self.parse_operand()?);
            }
            let Some(token) = self.next() else {
                return Err(self.error("unclosed action"));
            };
            let ends = match token.tok {
                Tok::Pipe => false,
                Tok::Close if !in_parens => true,
                Tok::RParen if in_parens => true,
                Tok::Close => return Err(self.error_at(token.line, "unclosed left paren")),
                other => {
                    return Err(self.error_at(
                        token.line,
                        format!("unexpected {} in {context}", other.describe()),
                    ))
                }
            };
            if args.is_empty() {
                if ends && cmds.is_empty() {
                    return Ok(cmds);
                }
                return Err(self.error_at(token.line, "missing value for command"));
            }
            if matches!(args[0], Operand::Nil) {
                return Err(self.error_at(token.line, "nil is not a command"));
            }
            cmds.push(Command { args });
            if ends {
                return Ok(cmds);
            }
        }
    }

    fn at_operand(&self) -> bool {
        matches!(
            self.peek_tok(0),
            Some(
                Tok::Field(_)
                    | Tok::Dot
                    | Tok::Var(_)
                    | Tok::Ident(_)
                    | Tok::Str(_)
                    | Tok::Int(_)
                    | Tok::Float(_)
                    | Tok::Bool(_)
                    | Tok::Nil
                    | Tok::LParen
            )
        )
    }

    /// Unspaced `.Field` tokens following a term.
    fn field_chain(&mut self) -> Vec<String> {
        let mut chain = Vec::new();
        while let Some(Token {
            tok: Tok::Field(name),
            spaced: false,
            ..
        }) = self.peek()
        {
            chain.push(name.clone());
            self.pos += 1;
        }
        chain
    }

    fn parse_operand(&mut self) -> Result<Operand, TemplateError> {
        let Some(token) = self.next() else {
            return Err(self.error("unclosed action"));
        };
        let operand = match token.tok {
            Tok::Field(first) => {
                let mut chain = vec![first];
                chain.extend(self.field_chain());
                return Ok(Operand::Field(chain));
            }
            Tok::Var(name) => {
                if !self.vars.contains(&name) {
                    return Err(self.error_at(token.line, format!("undefined variable {name:?}")));
                }
                return Ok(Operand::Var(name, self.field_chain()));
            }
            Tok::LParen => {
                let line = self.line();
                self.enter(line)?;
                let cmds = self.parse_commands("parenthesized pipeline", true)?;
                self.leave();
                if cmds.is_empty() {
                    return Err(self.error_at(line, "missing value for parenthesized pipeline"));
                }
                let pipe = Pipeline {
                    line,
                    decl: Vec::new(),
                    assign: false,
                    cmds,
                };
                return Ok(Operand::Pipe(Box::new(pipe), self.field_chain()));
            }
            Tok::Ident(name) => {
                if !self.funcs.contains(&name) {
                    let hint = self
                        .funcs
                        .suggest(&name)
                        .map(|s| format!(" (did you mean {s:?}?)"))
                        .unwrap_or_default();
                    return Err(self.error_at(token.line, format!("function {name:?} not defined{hint}")));
                }
                Operand::Func(name)
            }
            Tok::Dot => Operand::Dot,
            Tok::Str(s) => Operand::Str(s),
            Tok::Int(i) => Operand::Int(i),
            Tok::Float(x) => Operand::Float(x),
            Tok::Bool(b) => Operand::Bool(b),
            Tok::Nil => Operand::Nil,
            other => {
                return Err(self.error_at(token.line, format!("unexpected {} in operand", other.describe())))
            }
        };
        if let Some(Token {
            tok: Tok::Field(f),
            spaced: false,
            line,
        }) = self.peek()
        {
            return Err(self.error_at(*line, format!("unexpected .{f} after term {operand}")));
        }
        Ok(operand)
    }
}

fn write_chain(f: &mut fmt::Formatter<'_>, chain: &[String]) -> fmt::Result {
    for field in chain {
        write!(f, ".{field}")?;
    }
    Ok(())
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dot => f.write_str("."),
            Self::Nil => f.write_str("nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => f.write_str(&format_float(*x)),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Field(chain) => write_chain(f, chain),
            Self::Var(name, chain) => {
                f.write_str(name)?;
                write_chain(f, chain)
            }
            Self::Func(name) => f.write_str(name),
            Self::Pipe(pipe, chain) => {
                write!(f, "({pipe})")?;
                write_chain(f, chain)
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{arg}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.decl.is_empty() {
            write!(f, "{} {} ", self.decl.join(", "), if self.assign { "=" } else { ":=" })?;
        }
        for (i, cmd) in self.cmds.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{cmd}")?;
        }
        Ok(())
    }
}
