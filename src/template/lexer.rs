//! Tokenizer for the template language.
//!
//! Text outside `{{ }}` becomes [`Tok::Text`]; trim markers (`{{- ` and
//! ` -}}`) are applied here so the parser never sees them. Comments
//! (`{{/* ... */}}`) produce no tokens.

use super::error::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    If,
    Else,
    End,
    Range,
    With,
    Define,
    Template,
    Block,
    Break,
    Continue,
}

impl Keyword {
    fn from_ident(s: &str) -> Option<Self> {
        Some(match s {
            "if" => Self::If,
            "else" => Self::Else,
            "end" => Self::End,
            "range" => Self::Range,
            "with" => Self::With,
            "define" => Self::Define,
            "template" => Self::Template,
            "block" => Self::Block,
            "break" => Self::Break,
            "continue" => Self::Continue,
            _ => return None,
        })
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Else => "else",
            Self::End => "end",
            Self::Range => "range",
            Self::With => "with",
            Self::Define => "define",
            Self::Template => "template",
            Self::Block => "block",
            Self::Break => "break",
            Self::Continue => "continue",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Text(String),
    Open,
    Close,
    /// `.Name`, without the dot
    Field(String),
    Dot,
    /// `$name`, or `$` alone
    Var(String),
    Ident(String),
    Keyword(Keyword),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
    Pipe,
    LParen,
    RParen,
    Declare,
    Assign,
    Comma,
}

impl Tok {
    /// Short description for "unexpected X" messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Text(_) => "text".to_string(),
            Self::Open => "\"{{\"".to_string(),
            Self::Close => "\"}}\"".to_string(),
            Self::Field(f) => format!("<.{f}>"),
            Self::Dot => "<.>".to_string(),
            Self::Var(v) => format!("<{v}>"),
            Self::Ident(i) => format!("<{i}>"),
            Self::Keyword(k) => format!("<{}>", k.as_str()),
            Self::Str(s) => format!("{s:?}"),
            Self::Int(i) => i.to_string(),
            Self::Float(x) => x.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Nil => "nil".to_string(),
            Self::Pipe => "\"|\"".to_string(),
            Self::LParen => "\"(\"".to_string(),
            Self::RParen => "\")\"".to_string(),
            Self::Declare => "\":=\"".to_string(),
            Self::Assign => "\"=\"".to_string(),
            Self::Comma => "\",\"".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub tok: Tok,
    pub line: usize,
    /// Whitespace separated this token from the previous one.
    pub spaced: bool,
}

pub(crate) fn lex(name: &str, src: &str) -> Result<Vec<Token>, TemplateError> {
    let mut lexer = Lexer {
        name,
        src,
        pos: 0,
        line: 1,
        tokens: Vec::new(),
        trim_next_text: false,
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'s> {
    name: &'s str,
    src: &'s str,
    pos: usize,
    line: usize,
    tokens: Vec<Token>,
    trim_next_text: bool,
}

impl<'s> Lexer<'s> {
    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn advance(&mut self, n: usize) {
        let consumed = &self.src[self.pos..self.pos + n];
        self.line += consumed.matches('\n').count();
        self.pos += n;
    }

    fn error(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::parse(self.name, self.line, message)
    }

    fn push(&mut self, tok: Tok, line: usize, spaced: bool) {
        self.tokens.push(Token { tok, line, spaced });
    }

    fn run(&mut self) -> Result<(), TemplateError> {
        loop {
            let rest = self.rest();
            let Some(offset) = rest.find("{{") else {
                self.push_text(rest);
                self.advance(rest.len());
                return Ok(());
            };
            let after = &rest[offset + 2..];
            let trim_left = after.starts_with('-')
                && after[1..].starts_with(|c: char| c.is_ascii_whitespace());
            let mut text = &rest[..offset];
            if trim_left {
                text = text.trim_end();
            }
            self.push_text(text);
            self.advance(offset + 2);
            if trim_left {
                self.advance(1);
                let ws = leading_whitespace(self.rest());
                self.advance(ws);
            }
            self.lex_action()?;
        }
    }

    fn push_text(&mut self, text: &str) {
        let line = self.line;
        let text = if std::mem::take(&mut self.trim_next_text) {
            text.trim_start()
        } else {
            text
        };
        if !text.is_empty() {
            self.push(Tok::Text(text.to_string()), line, false);
        }
    }

    /// Consume `}}` or ` -}}` if it is next; returns whether it was found.
    fn close_delim(&mut self) -> bool {
        let rest = self.rest();
        let ws = leading_whitespace(rest);
        if ws > 0 && rest[ws..].starts_with("-}}") {
            self.advance(ws + 3);
            self.trim_next_text = true;
            return true;
        }
        if rest[ws..].starts_with("}}") {
            self.advance(ws + 2);
            return true;
        }
        false
    }

    fn lex_action(&mut self) -> Result<(), TemplateError> {
        if self.rest().starts_with("/*") {
            let Some(end) = self.rest().find("*/") else {
                return Err(self.error("unclosed comment"));
            };
            self.advance(end + 2);
            if !self.close_delim() {
                return Err(self.error("comment ends before closing delimiter"));
            }
            return Ok(());
        }

        let open_line = self.line;
        self.push(Tok::Open, open_line, false);
        loop {
            if self.close_delim() {
                let line = self.line;
                self.push(Tok::Close, line, false);
                return Ok(());
            }
            let ws = leading_whitespace(self.rest());
            self.advance(ws);
            let spaced = ws > 0;
            let line = self.line;
            let Some(c) = self.rest().chars().next() else {
                return Err(TemplateError::parse(self.name, open_line, "unclosed action"));
            };
            let tok = match c {
                '|' => self.single(Tok::Pipe),
                '(' => self.single(Tok::LParen),
                ')' => self.single(Tok::RParen),
                ',' => self.single(Tok::Comma),
                '=' => self.single(Tok::Assign),
                ':' => {
                    if !self.rest().starts_with(":=") {
                        return Err(self.error("expected :="));
                    }
                    self.advance(2);
                    Tok::Declare
                }
                '"' => self.quoted()?,
                '`' => self.raw_string()?,
                '\'' => self.char_literal()?,
                '$' => {
                    self.advance(1);
                    let name = self.take_ident();
                    Tok::Var(format!("${name}"))
                }
                '.' => {
                    let next = self.rest()[1..].chars().next();
                    match next {
                        Some(d) if d.is_ascii_digit() => self.number()?,
                        Some(a) if a.is_alphabetic() || a == '_' => {
                            self.advance(1);
                            Tok::Field(self.take_ident())
                        }
                        _ => self.single(Tok::Dot),
                    }
                }
                '0'..='9' => self.number()?,
                '-' | '+'
                    if self.rest()[1..].starts_with(|d: char| d.is_ascii_digit() || d == '.') =>
                {
                    self.number()?
                }
                c if c.is_alphabetic() || c == '_' => {
                    let ident = self.take_ident();
                    match ident.as_str() {
                        "true" => Tok::Bool(true),
                        "false" => Tok::Bool(false),
                        "nil" => Tok::Nil,
                        other => Keyword::from_ident(other)
                            .map_or_else(|| Tok::Ident(ident.clone()), Tok::Keyword),
                    }
                }
                other => return Err(self.error(format!("unexpected {other:?} in command"))),
            };
            self.push(tok, line, spaced);
        }
    }

    fn single(&mut self, tok: Tok) -> Tok {
        self.advance(1);
        tok
    }

    fn take_ident(&mut self) -> String {
        let len = self
            .rest()
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map_or(self.rest().len(), |(i, _)| i);
        let ident = self.rest()[..len].to_string();
        self.advance(len);
        ident
    }

    fn quoted(&mut self) -> Result<Tok, TemplateError> {
        self.advance(1);
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.advance(i + 1);
                    return Ok(Tok::Str(out));
                }
                '\n' => break,
                '\\' => {
                    let Some((_, esc)) = chars.next() else { break };
                    match esc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '\\' => out.push('\\'),
                        '"' => out.push('"'),
                        '\'' => out.push('\''),
                        '0' => out.push('\0'),
                        'a' => out.push('\u{7}'),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{c}'),
                        'v' => out.push('\u{b}'),
                        'x' => {
                            let hex: String = chars.by_ref().take(2).map(|(_, h)| h).collect();
                            let code = u8::from_str_radix(&hex, 16)
                                .map_err(|_| self.error("invalid escape in string"))?;
                            out.push(char::from(code));
                        }
                        'u' => {
                            let hex: String = chars.by_ref().take(4).map(|(_, h)| h).collect();
                            let c = u32::from_str_radix(&hex, 16)
                                .ok()
                                .and_then(char::from_u32)
                                .ok_or_else(|| self.error("invalid escape in string"))?;
                            out.push(c);
                        }
                        other => return Err(self.error(format!("unknown escape sequence: \\{other}"))),
                    }
                }
                c => out.push(c),
            }
        }
        Err(self.error("unterminated quoted string"))
    }

    fn raw_string(&mut self) -> Result<Tok, TemplateError> {
        let body = &self.rest()[1..];
        let Some(end) = body.find('`') else {
            return Err(self.error("unterminated raw quoted string"));
        };
        let text = body[..end].to_string();
        self.advance(end + 2);
        Ok(Tok::Str(text))
    }

    fn char_literal(&mut self) -> Result<Tok, TemplateError> {
        let body = &self.rest()[1..];
        let mut chars = body.chars();
        let c = match chars.next() {
            Some('\\') => match chars.next() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('\\') => '\\',
                Some('\'') => '\'',
                _ => return Err(self.error("invalid character constant")),
            },
            Some(c) if c != '\'' => c,
            _ => return Err(self.error("invalid character constant")),
        };
        if chars.next() != Some('\'') {
            return Err(self.error("unterminated character constant"));
        }
        let len = 1 + body.len() - chars.as_str().len();
        self.advance(len);
        Ok(Tok::Int(i64::from(u32::from(c))))
    }

    fn number(&mut self) -> Result<Tok, TemplateError> {
        let rest = self.rest();
        let mut len = 0;
        let mut prev = '\0';
        for (i, c) in rest.char_indices() {
            let sign_ok = (c == '-' || c == '+')
                && (i == 0 || matches!(prev, 'e' | 'E') && !rest.starts_with("0x"));
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || sign_ok {
                len = i + c.len_utf8();
                prev = c;
            } else {
                break;
            }
        }
        let text = &rest[..len];
        let tok = parse_number(text).ok_or_else(|| self.error(format!("bad number syntax: {text:?}")))?;
        self.advance(len);
        Ok(tok)
    }
}

fn leading_whitespace(s: &str) -> usize {
    s.len() - s.trim_start_matches(|c: char| c.is_ascii_whitespace()).len()
}

fn parse_number(text: &str) -> Option<Tok> {
    let clean = text.replace('_', "");
    let (negative, digits) = match clean.strip_prefix('-') {
        Some(d) => (true, d),
        None => (false, clean.strip_prefix('+').unwrap_or(&clean)),
    };
    let radix = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .iter()
        .find_map(|(prefix, radix)| digits.strip_prefix(prefix).map(|d| (d, *radix)));
    let int = match radix {
        Some((d, radix)) => i64::from_str_radix(d, radix).ok(),
        None => digits.parse::<i64>().ok(),
    };
    if let Some(i) = int {
        return Some(Tok::Int(if negative { -i } else { i }));
    }
    if radix.is_some() {
        return None;
    }
    let x: f64 = digits.parse().ok()?;
    let x = if negative { -x } else { x };
    if x.fract() == 0.0 && !digits.contains('.') && x.abs() < 9.0e15 {
        return Some(Tok::Int(x as i64));
    }
    Some(Tok::Float(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok> {
        lex("t", src).unwrap().into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn test_text_and_fields() {
        assert_eq!(
            toks("Hi {{ .Breach.Value }}!"),
            vec![
                Tok::Text("Hi ".into()),
                Tok::Open,
                Tok::Field("Breach".into()),
                Tok::Field("Value".into()),
                Tok::Close,
                Tok::Text("!".into()),
            ]
        );
    }

    #[test]
    fn test_field_chain_is_unspaced() {
        let tokens = lex("t", "{{ .A.B .C }}").unwrap();
        let spaced: Vec<bool> = tokens.iter().map(|t| t.spaced).collect();
        assert_eq!(spaced, vec![false, true, false, true, false]);
    }

    #[test]
    fn test_trim_markers() {
        assert_eq!(
            toks("a  {{- .X -}}  b"),
            vec![
                Tok::Text("a".into()),
                Tok::Open,
                Tok::Field("X".into()),
                Tok::Close,
                Tok::Text("b".into()),
            ]
        );
    }

    #[test]
    fn test_comments_vanish() {
        assert_eq!(toks("a{{/* note */}}b"), vec![Tok::Text("a".into()), Tok::Text("b".into())]);
        assert_eq!(toks("a {{- /* note */ -}} b"), vec![Tok::Text("a".into()), Tok::Text("b".into())]);
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            toks(r#"{{ "a\tb" `raw\n` 'x' 42 -3 1.5 0x1F true nil }}"#),
            vec![
                Tok::Open,
                Tok::Str("a\tb".into()),
                Tok::Str("raw\\n".into()),
                Tok::Int(120),
                Tok::Int(42),
                Tok::Int(-3),
                Tok::Float(1.5),
                Tok::Int(31),
                Tok::Bool(true),
                Tok::Nil,
                Tok::Close,
            ]
        );
    }

    #[test]
    fn test_keywords_variables_and_punctuation() {
        assert_eq!(
            toks("{{ range $i, $v := .Items }}{{ end }}"),
            vec![
                Tok::Open,
                Tok::Keyword(Keyword::Range),
                Tok::Var("$i".into()),
                Tok::Comma,
                Tok::Var("$v".into()),
                Tok::Declare,
                Tok::Field("Items".into()),
                Tok::Close,
                Tok::Open,
                Tok::Keyword(Keyword::End),
                Tok::Close,
            ]
        );
    }

    #[test]
    fn test_line_numbers() {
        let tokens = lex("t", "line1\n{{ .A }}\n\n{{ .B }}").unwrap();
        let b = tokens.iter().find(|t| t.tok == Tok::Field("B".into())).unwrap();
        assert_eq!(b.line, 4);
    }

    #[test]
    fn test_errors() {
        assert!(lex("t", "{{ .A ").is_err());
        assert!(lex("t", "{{ \"open }}").is_err());
        assert!(lex("t", "{{/* open").is_err());
        assert!(lex("t", "{{ # }}").is_err());
    }
}
