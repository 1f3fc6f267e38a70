use std::{iter::Peekable, rc::Rc, str::Chars};

use crate::{Error, SchemyContext, SchemyObject, cons::list_with_tail, symbol::Symbol};

/// A position in the source text, 1-based.
#[derive(Debug, Clone, Copy)]
struct Pos {
    line: usize,
    col: usize,
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug)]
enum Token {
    OpenParen { pos: Pos },
    OpenVector { pos: Pos },
    CloseParen { pos: Pos },
    Quote { pos: Pos },
    Backtick { pos: Pos },
    Comma { pos: Pos },
    Splice { pos: Pos }, // ,@
    Dot { pos: Pos },
    String { value: String },
    Char { value: char },
    Bool { value: bool },
    Integer { value: i64 },
    Float { value: f64 },
    Ident { value: String },

    ParserError { pos: Pos, desc: String },
}

fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '"' | ';' | '\'' | '`' | ',')
}

struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
}

impl Tokenizer<'_> {
    fn new(program: &str) -> Tokenizer<'_> {
        Tokenizer {
            chars: program.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn pos(&self) -> Pos {
        Pos {
            line: self.line,
            col: self.col,
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn next_char(&mut self) -> Option<char> {
        self.chars.next().inspect(|&ch| {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        })
    }

    /// Reads characters up to the next delimiter.
    fn read_atom(&mut self) -> String {
        let mut output = String::new();
        while let Some(ch) = self.peek_char() {
            if is_delimiter(ch) {
                break;
            }
            output.push(ch);
            self.next_char();
        }
        output
    }

    fn read_string(&mut self, start: Pos) -> Token {
        let mut output = String::new();
        while let Some(ch) = self.next_char() {
            match ch {
                '\\' => {
                    let escape_pos = self.pos();
                    let out_ch = match self.next_char() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(e) => {
                            return Token::ParserError {
                                pos: escape_pos,
                                desc: format!("unknown escape char {}", e),
                            };
                        }
                        None => break,
                    };
                    output.push(out_ch);
                }
                '"' => return Token::String { value: output },
                ch => output.push(ch),
            }
        }
        Token::ParserError {
            pos: start,
            desc: "incomplete string literal".to_string(),
        }
    }

    /// Reads what follows a `#`: a vector opener, a boolean or a character.
    fn read_hash(&mut self, start: Pos) -> Token {
        match self.peek_char() {
            Some('(') => {
                self.next_char();
                Token::OpenVector { pos: start }
            }
            Some('\\') => {
                self.next_char();
                let Some(first) = self.next_char() else {
                    return Token::ParserError {
                        pos: start,
                        desc: "incomplete character literal".to_string(),
                    };
                };
                let mut name = first.to_string();
                if first.is_alphabetic() {
                    name.push_str(&self.read_atom());
                }
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Token::Char { value: ch },
                    _ => match name.as_str() {
                        "space" => Token::Char { value: ' ' },
                        "newline" => Token::Char { value: '\n' },
                        "tab" => Token::Char { value: '\t' },
                        _ => Token::ParserError {
                            pos: start,
                            desc: format!("unknown character name {}", name),
                        },
                    },
                }
            }
            _ => match self.read_atom().as_str() {
                "t" | "true" => Token::Bool { value: true },
                "f" | "false" => Token::Bool { value: false },
                other => Token::ParserError {
                    pos: start,
                    desc: format!("unknown token #{}", other),
                },
            },
        }
    }

    fn read_num_ident(&mut self, start: Pos) -> Token {
        let output = self.read_atom();
        let digits = output.strip_prefix(['-', '+']).unwrap_or(&output);
        if !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()) {
            return match output.parse::<i64>() {
                Ok(value) => Token::Integer { value },
                Err(_) => Token::ParserError {
                    pos: start,
                    desc: format!("integer {} out of range", output),
                },
            };
        }
        let numeric = digits.chars().any(|ch| ch.is_ascii_digit())
            && digits
                .chars()
                .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | 'e' | 'E' | '-' | '+'));
        if numeric {
            if let Ok(value) = output.parse::<f64>() {
                return Token::Float { value };
            }
        }
        Token::Ident { value: output }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let ch = self.peek_char()?;
            let pos = self.pos();
            match ch {
                ch if ch.is_whitespace() => {
                    self.next_char();
                    continue;
                }
                ';' => {
                    while self.next_char().is_some_and(|ch| ch != '\n') {}
                    continue;
                }
                '(' => {
                    self.next_char();
                    return Some(Token::OpenParen { pos });
                }
                ')' => {
                    self.next_char();
                    return Some(Token::CloseParen { pos });
                }
                '\'' => {
                    self.next_char();
                    return Some(Token::Quote { pos });
                }
                '`' => {
                    self.next_char();
                    return Some(Token::Backtick { pos });
                }
                ',' => {
                    self.next_char();
                    if self.peek_char() == Some('@') {
                        self.next_char();
                        return Some(Token::Splice { pos });
                    }
                    return Some(Token::Comma { pos });
                }
                '"' => {
                    self.next_char();
                    return Some(self.read_string(pos));
                }
                '#' => {
                    self.next_char();
                    return Some(self.read_hash(pos));
                }
                '.' => {
                    self.next_char();
                    if self.peek_char().is_none_or(is_delimiter) {
                        return Some(Token::Dot { pos });
                    }
                    let rest = self.read_num_ident(pos);
                    return Some(match rest {
                        Token::Ident { value } => Token::Ident {
                            value: format!(".{}", value),
                        },
                        Token::Integer { value } => Token::Float {
                            value: format!(".{}", value).parse().unwrap_or(0.0),
                        },
                        other => other,
                    });
                }
                _ => return Some(self.read_num_ident(pos)),
            }
        }
    }
}

fn parsing_error(pos: Pos, desc: impl std::fmt::Display) -> Error {
    Error::parsing_error(format!("{}: {}", pos, desc))
}

struct Parser<'a, 'b> {
    tokenizer: Peekable<Tokenizer<'a>>,
    ctx: &'b mut SchemyContext,
}

impl Parser<'_, '_> {
    fn new<'b, 'a>(ctx: &'b mut SchemyContext, program: &'a str) -> Parser<'a, 'b> {
        Parser {
            tokenizer: Tokenizer::new(program).peekable(),
            ctx,
        }
    }

    /// Reads the items of a list or vector up to the closing parenthesis.
    /// Returns the items and, for a dotted list, the tail.
    fn parse_items(
        &mut self,
        start: Pos,
        allow_dot: bool,
    ) -> Result<(Vec<SchemyObject>, SchemyObject), Error> {
        let mut items = vec![];
        loop {
            match self.tokenizer.peek() {
                None => return Err(parsing_error(start, "unclosed list")),
                Some(Token::CloseParen { .. }) => {
                    self.tokenizer.next();
                    return Ok((items, SchemyObject::nil()));
                }
                Some(Token::Dot { pos }) => {
                    let pos = *pos;
                    if !allow_dot || items.is_empty() {
                        return Err(parsing_error(pos, "unexpected dot"));
                    }
                    self.tokenizer.next();
                    let tail = self.parse_required(pos)?;
                    return match self.tokenizer.next() {
                        Some(Token::CloseParen { .. }) => Ok((items, tail)),
                        _ => Err(parsing_error(
                            pos,
                            "expected only one item in list after dot",
                        )),
                    };
                }
                Some(_) => items.push(self.parse_required(start)?),
            }
        }
    }

    /// Parses one datum, failing at end of input.
    fn parse_required(&mut self, pos: Pos) -> Result<SchemyObject, Error> {
        self.parse_value()?
            .ok_or_else(|| parsing_error(pos, "unexpected end of input"))
    }

    fn abbreviation(&mut self, keyword: Rc<Symbol>, pos: Pos) -> Result<SchemyObject, Error> {
        let next = self.parse_required(pos)?;
        Ok([keyword.into(), next].into_iter().collect())
    }

    fn parse_value(&mut self) -> Result<Option<SchemyObject>, Error> {
        let Some(token) = self.tokenizer.next() else {
            return Ok(None);
        };
        let value = match token {
            Token::OpenParen { pos } => {
                let (items, tail) = self.parse_items(pos, true)?;
                list_with_tail(items, tail)
            }
            Token::OpenVector { pos } => {
                let (items, _) = self.parse_items(pos, false)?;
                SchemyObject::vector(items)
            }
            Token::CloseParen { pos } => {
                return Err(parsing_error(pos, "unexpected closing parenthesis"));
            }
            Token::Dot { pos } => return Err(parsing_error(pos, "unexpected dot")),
            Token::Quote { pos } => {
                let keyword = self.ctx.keywords.quote.clone();
                self.abbreviation(keyword, pos)?
            }
            Token::Backtick { pos } => {
                let keyword = self.ctx.keywords.quasiquote.clone();
                self.abbreviation(keyword, pos)?
            }
            Token::Comma { pos } => {
                let keyword = self.ctx.keywords.unquote.clone();
                self.abbreviation(keyword, pos)?
            }
            Token::Splice { pos } => {
                let keyword = self.ctx.keywords.unquote_splicing.clone();
                self.abbreviation(keyword, pos)?
            }
            Token::String { value } => value.into(),
            Token::Char { value } => value.into(),
            Token::Bool { value } => value.into(),
            Token::Integer { value } => value.into(),
            Token::Float { value } => value.into(),
            Token::Ident { value } => self.ctx.intern(&value),
            Token::ParserError { pos, desc } => return Err(parsing_error(pos, desc)),
        };
        Ok(Some(value))
    }

    fn parse(&mut self) -> Result<Vec<SchemyObject>, Error> {
        let mut output = vec![];
        while let Some(next) = self.parse_value()? {
            output.push(next);
        }
        Ok(output)
    }
}

/// Reads every datum in `program`.
pub(crate) fn parse(ctx: &mut SchemyContext, program: &str) -> Result<Vec<SchemyObject>, Error> {
    Parser::new(ctx, program).parse()
}
