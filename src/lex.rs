use crate::cell::{Xstr, Xsubstr};

use std::fmt;

#[derive(Debug, PartialEq)]
pub enum Tok {
    EndOfInput,
    Word(Xsubstr),
}

#[derive(Clone)]
pub struct TokenLocation {
    pub token: Xsubstr,
    pub line: usize,
    pub col: usize,
    pub filename: String,
    pub whole_line: Xsubstr,
}

impl fmt::Debug for TokenLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:{}:{}", self.filename, self.line + 1, self.col + 1)?;
        writeln!(f, "{}", self.whole_line)?;
        writeln!(f, "{:->1$}", '^', self.col + 1)
    }
}

/// Whitespace separated token reader.
#[derive(Clone, Debug)]
pub struct Lex {
    buffer: Xstr,
    name: String,
    pos: usize,
    last: Option<Xsubstr>,
}

impl Lex {
    pub fn new(buffer: Xstr, name: &str) -> Self {
        Self {
            buffer,
            name: name.to_string(),
            pos: 0,
            last: None,
        }
    }

    pub fn from_str(s: &str) -> Self {
        Self::new(Xstr::from(s), "<buffer>")
    }

    pub fn last_token(&self) -> Option<&Xsubstr> {
        self.last.as_ref()
    }

    fn skip_whitespaces(&mut self) {
        let rest = &self.buffer[self.pos..];
        let n = rest
            .find(|c: char| !c.is_ascii_whitespace())
            .unwrap_or(rest.len());
        self.pos += n;
    }

    pub fn next(&mut self) -> Tok {
        self.skip_whitespaces();
        let start = self.pos;
        let rest = &self.buffer[start..];
        if rest.is_empty() {
            return Tok::EndOfInput;
        }
        let len = rest
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(rest.len());
        self.pos += len;
        let token = self.buffer.substr(start..self.pos);
        self.last = Some(token.clone());
        Tok::Word(token)
    }

    pub fn location(&self, token: &Xsubstr) -> TokenLocation {
        let tok_start = token.range().start;
        let mut line = 0;
        let mut line_start = 0;
        for (i, c) in self.buffer[..tok_start].char_indices() {
            if c == '\n' {
                line += 1;
                line_start = i + 1;
            }
        }
        let col = self.buffer[line_start..tok_start].chars().count();
        let line_end = self.buffer[tok_start..]
            .find(|c: char| c == '\n' || c == '\r')
            .map(|n| tok_start + n)
            .unwrap_or(self.buffer.len());
        TokenLocation {
            token: token.clone(),
            line,
            col,
            filename: self.name.clone(),
            whole_line: self.buffer.substr(line_start..line_end),
        }
    }
}
