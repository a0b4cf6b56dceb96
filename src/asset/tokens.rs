//! Whitespace tokenizer for text asset formats

use crate::core::{Error, Result};
use std::str::{FromStr, SplitWhitespace};

/// Sequential reader over whitespace-separated tokens
///
/// Tracks the index of the last token read and the section being parsed so
/// errors point at the offending field.
pub struct Tokens<'a> {
    iter: SplitWhitespace<'a>,
    consumed: usize,
    section: &'static str,
}

impl<'a> Tokens<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            iter: text.split_whitespace(),
            consumed: 0,
            section: "header",
        }
    }

    /// Name the section that following reads belong to
    pub fn enter(&mut self, section: &'static str) {
        self.section = section;
    }

    pub fn section(&self) -> &'static str {
        self.section
    }

    /// Number of tokens consumed so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Read the next token
    pub fn next_token(&mut self) -> Result<&'a str> {
        match self.iter.next() {
            Some(token) => {
                self.consumed += 1;
                Ok(token)
            }
            None => Err(self.error_at(self.consumed, "unexpected end of file".to_string())),
        }
    }

    /// Discard one label token
    pub fn skip(&mut self) -> Result<()> {
        self.next_token().map(|_| ())
    }

    /// Read a token that must equal `literal`
    pub fn expect(&mut self, literal: &str) -> Result<()> {
        let token = self.next_token()?;
        if token == literal {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}', found '{}'", literal, token)))
        }
    }

    /// Parse the next token as `T`
    pub fn parse<T: FromStr>(&mut self) -> Result<T> {
        let token = self.next_token()?;
        token.parse().map_err(|_| {
            self.error(format!(
                "cannot read '{}' as {}",
                token,
                std::any::type_name::<T>()
            ))
        })
    }

    /// Discard a label, then parse the value after it
    pub fn labeled<T: FromStr>(&mut self) -> Result<T> {
        self.skip()?;
        self.parse()
    }

    /// Parse `N` consecutive floats
    pub fn floats<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut values = [0.0f32; N];
        for value in &mut values {
            *value = self.parse()?;
        }
        Ok(values)
    }

    /// Discard a label, then parse `N` floats
    pub fn labeled_floats<const N: usize>(&mut self) -> Result<[f32; N]> {
        self.skip()?;
        self.floats()
    }

    /// Parse a `0`/`1` (or `false`/`true`) flag
    pub fn flag(&mut self) -> Result<bool> {
        match self.next_token()? {
            "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            other => Err(self.error(format!("expected 0 or 1, found '{}'", other))),
        }
    }

    /// Parse error pointing at the most recently read token
    pub fn error(&self, message: String) -> Error {
        self.error_at(self.consumed.saturating_sub(1), message)
    }

    fn error_at(&self, token: usize, message: String) -> Error {
        Error::Parse {
            section: self.section,
            token,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_labels_and_values() {
        let mut tokens = Tokens::new("#Bones 3\n  Diffuse: 0.5 1 2\nAlphaClip: 1");

        assert_eq!(tokens.labeled::<u32>().unwrap(), 3);
        assert_eq!(tokens.labeled_floats::<3>().unwrap(), [0.5, 1.0, 2.0]);
        tokens.skip().unwrap();
        assert!(tokens.flag().unwrap());
        assert_eq!(tokens.consumed(), 8);
    }

    #[test]
    fn test_end_of_input_is_parse_error() {
        let mut tokens = Tokens::new("Name:");
        tokens.enter("materials");

        let err = tokens.labeled::<String>().unwrap_err();
        match err {
            Error::Parse { section, token, .. } => {
                assert_eq!(section, "materials");
                assert_eq!(token, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_reports_token_index() {
        let mut tokens = Tokens::new("1 2 x 4");
        tokens.enter("triangles");

        let err = tokens.floats::<4>().unwrap_err();
        assert!(matches!(err, Error::Parse { section: "triangles", token: 2, .. }));
    }

    #[test]
    fn test_expect_literal() {
        let mut tokens = Tokens::new("{ ]");
        tokens.expect("{").unwrap();
        assert!(tokens.expect("}").is_err());
    }

    #[test]
    fn test_narrowing_overflow_is_error() {
        let mut tokens = Tokens::new("70000");
        assert!(tokens.parse::<u16>().is_err());
    }
}
