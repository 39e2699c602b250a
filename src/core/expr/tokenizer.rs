//! Tokenizer for SOI calculation expressions.
//!
//! The grammar is deliberately small: numeric literals, variable identifiers,
//! the four arithmetic operators and parentheses. Nothing else is admitted,
//! which keeps malformed metadata from ever reaching the evaluator.

use std::iter::Peekable;
use std::str::Chars;

/// A token in a calculation expression
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A numeric literal (e.g., 123, 45.67, 1.5e10)
    Number(f64),
    /// A variable identifier (e.g., eucalc_elc_capex_nuclear)
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    OpenParen,
    CloseParen,
}

/// Error during tokenization
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizeError {
    pub message: String,
    pub position: usize,
}

impl TokenizeError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl std::fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tokenize error at position {}: {}",
            self.position, self.message
        )
    }
}

impl std::error::Error for TokenizeError {}

/// Tokenizer for calculation expressions
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(expression: &'a str) -> Self {
        Self {
            chars: expression.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenize the entire expression into a vector of tokens
    pub fn tokenize(mut self) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, TokenizeError> {
        self.skip_whitespace();

        match self.peek() {
            None => Ok(None),
            Some(c) => {
                let token = match c {
                    '+' => {
                        self.advance();
                        Token::Plus
                    }
                    '-' => {
                        self.advance();
                        Token::Minus
                    }
                    '*' => {
                        self.advance();
                        Token::Star
                    }
                    '/' => {
                        self.advance();
                        Token::Slash
                    }
                    '(' => {
                        self.advance();
                        Token::OpenParen
                    }
                    ')' => {
                        self.advance();
                        Token::CloseParen
                    }
                    c if c.is_ascii_digit() => self.read_number()?,
                    c if c.is_alphabetic() || c == '_' => self.read_identifier(),
                    c => {
                        return Err(TokenizeError::new(
                            format!("unexpected character: '{c}'"),
                            self.position,
                        ));
                    }
                };
                Ok(Some(token))
            }
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read a number (integer, decimal, or scientific notation)
    fn read_number(&mut self) -> Result<Token, TokenizeError> {
        let start_pos = self.position;
        let mut num_str = String::new();

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                num_str.push(self.advance().unwrap());
            } else {
                break;
            }
        }

        if self.peek() == Some('.') {
            num_str.push(self.advance().unwrap());
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    num_str.push(self.advance().unwrap());
                } else {
                    break;
                }
            }
        }

        if let Some(c) = self.peek() {
            if c == 'e' || c == 'E' {
                num_str.push(self.advance().unwrap());
                if let Some(sign) = self.peek() {
                    if sign == '+' || sign == '-' {
                        num_str.push(self.advance().unwrap());
                    }
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        num_str.push(self.advance().unwrap());
                    } else {
                        break;
                    }
                }
            }
        }

        num_str
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| TokenizeError::new(format!("invalid number: {num_str}"), start_pos))
    }

    /// Read a variable identifier
    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(self.advance().unwrap());
            } else {
                break;
            }
        }

        Token::Identifier(ident)
    }
}

/// Convenience function to tokenize an expression string
pub fn tokenize(expression: &str) -> Result<Vec<Token>, TokenizeError> {
    Tokenizer::new(expression).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_number() {
        assert_eq!(tokenize("42").unwrap(), vec![Token::Number(42.0)]);
        assert_eq!(tokenize("3.567").unwrap(), vec![Token::Number(3.567)]);
        assert_eq!(tokenize("1.5e10").unwrap(), vec![Token::Number(1.5e10)]);
    }

    #[test]
    fn test_tokenize_identifier() {
        assert_eq!(
            tokenize("eucalc_elc_capex_nuclear").unwrap(),
            vec![Token::Identifier("eucalc_elc_capex_nuclear".to_string())]
        );
        assert_eq!(
            tokenize("_private").unwrap(),
            vec![Token::Identifier("_private".to_string())]
        );
    }

    #[test]
    fn test_tokenize_binary_expression() {
        assert_eq!(
            tokenize("a + b").unwrap(),
            vec![
                Token::Identifier("a".to_string()),
                Token::Plus,
                Token::Identifier("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_all_operators() {
        assert_eq!(
            tokenize("+ - * /").unwrap(),
            vec![Token::Plus, Token::Minus, Token::Star, Token::Slash]
        );
    }

    #[test]
    fn test_tokenize_parenthesized() {
        assert_eq!(
            tokenize("a / (b + c)").unwrap(),
            vec![
                Token::Identifier("a".to_string()),
                Token::Slash,
                Token::OpenParen,
                Token::Identifier("b".to_string()),
                Token::Plus,
                Token::Identifier("c".to_string()),
                Token::CloseParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_identifier_starting_with_digit_splits() {
        // "123abc" reads as a number followed by an identifier; the parser
        // rejects the sequence later.
        assert_eq!(
            tokenize("123abc").unwrap(),
            vec![Token::Number(123.0), Token::Identifier("abc".to_string())]
        );
    }

    #[test]
    fn test_tokenize_empty_and_whitespace() {
        assert_eq!(tokenize("").unwrap(), vec![]);
        assert_eq!(tokenize("   ").unwrap(), vec![]);
    }

    #[test]
    fn test_tokenize_rejects_foreign_characters() {
        assert!(tokenize("a ^ b").is_err());
        assert!(tokenize("__import__('os')").is_err());
        assert!(tokenize("a; b").is_err());
    }
}
