//! S-expression dump parser.
//!
//! Single left-to-right scan with one character of lookahead. The result is
//! an unquoted root [`Sequence`] holding every top-level node of the input.

use crate::tree::{Atom, AtomKind, Node, Sequence};
use thiserror::Error;

/// Errors that abort parsing. Positions are 1-based.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated string literal starting at {line}:{column}")]
    UnterminatedString { line: usize, column: usize },

    #[error("unterminated token starting at {line}:{column}")]
    UnterminatedToken { line: usize, column: usize },

    #[error("invalid reference at {line}:{column}: expected digits after '$'")]
    InvalidReference { line: usize, column: usize },

    #[error("unexpected ')' at {line}:{column}")]
    UnexpectedClose { line: usize, column: usize },

    #[error("{open} unclosed sequence(s) at end of input")]
    UnclosedSequence { open: usize },
}

/// Parse an IR dump into its root sequence.
pub fn parse(source: &str) -> Result<Sequence, ParseError> {
    Parser::new(source).run()
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
    /// Open sequences; index 0 is the root
    stack: Vec<Sequence>,
    quote: bool,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            stack: vec![Sequence::default()],
            quote: false,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn push(&mut self, node: Node) {
        // The root is never popped, so the stack is never empty here.
        if let Some(top) = self.stack.last_mut() {
            top.items.push(node);
        }
    }

    fn run(mut self) -> Result<Sequence, ParseError> {
        while let Some(ch) = self.peek() {
            let (line, column) = (self.line, self.column);

            if ch == '\'' {
                self.advance();
                self.quote = true;
                continue;
            }

            let quoted = std::mem::take(&mut self.quote);
            match ch {
                '(' => {
                    self.advance();
                    self.stack.push(Sequence {
                        items: Vec::new(),
                        quoted,
                    });
                }
                ')' => {
                    self.advance();
                    if self.stack.len() == 1 {
                        return Err(ParseError::UnexpectedClose { line, column });
                    }
                    if let Some(done) = self.stack.pop() {
                        self.push(Node::Seq(done));
                    }
                }
                '"' => {
                    self.advance();
                    let text = self
                        .read_string()
                        .ok_or(ParseError::UnterminatedString { line, column })?;
                    self.push(Node::Atom(Atom {
                        kind: AtomKind::Str(text),
                        quoted,
                    }));
                }
                '$' => {
                    self.advance();
                    let id = self
                        .read_digits()
                        .parse()
                        .map_err(|_| ParseError::InvalidReference { line, column })?;
                    self.push(Node::Ref(id));
                }
                c if c.is_ascii_digit() => {
                    let digits = self.read_digits();
                    // Integer value: leading zeros carry nothing
                    let value = match digits.trim_start_matches('0') {
                        "" => "0".to_string(),
                        trimmed => trimmed.to_string(),
                    };
                    self.push(Node::Atom(Atom {
                        kind: AtomKind::Number(value),
                        quoted,
                    }));
                }
                c if c.is_whitespace() => {
                    self.advance();
                }
                _ => {
                    let text = self
                        .read_symbol()
                        .ok_or(ParseError::UnterminatedToken { line, column })?;
                    self.push(Node::Atom(Atom {
                        kind: AtomKind::Symbol(text),
                        quoted,
                    }));
                }
            }
        }

        if self.stack.len() > 1 {
            return Err(ParseError::UnclosedSequence {
                open: self.stack.len() - 1,
            });
        }
        Ok(self.stack.pop().unwrap_or_default())
    }

    /// Reads up to the closing quote, which is consumed. `None` at end of input.
    fn read_string(&mut self) -> Option<String> {
        let mut text = String::new();
        loop {
            match self.advance()? {
                '\\' => text.push(self.advance()?),
                '"' => return Some(text),
                ch => text.push(ch),
            }
        }
    }

    fn read_digits(&mut self) -> String {
        let mut digits = String::new();
        while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
            digits.push(ch);
            self.advance();
        }
        digits
    }

    /// Reads up to whitespace or `)`, neither consumed. `None` at end of input.
    fn read_symbol(&mut self) -> Option<String> {
        let mut text = String::new();
        loop {
            match self.peek()? {
                ch if ch == ')' || ch.is_whitespace() => return Some(text),
                ch => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(source: &str) -> Node {
        let root = parse(source).expect("parse failed");
        assert_eq!(root.items.len(), 1, "source: {}", source);
        root.items.into_iter().next().unwrap()
    }

    #[test]
    fn test_parse_call() {
        let node = single("(Map $1 (lambda '($2) $2))\n");
        let seq = node.as_seq().unwrap();
        assert_eq!(seq.operator(), Some("Map"));
        assert_eq!(seq.items.len(), 3);
        assert_eq!(seq.items[1], Node::Ref(1));

        let lambda = seq.items[2].as_seq().unwrap();
        assert_eq!(lambda.operator(), Some("lambda"));
        let params = lambda.items[1].as_seq().unwrap();
        assert!(params.quoted);
        assert_eq!(params.items, vec![Node::Ref(2)]);
    }

    #[test]
    fn test_parse_literals() {
        let node = single("(Int32 '\"a\\\"b\\\\c\" 042 'Foo)");
        let seq = node.as_seq().unwrap();
        assert_eq!(seq.items[1], Atom::string("a\"b\\c").quote().into());
        assert_eq!(seq.items[2], Atom::number("42").into());
        assert_eq!(seq.items[3], Atom::symbol("Foo").quote().into());
    }

    #[test]
    fn test_quote_applies_to_next_token_only() {
        let node = single("('(a) b ' c)");
        let seq = node.as_seq().unwrap();
        assert!(seq.items[0].as_seq().unwrap().quoted);
        assert_eq!(seq.items[1], Node::symbol("b"));
        // Whitespace after the marker consumes it
        assert_eq!(seq.items[2], Node::symbol("c"));
    }

    #[test]
    fn test_numbers_drop_leading_zeros() {
        let node = single("(Int32 042 000 7 '0010)");
        let seq = node.as_seq().unwrap();
        assert_eq!(seq.items[1], Atom::number("42").into());
        assert_eq!(seq.items[2], Atom::number("0").into());
        assert_eq!(seq.items[3], Atom::number("7").into());
        assert_eq!(seq.items[4], Atom::number("10").quote().into());
    }

    #[test]
    fn test_digits_then_symbol_split() {
        let node = single("(12ab)");
        let seq = node.as_seq().unwrap();
        assert_eq!(seq.items, vec![Atom::number("12").into(), Node::symbol("ab")]);
    }

    #[test]
    fn test_newlines_are_whitespace() {
        let root = parse("(a\n  b)\n\n(c)\n").unwrap();
        assert_eq!(root.items.len(), 2);
        assert_eq!(root.items[0].as_seq().unwrap().items.len(), 2);
        assert!(!root.quoted);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("  \n\t").unwrap().is_empty());
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            parse("(a\n \"abc)"),
            Err(ParseError::UnterminatedString { line: 2, column: 2 })
        );
        assert_eq!(
            parse("(\"abc\\"),
            Err(ParseError::UnterminatedString { line: 1, column: 2 })
        );
    }

    #[test]
    fn test_unterminated_token() {
        assert_eq!(
            parse("(a) b"),
            Err(ParseError::UnterminatedToken { line: 1, column: 5 })
        );
    }

    #[test]
    fn test_invalid_reference() {
        assert_eq!(
            parse("($x)"),
            Err(ParseError::InvalidReference { line: 1, column: 2 })
        );
    }

    #[test]
    fn test_unbalanced() {
        assert_eq!(
            parse("(a))"),
            Err(ParseError::UnexpectedClose { line: 1, column: 4 })
        );
        assert_eq!(parse("((a)"), Err(ParseError::UnclosedSequence { open: 1 }));
    }
}
