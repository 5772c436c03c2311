//! Schema-aware pretty printer.
//!
//! Calls of "long" operators are laid out one argument per line, with each
//! argument prefixed by its schema name (`⦗Name⦘`). `block` bodies start on
//! their own line, and `let`/`return`/`declare` forms end a line.

use crate::config::PrintConfig;
use crate::schema::{CallableIndex, ChildNames};
use crate::tree::{AtomKind, Node, Sequence};
use colored::Colorize;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::{self, Write};

/// Output switches decided by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrintOptions {
    /// Emit ANSI colors
    pub color: bool,
    /// Draw indentation guides
    pub tabstops: bool,
}

/// Color classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Comment,
    Callable,
    Special,
    StrLiteral,
    Literal,
    /// Lambdas and their parameters
    Arg,
    Tabline,
}

impl Style {
    fn rgb(self) -> (u8, u8, u8) {
        match self {
            Style::Comment => (128, 128, 128),
            Style::Callable => (0, 128, 128),
            Style::Special => (128, 0, 128),
            Style::StrLiteral | Style::Literal => (64, 192, 192),
            Style::Arg => (192, 156, 0),
            Style::Tabline => (64, 64, 64),
        }
    }
}

fn operator_style(operator: Option<&str>) -> Option<Style> {
    match operator? {
        "lambda" => Some(Style::Arg),
        "block" | "let" | "return" | "declare" => Some(Style::Special),
        _ => Some(Style::Callable),
    }
}

/// Per-sequence printing state.
#[derive(Debug, Default)]
struct Context {
    shift: usize,
    /// References known to be lambda parameters
    lambda_args: HashSet<u64>,
    /// Printing a lambda's parameter list
    is_lambda_args: bool,
}

/// Prints trees against a callable index.
pub struct Printer<'a> {
    index: &'a CallableIndex,
    config: &'a PrintConfig,
    options: PrintOptions,
}

impl<'a> Printer<'a> {
    pub fn new(index: &'a CallableIndex, config: &'a PrintConfig, options: PrintOptions) -> Self {
        Self {
            index,
            config,
            options,
        }
    }

    /// Print the children of `root` without surrounding parentheses.
    pub fn print<W: Write>(&self, root: &Sequence, out: &mut W) -> io::Result<()> {
        self.print_list(out, root, &mut Context::default())
    }

    /// Print into a string, mostly for tests and small documents.
    pub fn print_to_string(&self, root: &Sequence) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail.
        let _ = self.print(root, &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn is_long(&self, seq: &Sequence) -> bool {
        seq.len() > 2 && seq.operator().is_some_and(|op| self.config.is_long(op))
    }

    /// Whether `node` is or contains a long or `block` call.
    fn has_long_or_block(&self, node: &Node) -> bool {
        match node {
            Node::Seq(seq) => {
                self.is_long(seq)
                    || seq.operator() == Some("block")
                    || seq.items.iter().any(|item| self.has_long_or_block(item))
            }
            Node::Atom(_) | Node::Ref(_) => false,
        }
    }

    fn paint<W: Write>(&self, out: &mut W, style: Option<Style>, text: &str) -> io::Result<()> {
        match style {
            Some(style) if self.options.color => {
                let (r, g, b) = style.rgb();
                write!(out, "{}", text.truecolor(r, g, b))
            }
            _ => out.write_all(text.as_bytes()),
        }
    }

    fn newline<W: Write>(&self, out: &mut W, shift: usize) -> io::Result<()> {
        out.write_all(b"\n")?;
        for _ in 0..shift {
            if self.options.tabstops {
                self.paint(out, Some(Style::Tabline), "\u{2506}   ")?;
            } else {
                out.write_all(b"    ")?;
            }
        }
        Ok(())
    }

    fn label<W: Write>(&self, out: &mut W, names: Option<&ChildNames>, position: usize) -> io::Result<bool> {
        let Some(name) = names.and_then(|names| names.get(&position)) else {
            return Ok(false);
        };
        let name = match name.as_str() {
            "Input" => "⇐",
            "Lambda" => "λ",
            other => other,
        };
        self.paint(out, Some(Style::Comment), &format!("⦗{name}⦘"))?;
        Ok(true)
    }

    fn print_list<W: Write>(&self, out: &mut W, list: &Sequence, ctx: &mut Context) -> io::Result<()> {
        let operator = list.operator();
        let is_long = self.is_long(list);
        let is_block = operator == Some("block");
        let names = operator.and_then(|op| self.index.children(op));

        if is_long {
            ctx.shift += 1;
        }

        for (pos, item) in list.items.iter().enumerate() {
            let is_last = pos + 1 == list.len();
            // Long calls break lines between arguments instead
            let separate = !is_last && !is_long;

            if pos > 0 {
                if is_long {
                    self.newline(out, ctx.shift)?;
                }
                let labelled = self.label(out, names, pos - 1)?;
                if labelled && is_long && self.has_long_or_block(item) {
                    self.newline(out, ctx.shift)?;
                }
            }

            match item {
                Node::Seq(sub) => {
                    let is_lambda_args = operator == Some("lambda") && pos == 1;
                    let sub_operator = sub.operator();
                    let style = if is_block {
                        Some(Style::Special)
                    } else if is_lambda_args {
                        Some(Style::Arg)
                    } else {
                        operator_style(sub_operator)
                    };

                    self.paint(out, style, if sub.quoted { "'(" } else { "(" })?;
                    let mut arg_shift = ctx.shift;
                    if is_block {
                        arg_shift += 1;
                        self.newline(out, arg_shift)?;
                    }

                    let mut sub_ctx = Context {
                        shift: arg_shift,
                        lambda_args: if is_lambda_args {
                            HashSet::new()
                        } else {
                            ctx.lambda_args.clone()
                        },
                        is_lambda_args,
                    };
                    self.print_list(out, sub, &mut sub_ctx)?;
                    if is_lambda_args {
                        ctx.lambda_args.extend(sub_ctx.lambda_args);
                    }
                    self.paint(out, style, ")")?;

                    if matches!(sub_operator, Some("return" | "let" | "declare")) {
                        let shift = if is_last {
                            ctx.shift.saturating_sub(1)
                        } else {
                            ctx.shift
                        };
                        self.newline(out, shift)?;
                    } else if separate {
                        out.write_all(b" ")?;
                    }
                }
                Node::Atom(atom) => {
                    if atom.quoted {
                        self.paint(out, Some(Style::Literal), "'")?;
                    }
                    match &atom.kind {
                        AtomKind::Str(text) => {
                            let literal = format!("\"{}\"", escape_string(text));
                            self.paint(out, Some(Style::StrLiteral), &literal)?;
                        }
                        AtomKind::Symbol(text) | AtomKind::Number(text) => {
                            let style = if pos == 0 && operator.is_some() {
                                operator_style(operator)
                            } else {
                                Some(Style::Literal)
                            };
                            self.paint(out, style, text)?;
                        }
                    }
                    if separate {
                        out.write_all(b" ")?;
                    }
                }
                Node::Ref(id) => {
                    let style = if ctx.is_lambda_args {
                        ctx.lambda_args.insert(*id);
                        Some(Style::Arg)
                    } else if ctx.lambda_args.contains(id) {
                        Some(Style::Arg)
                    } else {
                        None
                    };
                    self.paint(out, style, &format!("${id}"))?;
                    if separate {
                        out.write_all(b" ")?;
                    }
                }
            }
        }

        if is_long {
            ctx.shift -= 1;
            self.newline(out, ctx.shift)?;
        }
        Ok(())
    }
}

/// Escape a string literal's contents for display.
///
/// Backslashes, quotes and control characters use backslash escapes;
/// non-ASCII characters are shown as `\xNN`, `\uNNNN` or `\UNNNNNNNN`.
pub fn escape_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            ' '..='~' => escaped.push(ch),
            _ => {
                let code = ch as u32;
                let _ = match code {
                    0..=0xff => write!(escaped, "\\x{code:02x}"),
                    0x100..=0xffff => write!(escaped, "\\u{code:04x}"),
                    _ => write!(escaped, "\\U{code:08x}"),
                };
            }
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::parser::parse;
    use crate::schema::Schema;

    fn index() -> CallableIndex {
        let schema = Schema::from_json(
            r#"{"Nodes": [
                {"Name": "TCoMap", "Match": {"Type": "Callable", "Name": "Map"},
                 "Children": [{"Index": 0, "Name": "Input"}, {"Index": 1, "Name": "Lambda"}]},
                {"Name": "TCoCall", "Match": {"Type": "Callable", "Name": "Call"},
                 "Children": [{"Index": 0, "Name": "Callee"}, {"Index": 1, "Name": "Arg"}]}
            ]}"#,
        )
        .unwrap();
        CallableIndex::build(&schema, &ResolverConfig::default())
    }

    fn render(source: &str, options: PrintOptions) -> String {
        let index = index();
        let config = PrintConfig::default();
        let root = parse(source).unwrap();
        Printer::new(&index, &config, options).print_to_string(&root)
    }

    fn plain(source: &str) -> String {
        render(source, PrintOptions::default())
    }

    #[test]
    fn test_short_call_single_line() {
        assert_eq!(plain("(Foo $1 'a \"s\" 12)"), "(Foo $1 'a \"s\" 12)");
        assert_eq!(plain("(a) (b)"), "(a) (b)");
    }

    #[test]
    fn test_labels_on_short_call() {
        assert_eq!(plain("(Call (F) (G))"), "(Call ⦗Callee⦘(F) ⦗Arg⦘(G))");
    }

    #[test]
    fn test_long_operator_layout() {
        let out = plain("(X (Map $1 (lambda '($2) $2)))");
        assert_eq!(out, "(X (Map\n    ⦗⇐⦘$1\n    ⦗λ⦘(lambda '($2) $2)\n))");
    }

    #[test]
    fn test_long_operator_needs_three_children() {
        assert_eq!(plain("(Map $1)"), "(Map ⦗⇐⦘$1)");
    }

    #[test]
    fn test_nested_long_call_moves_to_own_line() {
        let out = plain("(Map (Map $1 $2) $3)");
        assert_eq!(
            out,
            "(Map\n    ⦗⇐⦘\n    (Map\n        ⦗⇐⦘$1\n        ⦗λ⦘$2\n    )\n    ⦗λ⦘$3\n)"
        );
    }

    #[test]
    fn test_block_and_statements() {
        let out = plain("(block '((let $1 (A)) (return $1)))");
        assert_eq!(out, "(block '(\n    (let $1 (A))\n    (return $1)\n))");
    }

    #[test]
    fn test_tabstops() {
        let out = render(
            "(block '((return $1)))",
            PrintOptions {
                color: false,
                tabstops: true,
            },
        );
        assert_eq!(out, "(block '(\n\u{2506}   (return $1)\n))");
    }

    fn strip_ansi(text: &str) -> String {
        let mut plain = String::new();
        let mut chars = text.chars();
        while let Some(ch) = chars.next() {
            if ch == '\x1b' {
                let _ = chars.by_ref().find(|&c| c == 'm');
            } else {
                plain.push(ch);
            }
        }
        plain
    }

    #[test]
    fn test_color_output() {
        colored::control::set_override(true);
        let source = "(Map (Foo \"s\" $1) (lambda '($2) $2))";
        let out = render(
            source,
            PrintOptions {
                color: true,
                tabstops: true,
            },
        );
        assert!(out.contains('\x1b'), "{out:?}");
        // Plain references stay uncolored
        assert!(out.contains(" $1"), "{out:?}");
        assert_eq!(
            strip_ansi(&out),
            render(
                source,
                PrintOptions {
                    color: false,
                    tabstops: true,
                },
            )
        );
    }

    #[test]
    fn test_no_color_when_disabled() {
        let out = plain("(lambda '($1) (Foo $1 \"s\"))");
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("plain"), "plain");
        assert_eq!(escape_string("a\\b\"c"), "a\\\\b\\\"c");
        assert_eq!(escape_string("line\nnext\t"), "line\\nnext\\t");
        assert_eq!(escape_string("\u{1}"), "\\x01");
        assert_eq!(escape_string("é"), "\\xe9");
        assert_eq!(escape_string("λ"), "\\u03bb");
        assert_eq!(escape_string("😀"), "\\U0001f600");
    }
}
