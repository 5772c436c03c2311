//! End-to-end formatting of one document.

use crate::config::FormatConfig;
use crate::error::Error;
use crate::inline::replace_refs;
use crate::parser::parse;
use crate::print::{PrintOptions, Printer};
use crate::schema::CallableIndex;
use crate::scope::collect_refs;
use crate::simplify::simplify_blocks;
use crate::tree::Sequence;
use std::io::Write;
use tracing::debug;

/// Formats documents against a shared, read-only callable index.
///
/// Each call keeps its binding tables and output private, so one formatter
/// can serve several threads.
pub struct Formatter<'a> {
    index: &'a CallableIndex,
    config: &'a FormatConfig,
    options: PrintOptions,
}

impl<'a> Formatter<'a> {
    pub fn new(index: &'a CallableIndex, config: &'a FormatConfig, options: PrintOptions) -> Self {
        Self {
            index,
            config,
            options,
        }
    }

    /// Inline bindings and unwrap blocks.
    pub fn transform(&self, root: &Sequence) -> Sequence {
        let tables = collect_refs(root);
        debug!(
            bindings = tables.bindings.len(),
            referenced = tables.counts.len(),
            "collected references"
        );

        let inlined = replace_refs(&root.items, &tables, &self.config.inline);
        debug!(inlined = inlined.replaced.len(), "inlined bindings");

        root.with_items(simplify_blocks(&inlined.nodes))
    }

    /// Parse, transform and print `source`, followed by a newline.
    pub fn render<W: Write>(&self, source: &str, out: &mut W) -> Result<(), Error> {
        let root = parse(source)?;
        let program = self.transform(&root);
        Printer::new(self.index, &self.config.print, self.options).print(&program, out)?;
        out.write_all(b"\n")?;
        Ok(())
    }

    pub fn render_to_string(&self, source: &str) -> Result<String, Error> {
        let mut buf = Vec::new();
        self.render(source, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
