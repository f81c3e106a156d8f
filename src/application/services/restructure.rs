//! Restructure service
//!
//! Runs the two passes over a document: the first pass builds the node tree
//! and collects menu entries, the second rewrites `@node` lines and menus
//! while copying everything else through.

use std::io::Write;

use generational_arena::Index;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    line_ending, link, parse_menu, Diagnostic, DocumentTree, DomainError, LineClassifier,
    LineKind, LinkedDocument, MenuEntry, TreeBuilder,
};
use crate::infrastructure::traits::{LineSource, Reporter, TextEncoding};

/// Result of the first pass.
#[derive(Debug)]
pub struct Document {
    pub tree: DocumentTree,
    /// Menu entries in document order
    pub entries: Vec<MenuEntry>,
    /// Non-fatal findings of the tree builder
    pub diagnostics: Vec<Diagnostic>,
}

/// Counts for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Nodes in the document, the synthetic root excluded
    pub nodes: usize,
    pub menu_entries: usize,
    pub diagnostics: usize,
}

/// Raw lines of one menu block.
struct MenuText {
    body: String,
    /// The `@end menu` line as written
    close: String,
    end_line: usize,
}

/// Rebuilds node pointers and menus from the heading structure.
pub struct RestructureService {
    settings: Settings,
    classifier: LineClassifier,
}

impl RestructureService {
    pub fn new(settings: Settings) -> Self {
        let classifier = LineClassifier::new(&settings.placeholder_marker);
        Self {
            settings,
            classifier,
        }
    }

    /// First pass: build the tree and collect menu entries.
    #[instrument(level = "debug", skip_all)]
    pub fn scan(&self, source: &mut dyn LineSource) -> ApplicationResult<Document> {
        let mut builder = TreeBuilder::new();
        let mut entries = Vec::new();
        let mut line_no = 0;

        while let Some(line) = source.next_line().with_context("read input")? {
            line_no += 1;
            match self.classifier.classify(&line) {
                LineKind::MenuOpen => {
                    let text = self.slurp_menu(source, line_no)?;
                    line_no = text.end_line;
                    let menu = parse_menu(&text.body, text.end_line)?;
                    if let Some(comment) = menu.comment {
                        builder.set_menu_comment(comment);
                    }
                    entries.extend(menu.entries);
                }
                LineKind::Node { name } => builder.observe_node(&name, line_no),
                LineKind::Placeholder => builder.observe_placeholder(line_no),
                LineKind::Heading { level, title } => {
                    builder.observe_heading(level, &title, line_no)
                }
                LineKind::MenuClose | LineKind::Other => {}
            }
        }

        let (tree, diagnostics) = builder.finish();
        debug!(
            lines = line_no,
            nodes = tree.len() - 1,
            entries = entries.len(),
            "first pass done"
        );
        Ok(Document {
            tree,
            entries,
            diagnostics,
        })
    }

    /// Read a menu body up to and including its closing line.
    fn slurp_menu(
        &self,
        source: &mut dyn LineSource,
        open_line: usize,
    ) -> ApplicationResult<MenuText> {
        let mut body = String::new();
        let mut line_no = open_line;
        loop {
            let line = source
                .next_line()
                .with_context("read input")?
                .ok_or(DomainError::UnterminatedMenu { line: line_no })?;
            line_no += 1;
            if self.classifier.is_menu_close(&line) {
                return Ok(MenuText {
                    body,
                    close: line,
                    end_line: line_no,
                });
            }
            body.push_str(&line);
        }
    }

    /// Scan and link without writing anything.
    pub fn inspect(&self, source: &mut dyn LineSource) -> ApplicationResult<LinkedDocument> {
        let document = self.scan(source)?;
        Ok(link(document.tree, document.entries).0)
    }

    /// Full run: scan, link, rewind, rewrite into `sink`.
    ///
    /// Diagnostics reach `reporter` as soon as each phase produces them, so
    /// a fatal error in the second pass still leaves the earlier ones visible.
    #[instrument(level = "debug", skip_all)]
    pub fn run(
        &self,
        source: &mut dyn LineSource,
        sink: &mut dyn Write,
        reporter: &dyn Reporter,
    ) -> ApplicationResult<RunSummary> {
        let document = self.scan(source)?;
        let mut reported = emit(reporter, &document.diagnostics);

        let (mut linked, link_diagnostics) = link(document.tree, document.entries);
        reported += emit(reporter, &link_diagnostics);

        source.rewind().with_context("rewind input")?;
        self.rewrite(&mut linked, source, sink)?;
        sink.flush().with_context("flush output")?;

        if !self.settings.keep_menus {
            reported += emit(reporter, &linked.unconsumed_entries());
        }
        if self.settings.report_missing_entries {
            reported += emit(reporter, &linked.nodes_without_entries());
        }

        let summary = RunSummary {
            nodes: linked.tree.len() - 1,
            menu_entries: linked.entries.len(),
            diagnostics: reported,
        };
        info!(?summary, "restructure done");
        Ok(summary)
    }

    /// Second pass.
    ///
    /// Generated lines take the terminator of the line they replace and are
    /// written in the encoding the source was read with.
    fn rewrite(
        &self,
        doc: &mut LinkedDocument,
        source: &mut dyn LineSource,
        sink: &mut dyn Write,
    ) -> ApplicationResult<()> {
        let encoding = source.encoding();
        let mut line_no = 0;
        let mut current: Option<Index> = None;

        while let Some(line) = source.next_line().with_context("read input")? {
            line_no += 1;
            match self.classifier.classify(&line) {
                LineKind::Node { name } => {
                    let rendered = doc.node_line(&name, line_ending(&line))?;
                    current = doc.lookup(&name);
                    put(sink, encoding, &rendered)?;
                }
                LineKind::MenuOpen => {
                    let open_line = line_no;
                    let text = self.slurp_menu(source, open_line)?;
                    line_no = text.end_line;
                    if self.settings.keep_menus {
                        put(sink, encoding, &line)?;
                        put(sink, encoding, &text.body)?;
                        put(sink, encoding, &text.close)?;
                        continue;
                    }
                    let anchor = current.ok_or(DomainError::MenuBeforeNode { line: open_line })?;
                    // a menu line always has a successor, so its ending is never empty
                    let menu = doc.menu_block(anchor, open_line, line_ending(&line))?;
                    put(sink, encoding, &menu)?;
                }
                _ => put(sink, encoding, &line)?,
            }
        }
        Ok(())
    }
}

fn put(sink: &mut dyn Write, encoding: TextEncoding, text: &str) -> ApplicationResult<()> {
    sink.write_all(&encoding.encode(text))
        .with_context("write output")
}

fn emit(reporter: &dyn Reporter, diagnostics: &[Diagnostic]) -> usize {
    for diagnostic in diagnostics {
        reporter.report(diagnostic);
    }
    diagnostics.len()
}
