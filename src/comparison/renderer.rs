use std::io::{self, Write};

use colored::Colorize;

use crate::comparison::DiffNode;

/// Written once per depth level in front of every line.
const INDENT: &str = "|  ";
/// Written right before the message of every line.
const BRANCH: &str = "|- ";

const ROOT_LABEL: &str = "<root>";

/// Serializes a [`DiffNode`] tree into the indented text report.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeRenderer {
    colorize: bool,
}

impl TreeRenderer {
    pub fn new(colorize: bool) -> Self {
        Self { colorize }
    }

    pub fn write_root(&self, sink: &mut impl Write) -> io::Result<()> {
        write_prefix(sink, 0)?;
        writeln!(sink, "{ROOT_LABEL}")
    }

    /// Writes `nodes` at `depth`, children of directories one level deeper.
    pub fn render_nodes(
        &self,
        nodes: &[DiffNode],
        depth: usize,
        sink: &mut impl Write,
    ) -> io::Result<()> {
        for node in nodes {
            write_prefix(sink, depth)?;
            if self.colorize {
                write!(sink, "{}", paint(node))?;
            } else {
                node.write_raw(sink)?;
            }
            writeln!(sink)?;
            if let DiffNode::Directory { children, .. } = node {
                self.render_nodes(children, depth + 1, sink)?;
            }
        }
        Ok(())
    }
}

/// Coloured lines go to a terminal, so names are shown lossily there.
fn paint(node: &DiffNode) -> String {
    let line = node.to_string();
    match node {
        DiffNode::Differs { .. } => line.yellow().to_string(),
        DiffNode::DirIsFile { .. } | DiffNode::FileIsDir { .. } => line.magenta().to_string(),
        DiffNode::Missing { .. } => line.red().to_string(),
        DiffNode::Directory { .. } => line.blue().bold().to_string(),
        DiffNode::Unreadable { .. } => line.red().bold().to_string(),
    }
}

fn write_prefix(sink: &mut impl Write, depth: usize) -> io::Result<()> {
    for _ in 0..depth {
        sink.write_all(INDENT.as_bytes())?;
    }
    sink.write_all(BRANCH.as_bytes())
}
