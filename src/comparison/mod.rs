//! Recursive comparison of two directory trees.
//!
//! The comparator builds a tree of [`DiffNode`]s; turning that tree into the
//! indented text report is left to the [`TreeRenderer`].

mod category;
mod diff_node;
mod renderer;
mod tree_comparator;

pub use category::EntryCategory;
pub use diff_node::DiffNode;
pub use renderer::TreeRenderer;
pub use tree_comparator::{CompareError, CompareOptions, TreeComparator};
