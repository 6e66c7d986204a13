//! Indented tree printing, for test diagnostics.
use crate::trie::TrieNode::{Branch, Leaf};
use crate::trie::{Trie, TrieNode};
use std::fmt::Display;

impl Display for Trie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(root) = self.root.as_ref() else {
            return write!(f, "Trie {{ EMPTY }}");
        };

        fn fmt_node(
            f: &mut std::fmt::Formatter<'_>,
            node: &TrieNode,
            indent: usize,
        ) -> std::fmt::Result {
            write!(f, "{}", " ".repeat(indent))?;
            match node {
                Branch(branch) => {
                    write!(f, "Branch {:?}", branch.path.to_vec())?;
                    for child in branch.children.iter().flatten() {
                        writeln!(f)?;
                        fmt_node(f, child, indent + 4)?;
                    }
                    Ok(())
                }
                Leaf(leaf) => write!(
                    f,
                    "Leaf {{ path: {:?}, value: {:?} }}",
                    leaf.path.to_vec(),
                    leaf.value
                ),
            }
        }

        fmt_node(f, root, 0)
    }
}
