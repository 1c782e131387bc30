//! Sibling ordering policies.

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::HashMap, iter::Peekable, str::Chars};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::{
    config::RenderPolicy,
    folder_note::folder_note_for,
    frontmatter,
    vault::{Node, Vault},
};

/// Priorities keyed by node path.
pub type Priorities = HashMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortType {
    /// Case and accent insensitive, numeric aware
    #[default]
    Natural,
    /// Plain code point order
    Lexicographic,
    /// Front-matter priority first, natural order for the rest
    Priority,
    /// Folders before documents, natural order within each group
    FoldersFirst,
}

impl SortType {
    pub fn needs_priorities(&self) -> bool {
        matches!(self, SortType::Priority)
    }

    pub fn compare(&self, a: &Node, b: &Node, priorities: &Priorities) -> Ordering {
        match self {
            SortType::Natural => natural_cmp(a.display_name(), b.display_name()),
            SortType::Lexicographic => a.display_name().cmp(b.display_name()),
            SortType::FoldersFirst => match (a.is_folder(), b.is_folder()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => natural_cmp(a.display_name(), b.display_name()),
            },
            SortType::Priority => match (priorities.get(&a.path), priorities.get(&b.path)) {
                (Some(pa), Some(pb)) => pa.total_cmp(pb),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => natural_cmp(a.display_name(), b.display_name()),
            },
        }
    }

    /// Stable sort, so equal priorities keep the store's order.
    pub fn sort(&self, nodes: &mut [Node], priorities: &Priorities) {
        nodes.sort_by(|a, b| self.compare(a, b, priorities));
    }
}

/// Read the priority of each node: a document's own front-matter, or a folder's folder note.
pub async fn collect_priorities<V: Vault + ?Sized>(
    vault: &V,
    nodes: &[Node],
    policy: &RenderPolicy,
) -> Priorities {
    let mut priorities = Priorities::new();
    for node in nodes {
        let source = if node.is_folder() {
            folder_note_for(vault, node, policy.folder_note_type)
        } else {
            Some(node.clone())
        };
        let Some(source) = source.filter(Node::is_markdown) else {
            continue;
        };
        if let Some(value) = vault
            .metadata(&source, &policy.priority_key)
            .await
            .as_ref()
            .and_then(frontmatter::as_number)
        {
            priorities.insert(node.path.clone(), value);
        }
    }
    priorities
}

fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn take_number(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        // "01" after "1"
        .then_with(|| a.len().cmp(&b.len()))
}

/// Human ordering: `"file2" < "File10"`, `"é" == "e"`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = fold(a);
    let b = fold(b);
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let ord = cmp_digit_runs(&take_number(&mut ai), &take_number(&mut bi));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(ca), Some(cb)) => {
                if ca != cb {
                    return ca.cmp(&cb);
                }
                ai.next();
                bi.next();
            }
        }
    }
}
