// src/lexer/dictionary.rs
// Prefix tree over ASCII letters. Populated once, then shared read-only by
// every lexer in the batch.

use super::tokens::KEYWORDS;

/// `A..=Z` then `a..=z`.
pub const N_LETTERS: usize = 52;
const NONE: u32 = 0;

#[derive(Clone)]
struct Node {
    // child node ids; 0 means absent (the root is never anybody's child)
    children: [u32; N_LETTERS],
    terminal: bool,
}

impl Node {
    fn new() -> Self {
        Self {
            children: [NONE; N_LETTERS],
            terminal: false,
        }
    }
}

#[inline]
fn slot(b: u8) -> Option<usize> {
    match b {
        b'A'..=b'Z' => Some((b - b'A') as usize),
        b'a'..=b'z' => Some((b - b'a') as usize + 26),
        _ => None,
    }
}

pub struct KeywordDictionary {
    nodes: Vec<Node>,
}

impl Default for KeywordDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordDictionary {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new()],
        }
    }

    /// Dictionary holding every reserved word of the grammar.
    pub fn with_keywords() -> Self {
        let mut dict = Self::new();
        for (kw, _) in KEYWORDS {
            dict.insert(kw);
        }
        log::debug!(
            "[dictionary] {} keywords -> {} nodes",
            KEYWORDS.len(),
            dict.node_count()
        );
        dict
    }

    /// Inserts `word`; returns `true` iff at least one new node was added.
    ///
    /// Words containing anything other than ASCII letters are rejected and
    /// leave the tree untouched.
    pub fn insert(&mut self, word: &str) -> bool {
        let Some(slots) = word.bytes().map(slot).collect::<Option<Vec<_>>>() else {
            return false;
        };
        if slots.is_empty() {
            return false;
        }
        let mut node = 0usize;
        let mut added = false;
        for s in slots {
            let child = self.nodes[node].children[s];
            node = if child == NONE {
                let id = self.nodes.len();
                self.nodes.push(Node::new());
                self.nodes[node].children[s] = id as u32;
                added = true;
                id
            } else {
                child as usize
            };
        }
        self.nodes[node].terminal = true;
        added
    }

    /// `true` iff `word` was inserted as a whole word.
    pub fn contains(&self, word: &str) -> bool {
        self.walk(word).is_some_and(|n| self.nodes[n].terminal)
    }

    /// `true` iff some inserted word starts with `prefix`.
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.walk(prefix).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn walk(&self, word: &str) -> Option<usize> {
        let mut node = 0usize;
        for b in word.bytes() {
            let child = self.nodes[node].children[slot(b)?];
            if child == NONE {
                return None;
            }
            node = child as usize;
        }
        Some(node)
    }
}
