// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Line-addressable text document.
//!
//! ```text
//! nodes (arena, never compacted)
//!   [0] "Name: foo"   prev=None next=1
//!   [1] "Source: x"   prev=0    next=3
//!   [2] <deleted>
//!   [3] "%prep"       prev=1    next=None
//!
//! head=0  tail=3  len=3
//! ```
//!
//! A [`LineHandle`] is an index into the arena. It stays valid while other
//! lines are inserted or deleted.

use std::collections::HashMap;
use std::fmt;

/// Stable identity of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineHandle(usize);

#[derive(Debug, Clone)]
struct Node {
    text: String,
    prev: Option<usize>,
    next: Option<usize>,
    alive: bool,
}

/// A mutable sequence of lines with O(1) insertion and removal.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    trailing_newline: bool,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits `content` into lines. Line terminators are not stored;
    /// a final newline is remembered and restored by [`Document::render`].
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut doc = Self::new();
        let body = match content.strip_suffix('\n') {
            Some(body) => {
                doc.trailing_newline = true;
                body
            }
            None => content,
        };
        if !content.is_empty() {
            for line in body.split('\n') {
                doc.append(line);
            }
        }
        doc
    }

    /// Number of live lines.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn node(&self, handle: LineHandle) -> &Node {
        let node = &self.nodes[handle.0];
        assert!(node.alive, "line {handle:?} has been deleted");
        node
    }

    /// Adds a line at the end.
    pub fn append(&mut self, text: impl Into<String>) -> LineHandle {
        let idx = self.nodes.len();
        self.nodes.push(Node {
            text: text.into(),
            prev: self.tail,
            next: None,
            alive: true,
        });
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;
        LineHandle(idx)
    }

    /// Adds a line at the start.
    pub fn prepend(&mut self, text: impl Into<String>) -> LineHandle {
        let Some(head) = self.head else {
            return self.append(text);
        };
        let idx = self.nodes.len();
        self.nodes.push(Node {
            text: text.into(),
            prev: None,
            next: Some(head),
            alive: true,
        });
        self.nodes[head].prev = Some(idx);
        self.head = Some(idx);
        self.len += 1;
        LineHandle(idx)
    }

    /// Inserts a line directly after `handle`.
    ///
    /// # Panics
    ///
    /// Panics if `handle` has been deleted.
    pub fn insert_after(&mut self, handle: LineHandle, text: impl Into<String>) -> LineHandle {
        let next = self.node(handle).next;
        let idx = self.nodes.len();
        self.nodes.push(Node {
            text: text.into(),
            prev: Some(handle.0),
            next,
            alive: true,
        });
        self.nodes[handle.0].next = Some(idx);
        match next {
            Some(next) => self.nodes[next].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.len += 1;
        LineHandle(idx)
    }

    /// Removes a line and returns its predecessor (`None` for the first line).
    ///
    /// # Panics
    ///
    /// Panics if `handle` has already been deleted.
    pub fn delete(&mut self, handle: LineHandle) -> Option<LineHandle> {
        let (prev, next) = {
            let node = self.node(handle);
            (node.prev, node.next)
        };
        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
        let node = &mut self.nodes[handle.0];
        node.alive = false;
        node.prev = None;
        node.next = None;
        node.text.clear();
        self.len -= 1;
        prev.map(LineHandle)
    }

    /// Replaces the text of a line.
    ///
    /// # Panics
    ///
    /// Panics if `handle` has been deleted.
    pub fn set_text(&mut self, handle: LineHandle, text: impl Into<String>) {
        self.node(handle);
        self.nodes[handle.0].text = text.into();
    }

    /// Text of a live line.
    ///
    /// # Panics
    ///
    /// Panics if `handle` has been deleted.
    #[must_use]
    pub fn text(&self, handle: LineHandle) -> &str {
        &self.node(handle).text
    }

    /// Text of a line, `None` once deleted.
    #[must_use]
    pub fn get(&self, handle: LineHandle) -> Option<&str> {
        self.nodes
            .get(handle.0)
            .filter(|node| node.alive)
            .map(|node| node.text.as_str())
    }

    #[must_use]
    pub fn is_alive(&self, handle: LineHandle) -> bool {
        self.nodes.get(handle.0).is_some_and(|node| node.alive)
    }

    #[must_use]
    pub fn first(&self) -> Option<LineHandle> {
        self.head.map(LineHandle)
    }

    #[must_use]
    pub fn last(&self) -> Option<LineHandle> {
        self.tail.map(LineHandle)
    }

    /// # Panics
    ///
    /// Panics if `handle` has been deleted.
    #[must_use]
    pub fn prev(&self, handle: LineHandle) -> Option<LineHandle> {
        self.node(handle).prev.map(LineHandle)
    }

    /// # Panics
    ///
    /// Panics if `handle` has been deleted.
    #[must_use]
    pub fn next(&self, handle: LineHandle) -> Option<LineHandle> {
        self.node(handle).next.map(LineHandle)
    }

    /// Iterates over `(handle, text)` from the first line to the last.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            doc: self,
            cursor: self.head,
        }
    }

    /// Current 0-based position of every live line.
    #[must_use]
    pub fn positions(&self) -> HashMap<LineHandle, usize> {
        self.iter()
            .enumerate()
            .map(|(pos, (handle, _))| (handle, pos))
            .collect()
    }

    /// Current 0-based position of one line.
    #[must_use]
    pub fn position(&self, handle: LineHandle) -> Option<usize> {
        self.iter().position(|(h, _)| h == handle)
    }

    /// Joins all lines back into text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, (_, text)) in self.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(text);
        }
        if self.trailing_newline && !self.is_empty() {
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Iterator over the live lines of a [`Document`].
pub struct Iter<'a> {
    doc: &'a Document,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (LineHandle, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = &self.doc.nodes[idx];
        self.cursor = node.next;
        Some((LineHandle(idx), node.text.as_str()))
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (LineHandle, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
