//! Parser for the controller tool's indented text output.
//!
//! The tool prints nested blocks where a line followed by a deeper-indented
//! line opens a block named after the whole line, and every other line is a
//! `key: value` pair (or a bare key). For example:
//!
//! ```text
//! Smart Array P420i in Slot 0
//!    Slot: 0
//!    Array: A
//!       Status: OK
//! ```
//!
//! becomes a block `Smart Array P420i in Slot 0` holding the value `Slot`
//! and a nested block `Array: A`.

use crate::SmartArrayError;

/// One entry of a [`Block`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A `key: value` line; bare keys carry `None`.
    Value(Option<String>),
    /// A nested block.
    Block(Block),
}

/// Ordered set of uniquely-keyed entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    entries: Vec<(String, Node)>,
}

impl Block {
    /// Entry stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, node)| node)
    }

    /// Nested block stored under `key`.
    #[must_use]
    pub fn block(&self, key: &str) -> Option<&Block> {
        match self.get(key) {
            Some(Node::Block(block)) => Some(block),
            _ => None,
        }
    }

    /// Text value stored under `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Node::Value(Some(value))) => Some(value),
            _ => None,
        }
    }

    /// Text value stored under `key`, which the caller cannot do without.
    ///
    /// # Errors
    ///
    /// [`SmartArrayError::MissingKey`] naming `context`.
    pub fn require(&self, key: &str, context: &str) -> Result<&str, SmartArrayError> {
        self.value(key)
            .ok_or_else(|| SmartArrayError::missing(key, context))
    }

    /// Nested blocks in output order.
    pub fn blocks(&self) -> impl Iterator<Item = (&str, &Block)> {
        self.entries.iter().filter_map(|(name, node)| match node {
            Node::Block(block) => Some((name.as_str(), block)),
            Node::Value(_) => None,
        })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the block is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: String, node: Node, line: usize) -> Result<(), SmartArrayError> {
        if self.get(&key).is_some() {
            return Err(SmartArrayError::DuplicateKey { key, line });
        }
        self.entries.push((key, node));
        Ok(())
    }
}

// A block still receiving lines.
struct Open {
    key: String,
    line: usize,
    indent: usize,
    block: Block,
}

fn indent_of(line: &str) -> usize {
    line.len().saturating_sub(line.trim_start().len())
}

fn is_noise(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || line.starts_with("Note:")
        || trimmed == "Physical Drives"
        || trimmed == "None attached"
}

/// Parses tool output into its top-level block.
///
/// Blank lines, `Note:` banners, `Physical Drives` headings and
/// `None attached` placeholders are skipped.
///
/// # Errors
///
/// [`SmartArrayError::DuplicateKey`] when a key repeats under one parent and
/// [`SmartArrayError::Indentation`] when a line returns to a depth that no
/// enclosing block uses.
pub fn parse(output: &str) -> Result<Block, SmartArrayError> {
    let lines: Vec<&str> = output.lines().filter(|line| !is_noise(line)).collect();
    let root_indent = lines.iter().map(|line| indent_of(line)).min().unwrap_or(0);
    let mut stack = vec![Open {
        key: String::new(),
        line: 0,
        indent: root_indent,
        block: Block::default(),
    }];

    for (index, text) in lines.iter().enumerate() {
        let number = index.saturating_add(1);
        let indent = indent_of(text);
        close_deeper(&mut stack, indent)?;
        if stack.last().is_none_or(|open| open.indent != indent) {
            return Err(SmartArrayError::Indentation {
                line: number,
                text: (*text).to_owned(),
            });
        }

        let content = text.trim();
        let next_indent = lines.get(number).map_or(0, |next| indent_of(next));
        if next_indent > indent {
            if stack
                .last()
                .is_some_and(|open| open.block.get(content).is_some())
            {
                return Err(SmartArrayError::DuplicateKey {
                    key: content.to_owned(),
                    line: number,
                });
            }
            stack.push(Open {
                key: content.to_owned(),
                line: number,
                indent: next_indent,
                block: Block::default(),
            });
            continue;
        }

        let (key, value) = match content.split_once(": ") {
            Some((key, value)) => (key.trim_end(), Some(value.trim().to_owned())),
            None => (content, None),
        };
        if let Some(open) = stack.last_mut() {
            open.block.insert(key.to_owned(), Node::Value(value), number)?;
        }
    }

    close_deeper(&mut stack, root_indent)?;
    Ok(stack.pop().map(|root| root.block).unwrap_or_default())
}

// Folds every open block deeper than `indent` into its parent.
fn close_deeper(stack: &mut Vec<Open>, indent: usize) -> Result<(), SmartArrayError> {
    while stack.len() > 1 && stack.last().is_some_and(|open| open.indent > indent) {
        let Some(done) = stack.pop() else {
            break;
        };
        if let Some(parent) = stack.last_mut() {
            parent
                .block
                .insert(done.key, Node::Block(done.block), done.line)?;
        }
    }
    Ok(())
}
