// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Key paths and the depth-first key path collector
//
// A key path addresses one object key reachable from the document root.
// Objects nested inside arrays are addressed through an indexed segment
// (`orders[2]`), so `data.orders[2].total` names the `total` key of the
// third order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{map, Value};
use std::borrow::Cow;
use std::fmt;
use std::iter::Enumerate;
use std::slice;

static ARRAY_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d+\]").expect("array index pattern is valid"));

static SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<key>[^\[\]]*)(?:\[(?P<index>\d+)\])?$").expect("segment pattern is valid")
});

/// Remove every `[<digits>]` annotation from a rendered path or segment.
///
/// Idempotent: the output never contains an index annotation, including ones
/// formed by a removal (`a[[1]2]` -> `a`).
pub fn canonicalize(input: &str) -> Cow<'_, str> {
    let mut canonical = ARRAY_INDEX.replace_all(input, "");
    while ARRAY_INDEX.is_match(&canonical) {
        let next = ARRAY_INDEX.replace_all(&canonical, "").into_owned();
        canonical = Cow::Owned(next);
    }
    canonical
}

/// One step of a key path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object key: `name`
    Field(String),
    /// Object inside the array stored under `name`: `name[index]`
    Element(String, usize),
    /// Object inside a root-level array: `[index]`
    Index(usize),
}

impl Segment {
    /// The segment's key with every `[<digits>]` removed, including any
    /// that are part of the key text itself (`ssn[0]` -> `ssn`).
    pub fn canonical(&self) -> Cow<'_, str> {
        match self {
            Segment::Field(key) | Segment::Element(key, _) => canonicalize(key),
            Segment::Index(_) => Cow::Borrowed(""),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(key) => f.write_str(key),
            Segment::Element(key, index) => write!(f, "{}[{}]", key, index),
            Segment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Address of one object key in a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<Segment>,
}

impl KeyPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a rendered path such as `data.orders[2].total`.
    ///
    /// Keys containing `.`, `[` or `]` cannot be expressed in this form.
    pub fn parse(rendered: &str) -> Option<Self> {
        if rendered.is_empty() {
            return Some(Self::new());
        }

        let mut segments = Vec::new();
        for (position, part) in rendered.split('.').enumerate() {
            let caps = SEGMENT.captures(part)?;
            let key = caps.name("key").map_or("", |m| m.as_str());
            let index = match caps.name("index") {
                Some(m) => Some(m.as_str().parse::<usize>().ok()?),
                None => None,
            };
            let segment = match (key.is_empty(), index) {
                (true, Some(index)) if position == 0 => Segment::Index(index),
                (true, _) => return None,
                (false, Some(index)) => Segment::Element(key.to_string(), index),
                (false, None) => Segment::Field(key.to_string()),
            };
            segments.push(segment);
        }
        Some(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Terminal segment (the key this path addresses)
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Segment immediately above the terminal one
    pub fn parent(&self) -> Option<&Segment> {
        self.segments.iter().rev().nth(1)
    }

    /// A new path extended by one segment
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    /// Rendered path with all array indices removed
    pub fn canonical(&self) -> String {
        canonicalize(&self.to_string()).into_owned()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

enum Frame<'a> {
    Object {
        prefix: KeyPath,
        entries: map::Iter<'a>,
    },
    Array {
        prefix: KeyPath,
        key: Option<&'a str>,
        items: Enumerate<slice::Iter<'a, Value>>,
    },
}

enum Step<'a> {
    Pop,
    Emit(KeyPath, Option<Frame<'a>>),
    Descend(Frame<'a>),
}

/// Lazy depth-first, pre-order walk over every key path of a document.
///
/// Produced by [`collect_paths`]. Scalars and arrays of scalars contribute
/// nothing beyond the key that holds them.
pub struct KeyPaths<'a> {
    stack: Vec<Frame<'a>>,
}

impl<'a> Iterator for KeyPaths<'a> {
    type Item = KeyPath;

    fn next(&mut self) -> Option<KeyPath> {
        loop {
            let step = match self.stack.last_mut()? {
                Frame::Object { prefix, entries } => match entries.next() {
                    None => Step::Pop,
                    Some((key, value)) => {
                        let path = prefix.child(Segment::Field(key.clone()));
                        let nested = match value {
                            Value::Object(fields) => Some(Frame::Object {
                                prefix: path.clone(),
                                entries: fields.iter(),
                            }),
                            Value::Array(items) => Some(Frame::Array {
                                prefix: prefix.clone(),
                                key: Some(key.as_str()),
                                items: items.iter().enumerate(),
                            }),
                            Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => {
                                None
                            }
                        };
                        Step::Emit(path, nested)
                    }
                },
                Frame::Array { prefix, key, items } => {
                    match items.find_map(|(i, item)| item.as_object().map(|obj| (i, obj))) {
                        None => Step::Pop,
                        Some((index, obj)) => {
                            let segment = match key {
                                Some(key) => Segment::Element(key.to_string(), index),
                                None => Segment::Index(index),
                            };
                            Step::Descend(Frame::Object {
                                prefix: prefix.child(segment),
                                entries: obj.iter(),
                            })
                        }
                    }
                }
            };

            match step {
                Step::Pop => {
                    self.stack.pop();
                }
                Step::Descend(frame) => self.stack.push(frame),
                Step::Emit(path, nested) => {
                    if let Some(frame) = nested {
                        self.stack.push(frame);
                    }
                    return Some(path);
                }
            }
        }
    }
}

/// Enumerate every key path reachable from `document`.
pub fn collect_paths(document: &Value) -> KeyPaths<'_> {
    let root = match document {
        Value::Object(fields) => Some(Frame::Object {
            prefix: KeyPath::new(),
            entries: fields.iter(),
        }),
        Value::Array(items) => Some(Frame::Array {
            prefix: KeyPath::new(),
            key: None,
            items: items.iter().enumerate(),
        }),
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => None,
    };
    KeyPaths {
        stack: root.into_iter().collect(),
    }
}
