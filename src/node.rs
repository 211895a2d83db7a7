// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

// Owned YAML document tree used by the template merger.

mod emitter;
mod loader;


use std::fmt;

use hashlink::LinkedHashMap;

pub use emitter::{emit_docs, emit_node};
pub use loader::{parse_single_doc, parse_yaml_str, ParseError};

#[derive(Clone, Debug)]
pub enum Node {
    Scalar(Scalar),
    Sequence(Sequence),
    Mapping(Mapping),
}

/// Resolved type tag of a node.
///
/// Untagged plain scalars get one of the core-schema tags. Anything written with a
/// local tag (`!Ref`, `!Sub`, ...) is kept verbatim as `Custom`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Custom(String),
}

/// How a scalar was written in the source document. Presentation only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

#[derive(Clone, Debug)]
pub struct Scalar {
    pub tag: Tag,
    pub value: String,
    pub style: ScalarStyle,
}

#[derive(Clone, Debug, Default)]
pub struct Sequence {
    pub tag: Option<Tag>,
    pub items: Vec<Node>,
}

/// Ordered mapping whose entries are unique by the string form of their key.
#[derive(Clone, Debug, Default)]
pub struct Mapping {
    pub tag: Option<Tag>,
    entries: LinkedHashMap<String, MapEntry>,
}

#[derive(Clone, Debug)]
pub struct MapEntry {
    pub key: Node,
    pub value: Node,
}

impl Node {
    /// Plain string scalar.
    pub fn string(value: impl Into<String>) -> Node {
        Node::Scalar(Scalar::new(Tag::Str, value))
    }

    pub fn null() -> Node {
        Node::Scalar(Scalar::new(Tag::Null, "null"))
    }

    /// Structural equality that ignores presentation: quoting style, comments,
    /// anchors and source positions never make two nodes differ.
    pub fn is_equal(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Scalar(left), Node::Scalar(right)) => left.tag == right.tag && left.value == right.value,
            (Node::Sequence(left), Node::Sequence(right)) => {
                left.tag == right.tag
                    && left.items.len() == right.items.len()
                    && left.items.iter().zip(&right.items).all(|(l, r)| l.is_equal(r))
            }
            (Node::Mapping(left), Node::Mapping(right)) => {
                left.tag == right.tag
                    && left.len() == right.len()
                    && left
                        .entries()
                        .zip(right.entries())
                        .all(|(l, r)| l.key.is_equal(&r.key) && l.value.is_equal(&r.value))
            }
            _ => false,
        }
    }

    /// String used to identify this node when it is a mapping key.
    pub fn key_string(&self) -> String {
        match self {
            Node::Scalar(scalar) => scalar.value.clone(),
            Node::Sequence(_) | Node::Mapping(_) => emitter::emit_flow(self),
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// The value of a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar { tag: Tag::Str, value, .. }) => Some(value),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Scalar(_) => "scalar",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Node::Scalar(scalar)
    }
}

impl From<Sequence> for Node {
    fn from(sequence: Sequence) -> Self {
        Node::Sequence(sequence)
    }
}

impl From<Mapping> for Node {
    fn from(mapping: Mapping) -> Self {
        Node::Mapping(mapping)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&emit_node(self))
    }
}

impl Tag {
    /// Tag for an untagged plain scalar, following the YAML 1.2 core schema.
    pub fn resolve_plain(value: &str) -> Tag {
        if value.is_empty() {
            return Tag::Null;
        }
        match saphyr::Yaml::from_str(value) {
            saphyr::Yaml::Null => Tag::Null,
            saphyr::Yaml::Boolean(_) => Tag::Bool,
            saphyr::Yaml::Integer(_) => Tag::Int,
            saphyr::Yaml::Real(_) => Tag::Float,
            _ => Tag::Str,
        }
    }

    /// Maps a core-schema tag suffix (`str` in `!!str`) to its tag.
    pub fn from_core_suffix(suffix: &str) -> Option<Tag> {
        match suffix {
            "null" => Some(Tag::Null),
            "bool" => Some(Tag::Bool),
            "int" => Some(Tag::Int),
            "float" => Some(Tag::Float),
            "str" => Some(Tag::Str),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Null => f.write_str("!!null"),
            Tag::Bool => f.write_str("!!bool"),
            Tag::Int => f.write_str("!!int"),
            Tag::Float => f.write_str("!!float"),
            Tag::Str => f.write_str("!!str"),
            Tag::Custom(tag) => f.write_str(tag),
        }
    }
}

impl Scalar {
    pub fn new(tag: Tag, value: impl Into<String>) -> Scalar {
        Scalar {
            tag,
            value: value.into(),
            style: ScalarStyle::Plain,
        }
    }
}

impl Sequence {
    pub fn new(items: Vec<Node>) -> Sequence {
        Sequence { tag: None, items }
    }
}

impl Mapping {
    pub fn new() -> Mapping {
        Mapping::default()
    }

    pub fn with_tag(tag: Option<Tag>) -> Mapping {
        Mapping {
            tag,
            entries: LinkedHashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries.get_mut(key).map(|entry| &mut entry.value)
    }

    /// Appends an entry, or replaces the value of an existing key in place.
    /// Returns the replaced entry.
    pub fn insert(&mut self, key: Node, value: Node) -> Option<MapEntry> {
        let key_string = key.key_string();
        match self.entries.get_mut(&key_string) {
            Some(entry) => Some(std::mem::replace(entry, MapEntry { key, value })),
            None => {
                self.entries.insert(key_string, MapEntry { key, value });
                None
            }
        }
    }

    /// Appends a new entry, handing it back if the key is already taken.
    pub fn try_insert(&mut self, entry: MapEntry) -> Result<(), MapEntry> {
        let key_string = entry.key.key_string();
        if self.entries.contains_key(&key_string) {
            return Err(entry);
        }
        self.entries.insert(key_string, entry);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<MapEntry> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &MapEntry> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), &entry.value))
    }
}

impl IntoIterator for Mapping {
    type Item = (String, MapEntry);
    type IntoIter = hashlink::linked_hash_map::IntoIter<String, MapEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
