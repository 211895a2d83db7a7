// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::{collections::HashMap, str::Chars};

use saphyr_parser::{Event, Marker, Parser as YamlParser, ScanError, TScalarStyle, Tag as EventTag};
use thiserror::Error;

use super::{MapEntry, Mapping, Node, Scalar, ScalarStyle, Sequence, Tag};

/// Malformed YAML. Line and column are 1-based when known.
#[derive(Debug, Clone, Error)]
#[error("{}", render_parse_error(.message, .location))]
pub struct ParseError {
    pub message: String,
    pub location: Option<(usize, usize)>,
}

fn render_parse_error(message: &str, location: &Option<(usize, usize)>) -> String {
    match location {
        Some((line, col)) => format!("{}:{} {}", line, col, message),
        None => message.to_string(),
    }
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: None,
        }
    }

    fn at(message: impl Into<String>, mark: &Marker) -> ParseError {
        ParseError {
            message: message.into(),
            location: Some((mark.line(), mark.col() + 1)),
        }
    }
}

impl From<ScanError> for ParseError {
    fn from(err: ScanError) -> Self {
        ParseError::at(err.info().to_string(), err.marker())
    }
}

/// Parses every document of a YAML stream.
pub fn parse_yaml_str(input: &str) -> Result<Vec<Node>, ParseError> {
    let mut run = LoaderRun::new(input);
    run.parse_stream()
}

/// Parses a stream expected to hold at most one document.
pub fn parse_single_doc(input: &str) -> Result<Option<Node>, ParseError> {
    let docs = parse_yaml_str(input)?;
    if docs.len() > 1 {
        return Err(ParseError::new(format!(
            "expected a single yaml document, found {}",
            docs.len()
        )));
    }
    Ok(docs.into_iter().next())
}

// Aliases may add this many nodes per input byte, and never fewer than
// `MIN_ALIAS_BUDGET` in total.
const ALIAS_NODES_PER_BYTE: usize = 100;
const MIN_ALIAS_BUDGET: usize = 10_000;

struct LoaderRun<'a> {
    yaml_parser: YamlParser<Chars<'a>>,
    // Anchor id -> anchored node and its node count. Aliases are expanded into copies.
    anchors: HashMap<usize, (Node, usize)>,
    // Nodes that alias expansion may still add to the stream.
    alias_budget: usize,
}

impl<'a> LoaderRun<'a> {
    fn new(input: &'a str) -> LoaderRun<'a> {
        LoaderRun {
            yaml_parser: YamlParser::new_from_str(input),
            anchors: HashMap::new(),
            alias_budget: input.len().saturating_mul(ALIAS_NODES_PER_BYTE).max(MIN_ALIAS_BUDGET),
        }
    }

    fn parse_stream(&mut self) -> Result<Vec<Node>, ParseError> {
        // Parse StreamStart.
        let (evt_strm_start, mark) = self.yaml_parser.next_token()?;
        if !matches!(evt_strm_start, Event::StreamStart) {
            return Err(ParseError::at("expected start of yaml stream", &mark));
        }

        // Parse docs.
        let mut docs = Vec::new();
        loop {
            let (event, mark) = self.yaml_parser.peek()?;
            match event {
                Event::DocumentStart { .. } => {
                    let doc = self.parse_doc()?;
                    docs.push(doc);
                }
                Event::StreamEnd => break,
                _ => return Err(ParseError::at("expected yaml document", mark)),
            }
        }

        // Parse StreamEnd.
        self.yaml_parser.next_token()?;

        Ok(docs)
    }

    fn parse_doc(&mut self) -> Result<Node, ParseError> {
        // Parse DocumentStart.
        self.yaml_parser.next_token()?;

        // Anchors do not cross document boundaries.
        self.anchors.clear();

        // Parse node.
        let node = self.parse_node()?;

        // Parse DocumentEnd.
        let (doc_end, mark) = self.yaml_parser.next_token()?;
        if !matches!(doc_end, Event::DocumentEnd) {
            return Err(ParseError::at("expected end of yaml document", &mark));
        }

        Ok(node)
    }

    fn parse_node(&mut self) -> Result<Node, ParseError> {
        let (event, mark) = self.yaml_parser.next_token()?;
        match event {
            Event::SequenceStart(anchor_id, tag) => {
                let tag = tag.and_then(|tag| convert_collection_tag(&tag, "seq"));
                let node = self.parse_sequence(tag)?;
                Ok(self.register_anchor(anchor_id, node))
            }
            Event::MappingStart(anchor_id, tag) => {
                let tag = tag.and_then(|tag| convert_collection_tag(&tag, "map"));
                let node = self.parse_mapping(tag)?;
                Ok(self.register_anchor(anchor_id, node))
            }
            Event::Scalar(value, style, anchor_id, tag) => {
                let node = Node::Scalar(convert_scalar(value, style, tag.as_ref()));
                Ok(self.register_anchor(anchor_id, node))
            }
            Event::Alias(anchor_id) => {
                let Some((node, size)) = self.anchors.get(&anchor_id) else {
                    return Err(ParseError::at("alias refers to an unknown anchor", &mark));
                };
                // Checked before copying, so nested aliases cannot blow up memory.
                if *size > self.alias_budget {
                    return Err(ParseError::at("document contains excessive aliasing", &mark));
                }
                self.alias_budget -= *size;
                Ok(node.clone())
            }
            _ => Err(ParseError::at("expected yaml node", &mark)),
        }
    }

    fn parse_sequence(&mut self, tag: Option<Tag>) -> Result<Node, ParseError> {
        // Parse nodes.
        let mut items = Vec::new();
        loop {
            let (event, _) = self.yaml_parser.peek()?;
            if matches!(event, Event::SequenceEnd) {
                break;
            }
            let item = self.parse_node()?;
            items.push(item);
        }

        // Parse SequenceEnd.
        self.yaml_parser.next_token()?;

        Ok(Node::Sequence(Sequence { tag, items }))
    }

    fn parse_mapping(&mut self, tag: Option<Tag>) -> Result<Node, ParseError> {
        // Parse entries.
        let mut mapping = Mapping::with_tag(tag);
        loop {
            let (event, mark) = self.yaml_parser.peek()?;
            if matches!(event, Event::MappingEnd) {
                break;
            }
            let mark = mark.clone();

            let key = self.parse_node()?;
            let value = self.parse_node()?;

            if let Err(entry) = mapping.try_insert(MapEntry { key, value }) {
                return Err(ParseError::at(
                    format!("duplicate mapping key {:?}", entry.key.key_string()),
                    &mark,
                ));
            }
        }

        // Parse MappingEnd.
        self.yaml_parser.next_token()?;

        Ok(Node::Mapping(mapping))
    }

    fn register_anchor(&mut self, anchor_id: usize, node: Node) -> Node {
        // Id 0 means the node carries no anchor.
        if anchor_id > 0 {
            self.anchors.insert(anchor_id, (node.clone(), node_count(&node)));
        }
        node
    }
}

fn convert_scalar(value: String, style: TScalarStyle, tag: Option<&EventTag>) -> Scalar {
    let style = match style {
        TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        TScalarStyle::Literal => ScalarStyle::Literal,
        TScalarStyle::Folded => ScalarStyle::Folded,
        _ => ScalarStyle::Plain,
    };

    let tag = match (tag, style) {
        (Some(tag), _) => convert_tag(tag),
        (None, ScalarStyle::Plain) => Tag::resolve_plain(&value),
        (None, _) => Tag::Str,
    };

    Scalar { tag, value, style }
}

fn convert_tag(tag: &EventTag) -> Tag {
    if let Some(core_tag) = core_suffix(tag).and_then(Tag::from_core_suffix) {
        return core_tag;
    }

    Tag::Custom(format!("{}{}", tag.handle, tag.suffix))
}

// `!!map` and `!!seq` are what an untagged collection resolves to anyway.
fn convert_collection_tag(tag: &EventTag, implicit_suffix: &str) -> Option<Tag> {
    if core_suffix(tag) == Some(implicit_suffix) {
        return None;
    }
    Some(convert_tag(tag))
}

// `!!str` may arrive with the secondary handle either unexpanded or already
// resolved to the core-schema prefix.
fn core_suffix(tag: &EventTag) -> Option<&str> {
    match tag.handle.as_str() {
        "!!" | "tag:yaml.org,2002:" => Some(tag.suffix.as_str()),
        "" => tag.suffix.strip_prefix("tag:yaml.org,2002:"),
        _ => None,
    }
}

fn node_count(node: &Node) -> usize {
    match node {
        Node::Scalar(_) => 1,
        Node::Sequence(seq) => 1 + seq.items.iter().map(node_count).sum::<usize>(),
        Node::Mapping(mapping) => {
            1 + mapping
                .entries()
                .map(|entry| node_count(&entry.key) + node_count(&entry.value))
                .sum::<usize>()
        }
    }
}
