// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use super::{Mapping, Node, Scalar, ScalarStyle, Sequence, Tag};

const INDENT: usize = 2;

/// Renders a node as a block-style YAML document.
pub fn emit_node(node: &Node) -> String {
    let mut out = String::new();
    match node {
        Node::Scalar(scalar) => {
            out.push_str(&render_scalar(scalar, false));
            out.push('\n');
        }
        _ if is_empty_collection(node) => {
            out.push_str(&emit_flow(node));
            out.push('\n');
        }
        Node::Sequence(seq) => {
            push_tag_line(&mut out, seq.tag.as_ref());
            emit_sequence(seq, 0, &mut out);
        }
        Node::Mapping(mapping) => {
            push_tag_line(&mut out, mapping.tag.as_ref());
            emit_mapping(mapping, 0, &mut out);
        }
    }
    out
}

/// Renders a stream of documents separated by `---` markers.
pub fn emit_docs(docs: &[Node]) -> String {
    let mut out = String::new();
    for (index, doc) in docs.iter().enumerate() {
        if index > 0 {
            out.push_str("---\n");
        }
        out.push_str(&emit_node(doc));
    }
    out
}

/// Single-line flow rendering, used for collection keys and empty collections.
pub(super) fn emit_flow(node: &Node) -> String {
    let (tag, body) = match node {
        Node::Scalar(scalar) => return render_scalar(scalar, true),
        Node::Sequence(seq) => {
            let items: Vec<String> = seq.items.iter().map(emit_flow).collect();
            (seq.tag.as_ref(), format!("[{}]", items.join(", ")))
        }
        Node::Mapping(mapping) => {
            let entries: Vec<String> = mapping
                .entries()
                .map(|entry| format!("{}: {}", emit_flow(&entry.key), emit_flow(&entry.value)))
                .collect();
            (mapping.tag.as_ref(), format!("{{{}}}", entries.join(", ")))
        }
    };

    match tag {
        Some(tag) => format!("{} {}", tag, body),
        None => body,
    }
}

fn emit_mapping(mapping: &Mapping, indent: usize, out: &mut String) {
    for entry in mapping.entries() {
        push_indent(out, indent);
        out.push_str(&render_key(&entry.key));
        out.push(':');
        emit_child(&entry.value, indent, out);
    }
}

fn emit_sequence(seq: &Sequence, indent: usize, out: &mut String) {
    for item in &seq.items {
        let untagged_collection = match item {
            Node::Sequence(Sequence { tag: None, .. }) | Node::Mapping(Mapping { tag: None, .. }) => {
                !is_empty_collection(item)
            }
            _ => false,
        };

        if untagged_collection {
            // Render the child one level deeper, then fold the dash into its first line.
            let mut child = String::new();
            match item {
                Node::Sequence(child_seq) => emit_sequence(child_seq, indent + INDENT, &mut child),
                Node::Mapping(child_map) => emit_mapping(child_map, indent + INDENT, &mut child),
                Node::Scalar(_) => {}
            }
            push_indent(out, indent);
            out.push_str("- ");
            out.push_str(child.get(indent + INDENT..).unwrap_or_default());
            continue;
        }

        push_indent(out, indent);
        out.push('-');
        emit_child(item, indent, out);
    }
}

// Writes a value that follows `key:` or `-` on the current line.
fn emit_child(node: &Node, indent: usize, out: &mut String) {
    match node {
        Node::Scalar(scalar) => emit_scalar_value(scalar, indent, out),
        _ if is_empty_collection(node) => {
            out.push(' ');
            out.push_str(&emit_flow(node));
            out.push('\n');
        }
        Node::Sequence(seq) => {
            push_inline_tag(out, seq.tag.as_ref());
            out.push('\n');
            emit_sequence(seq, indent + INDENT, out);
        }
        Node::Mapping(mapping) => {
            push_inline_tag(out, mapping.tag.as_ref());
            out.push('\n');
            emit_mapping(mapping, indent + INDENT, out);
        }
    }
}

fn emit_scalar_value(scalar: &Scalar, indent: usize, out: &mut String) {
    // `Foo:` with nothing after it.
    if scalar.tag == Tag::Null && scalar.value.is_empty() {
        out.push('\n');
        return;
    }

    if !can_use_literal_block(scalar) {
        out.push(' ');
        out.push_str(&render_scalar(scalar, false));
        out.push('\n');
        return;
    }

    if let Tag::Custom(tag) = &scalar.tag {
        out.push(' ');
        out.push_str(tag);
    }

    let value = scalar.value.as_str();
    let (chomp, body) = if value.ends_with("\n\n") {
        ("+", value.strip_suffix('\n').unwrap_or(value))
    } else if let Some(body) = value.strip_suffix('\n') {
        ("", body)
    } else {
        ("-", value)
    };

    out.push_str(&format!(" |{}\n", chomp));
    for line in body.split('\n') {
        if !line.is_empty() {
            push_indent(out, indent + INDENT);
            out.push_str(line);
        }
        out.push('\n');
    }
}

fn can_use_literal_block(scalar: &Scalar) -> bool {
    matches!(scalar.style, ScalarStyle::Literal | ScalarStyle::Folded)
        && matches!(scalar.tag, Tag::Str | Tag::Custom(_))
        && scalar.value.contains('\n')
        && !scalar.value.starts_with([' ', '\n'])
        && !scalar.value.chars().any(|c| c.is_control() && c != '\n')
}

fn render_key(key: &Node) -> String {
    match key {
        Node::Scalar(scalar) => render_scalar(scalar, false),
        _ => emit_flow(key),
    }
}

fn render_scalar(scalar: &Scalar, flow: bool) -> String {
    let value = scalar.value.as_str();
    match &scalar.tag {
        Tag::Str => render_string(value, scalar.style, flow, true),
        Tag::Custom(tag) => format!("{} {}", tag, render_string(value, scalar.style, flow, false)),
        Tag::Null | Tag::Bool | Tag::Int | Tag::Float => {
            if is_plain_safe(value, flow) && Tag::resolve_plain(value) == scalar.tag {
                value.to_string()
            } else {
                format!("{} {}", scalar.tag, double_quote(value))
            }
        }
    }
}

// `resolves_as_str` requires the plain form to read back as a string, which
// does not matter when an explicit tag precedes the value.
fn render_string(value: &str, style: ScalarStyle, flow: bool, resolves_as_str: bool) -> String {
    let needs_double = value.chars().any(char::is_control);
    match style {
        ScalarStyle::DoubleQuoted => double_quote(value),
        _ if needs_double => double_quote(value),
        ScalarStyle::SingleQuoted => single_quote(value),
        _ => {
            let plain_ok = is_plain_safe(value, flow) && (!resolves_as_str || Tag::resolve_plain(value) == Tag::Str);
            if plain_ok {
                value.to_string()
            } else {
                single_quote(value)
            }
        }
    }
}

fn is_plain_safe(value: &str, flow: bool) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };

    if value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace) {
        return false;
    }

    let second_is_space = value.chars().nth(1).map_or(true, char::is_whitespace);
    match first {
        '-' | '?' | ':' if second_is_space => return false,
        ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%' | '@' | '`' => {
            return false
        }
        _ => {}
    }

    if value.contains(": ") || value.contains(" #") || value.ends_with(':') {
        return false;
    }

    if flow && value.contains([',', '[', ']', '{', '}']) {
        return false;
    }

    !value.chars().any(char::is_control)
}

fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn double_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn is_empty_collection(node: &Node) -> bool {
    match node {
        Node::Sequence(seq) => seq.items.is_empty(),
        Node::Mapping(mapping) => mapping.is_empty(),
        Node::Scalar(_) => false,
    }
}

fn push_indent(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat(' ').take(indent));
}

fn push_tag_line(out: &mut String, tag: Option<&Tag>) {
    if let Some(tag) = tag {
        out.push_str(&format!("{}\n", tag));
    }
}

fn push_inline_tag(out: &mut String, tag: Option<&Tag>) {
    if let Some(tag) = tag {
        out.push_str(&format!(" {}", tag));
    }
}
