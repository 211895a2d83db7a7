// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

#[cfg(test)]
mod tests;

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::{
    node::{emit_node, Node, ParseError},
    template::Section,
};

/// The same key defined twice with different content.
#[derive(Debug, Clone)]
pub struct Conflict {
    /// Dotted path for nested keys, e.g. `MyMapping.test`.
    pub key: String,
    pub first: Node,
    pub second: Node,
}

impl Conflict {
    pub fn new(key: impl Into<String>, first: Node, second: Node) -> Conflict {
        Conflict {
            key: key.into(),
            first,
            second,
        }
    }

    /// Prefixes the key with the name of the enclosing map.
    pub fn nested_under(mut self, outer_key: &str) -> Conflict {
        self.key = format!("{}.{}", outer_key, self.key);
        self
    }
}

/// A conflict tagged with the template section it was found in.
#[derive(Debug, Clone, Error)]
#[error("{} {:?} already exists with a different definition", .section.conflict_noun(), .conflict.key)]
pub struct ConflictError {
    pub section: Section,
    pub conflict: Conflict,
}

/// Wraps a raw conflict into the error for its section.
pub fn classify(section: Section, conflict: Conflict) -> ConflictError {
    ConflictError { section, conflict }
}

impl ConflictError {
    pub fn key(&self) -> &str {
        &self.conflict.key
    }

    /// YAML rendering of the definition already in the accumulated template.
    pub fn first_yaml(&self) -> String {
        emit_node(&self.conflict.first)
    }

    /// YAML rendering of the incoming definition.
    pub fn second_yaml(&self) -> String {
        emit_node(&self.conflict.second)
    }

    /// Full message for the operator, with both definitions laid out for comparison.
    pub fn human_error(&self) -> String {
        let mut out = format!("{}.\n", self);
        push_definition(&mut out, "first definition", &self.first_yaml());
        push_definition(&mut out, "second definition", &self.second_yaml());
        out.push_str(&format!(
            "Make both definitions of {} {:?} identical, or rename one of them.",
            self.section.conflict_noun(),
            self.conflict.key
        ));
        out
    }
}

fn push_definition(out: &mut String, heading: &str, yaml: &str) {
    out.push_str(heading);
    out.push_str(":\n");
    for line in yaml.lines() {
        out.push_str("    ");
        out.push_str(line);
        out.push('\n');
    }
}

/// A template document whose shape the merger cannot work with.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("template root must be a mapping, found a {found}")]
    InvalidRoot { found: &'static str },

    #[error("section {section} must be a mapping, found a {found}")]
    InvalidSection { section: Section, found: &'static str },
}

/// Failures while loading an addons directory.
#[derive(Debug, Error)]
pub enum AddonsError {
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("addons directory {} is missing required files: {}", .dir.display(), .missing.join(", "))]
    MissingFiles { dir: PathBuf, missing: Vec<String> },

    #[error("{}: {source}", .path.display())]
    Template { path: PathBuf, source: TemplateError },

    #[error("{}: {source}", .path.display())]
    Conflict { path: PathBuf, source: Box<ConflictError> },
}
