// Copyright (c) Chris Gunn.
// Licensed under the MIT license.


use std::fmt;

use crate::{
    error::TemplateError,
    node::{emit_node, parse_single_doc, Mapping, Node, Tag},
};

/// Top-level template sections the merger combines, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Metadata,
    Parameters,
    Mappings,
    Conditions,
}

impl Section {
    pub const ALL: [Section; 4] = [Section::Metadata, Section::Parameters, Section::Mappings, Section::Conditions];

    /// Name of the section in a CloudFormation template.
    pub fn key(self) -> &'static str {
        match self {
            Section::Metadata => "Metadata",
            Section::Parameters => "Parameters",
            Section::Mappings => "Mappings",
            Section::Conditions => "Conditions",
        }
    }

    pub(crate) fn conflict_noun(self) -> &'static str {
        match self {
            Section::Metadata => "metadata key",
            Section::Parameters => "parameter logical id",
            Section::Mappings => "mapping",
            Section::Conditions => "condition",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The mergeable sections of one addon template. `None` means the section is
/// absent, which is not the same as an empty mapping.
#[derive(Debug, Clone, Default)]
pub struct TemplateFragment {
    pub metadata: Option<Mapping>,
    pub parameters: Option<Mapping>,
    pub mappings: Option<Mapping>,
    pub conditions: Option<Mapping>,
}

impl TemplateFragment {
    pub fn parse(input: &str) -> Result<TemplateFragment, TemplateError> {
        match parse_single_doc(input)? {
            Some(doc) => TemplateFragment::from_node(doc),
            None => Ok(TemplateFragment::default()),
        }
    }

    /// Picks the mergeable sections out of a template document. Other top-level
    /// keys are not the merger's concern and are dropped.
    pub fn from_node(doc: Node) -> Result<TemplateFragment, TemplateError> {
        let mut root = match doc {
            Node::Mapping(root) => root,
            Node::Scalar(scalar) if scalar.tag == Tag::Null => return Ok(TemplateFragment::default()),
            other => return Err(TemplateError::InvalidRoot { found: other.kind_name() }),
        };

        let mut fragment = TemplateFragment::default();
        for section in Section::ALL {
            let Some(entry) = root.remove(section.key()) else {
                continue;
            };
            let mapping = match entry.value {
                Node::Mapping(mapping) => mapping,
                // `Conditions:` with nothing under it.
                Node::Scalar(scalar) if scalar.tag == Tag::Null => Mapping::new(),
                other => {
                    return Err(TemplateError::InvalidSection {
                        section,
                        found: other.kind_name(),
                    })
                }
            };
            *fragment.section_mut(section) = Some(mapping);
        }

        Ok(fragment)
    }

    pub fn section(&self, section: Section) -> Option<&Mapping> {
        match section {
            Section::Metadata => self.metadata.as_ref(),
            Section::Parameters => self.parameters.as_ref(),
            Section::Mappings => self.mappings.as_ref(),
            Section::Conditions => self.conditions.as_ref(),
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut Option<Mapping> {
        match section {
            Section::Metadata => &mut self.metadata,
            Section::Parameters => &mut self.parameters,
            Section::Mappings => &mut self.mappings,
            Section::Conditions => &mut self.conditions,
        }
    }

    pub fn take_section(&mut self, section: Section) -> Option<Mapping> {
        self.section_mut(section).take()
    }

    pub fn is_empty(&self) -> bool {
        Section::ALL.iter().all(|section| self.section(*section).is_none())
    }

    /// Rebuilds a template document holding the present sections in merge order.
    pub fn to_node(&self) -> Node {
        let mut root = Mapping::new();
        for section in Section::ALL {
            if let Some(mapping) = self.section(section) {
                root.insert(Node::string(section.key()), Node::Mapping(mapping.clone()));
            }
        }
        Node::Mapping(root)
    }

    pub fn emit(&self) -> String {
        emit_node(&self.to_node())
    }
}
