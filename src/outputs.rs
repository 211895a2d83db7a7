// Copyright (c) Chris Gunn.
// Licensed under the MIT license.


use std::collections::HashSet;

use tracing::debug;

use crate::node::{parse_single_doc, Mapping, Node, ParseError, Scalar, Sequence, Tag};

const SECRET_TYPE: &str = "AWS::SecretsManager::Secret";
const MANAGED_POLICY_TYPE: &str = "AWS::IAM::ManagedPolicy";

/// One entry of a template's `Outputs` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDescriptor {
    pub name: String,
    pub is_secret: bool,
    pub is_managed_policy: bool,
}

/// How `Ref` intrinsics are evaluated when a template is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrinsicMode {
    /// `Ref` evaluates to the referenced logical id. Needed to tell which
    /// resource an output points at.
    RetainLogicalIds,
    /// `Ref` evaluates to null, as nothing is known about deployed values.
    Deployment,
}

/// Parses a rendered template and evaluates its `Ref` intrinsics. Other
/// intrinsics are kept as written.
pub fn parse_template(input: &str, mode: IntrinsicMode) -> Result<Option<Node>, ParseError> {
    let doc = parse_single_doc(input)?;
    Ok(doc.map(|doc| resolve_refs(doc, mode)))
}

/// Reports, for every output, whether its value refers to a Secrets Manager
/// secret or an IAM managed policy declared in the same template.
///
/// Outputs come back in template order.
pub fn classify_outputs(input: &str) -> Result<Vec<OutputDescriptor>, ParseError> {
    let Some(doc) = parse_template(input, IntrinsicMode::RetainLogicalIds)? else {
        return Ok(Vec::new());
    };
    let root = match doc {
        Node::Mapping(root) => root,
        other => {
            return Err(ParseError::new(format!(
                "template root must be a mapping, found a {}",
                other.kind_name()
            )))
        }
    };

    let secrets = resource_ids_of_type(&root, SECRET_TYPE);
    let policies = resource_ids_of_type(&root, MANAGED_POLICY_TYPE);

    let Some(outputs) = root.get("Outputs").and_then(Node::as_mapping) else {
        return Ok(Vec::new());
    };

    let descriptors = outputs
        .iter()
        .map(|(name, output)| {
            // Anything other than a plain logical id is neither.
            let value = output
                .as_mapping()
                .and_then(|output| output.get("Value"))
                .and_then(Node::as_str);
            let descriptor = OutputDescriptor {
                name: name.to_string(),
                is_secret: value.is_some_and(|value| secrets.contains(value)),
                is_managed_policy: value.is_some_and(|value| policies.contains(value)),
            };
            debug!(
                output = %descriptor.name,
                secret = descriptor.is_secret,
                managed_policy = descriptor.is_managed_policy,
                "classified output"
            );
            descriptor
        })
        .collect();
    Ok(descriptors)
}

fn resource_ids_of_type<'a>(root: &'a Mapping, resource_type: &str) -> HashSet<&'a str> {
    let Some(resources) = root.get("Resources").and_then(Node::as_mapping) else {
        return HashSet::new();
    };

    resources
        .iter()
        .filter(|(_, resource)| {
            resource
                .as_mapping()
                .and_then(|resource| resource.get("Type"))
                .and_then(Node::as_str)
                == Some(resource_type)
        })
        .map(|(id, _)| id)
        .collect()
}

fn resolve_refs(node: Node, mode: IntrinsicMode) -> Node {
    match node {
        Node::Scalar(scalar) if is_ref_tag(&scalar.tag) => evaluate_ref(scalar.value, mode),
        Node::Scalar(scalar) => Node::Scalar(scalar),
        Node::Sequence(seq) => Node::Sequence(Sequence {
            tag: seq.tag,
            items: seq.items.into_iter().map(|item| resolve_refs(item, mode)).collect(),
        }),
        Node::Mapping(mapping) => {
            // Long form: `{Ref: LogicalId}`.
            if mapping.len() == 1 {
                if let Some(Node::Scalar(target)) = mapping.get("Ref") {
                    return evaluate_ref(target.value.clone(), mode);
                }
            }

            let mut resolved = Mapping::with_tag(mapping.tag.clone());
            for (_, entry) in mapping {
                resolved.insert(entry.key, resolve_refs(entry.value, mode));
            }
            Node::Mapping(resolved)
        }
    }
}

fn is_ref_tag(tag: &Tag) -> bool {
    matches!(tag, Tag::Custom(tag) if tag == "!Ref")
}

fn evaluate_ref(logical_id: String, mode: IntrinsicMode) -> Node {
    match mode {
        IntrinsicMode::RetainLogicalIds => Node::Scalar(Scalar::new(Tag::Str, logical_id)),
        IntrinsicMode::Deployment => Node::null(),
    }
}
