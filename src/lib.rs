// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

//! Merges CloudFormation addon template fragments and classifies template outputs.

pub mod addons;
pub mod error;
pub mod merge;
pub mod node;
pub mod outputs;
pub mod template;

pub use error::{classify, AddonsError, Conflict, ConflictError, TemplateError};
pub use merge::{merge, merge_all, MergeFailure, MergeSession};
pub use node::{Node, ParseError};
pub use outputs::{classify_outputs, IntrinsicMode, OutputDescriptor};
pub use template::{Section, TemplateFragment};
