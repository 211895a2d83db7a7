// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

// Combines the Metadata, Parameters, Mappings and Conditions sections of addon
// template fragments. Identical duplicate definitions are reconciled; differing
// ones are reported as conflicts and never resolved automatically.

#[cfg(test)]
mod tests;

use tracing::{debug, trace};

use crate::{
    error::{classify, Conflict, ConflictError},
    node::{Mapping, Node},
    template::{Section, TemplateFragment},
};

/// Accumulated template that fragments are folded into, one call per fragment.
#[derive(Debug, Clone, Default)]
pub struct MergeSession {
    template: TemplateFragment,
}

/// A merge call that stopped at a conflict.
///
/// Sections are merged in a fixed order and earlier ones are not rolled back, so
/// the partial template keeps every section listed in `merged`. The section named
/// by the error is left half-merged.
#[derive(Debug)]
pub struct MergeFailure {
    partial: TemplateFragment,
    merged: Vec<Section>,
    error: ConflictError,
}

impl MergeSession {
    pub fn new(template: TemplateFragment) -> MergeSession {
        MergeSession { template }
    }

    pub fn template(&self) -> &TemplateFragment {
        &self.template
    }

    pub fn into_template(self) -> TemplateFragment {
        self.template
    }

    pub fn merge(mut self, mut fragment: TemplateFragment) -> Result<MergeSession, MergeFailure> {
        let mut merged = Vec::new();
        for section in Section::ALL {
            let incoming = fragment.take_section(section);
            let accumulated = self.template.section_mut(section);
            match merge_section(section, accumulated, incoming) {
                Ok(()) => merged.push(section),
                Err(error) => {
                    return Err(MergeFailure {
                        partial: self.template,
                        merged,
                        error,
                    })
                }
            }
        }
        Ok(self)
    }
}

impl MergeFailure {
    pub fn error(&self) -> &ConflictError {
        &self.error
    }

    /// Sections fully merged before the conflict.
    pub fn merged_sections(&self) -> &[Section] {
        &self.merged
    }

    pub fn partial(&self) -> &TemplateFragment {
        &self.partial
    }

    pub fn into_partial(self) -> TemplateFragment {
        self.partial
    }

    pub fn into_error(self) -> ConflictError {
        self.error
    }

    pub fn into_parts(self) -> (TemplateFragment, ConflictError) {
        (self.partial, self.error)
    }
}

/// Merges `fragment` into `accumulator` in place.
///
/// On conflict the sections merged before the failing one stay applied.
pub fn merge(accumulator: &mut TemplateFragment, fragment: TemplateFragment) -> Result<(), ConflictError> {
    let session = MergeSession::new(std::mem::take(accumulator));
    match session.merge(fragment) {
        Ok(session) => {
            *accumulator = session.into_template();
            Ok(())
        }
        Err(failure) => {
            let (partial, error) = failure.into_parts();
            *accumulator = partial;
            Err(error)
        }
    }
}

/// Folds fragments left to right into an empty template.
pub fn merge_all<I>(fragments: I) -> Result<TemplateFragment, ConflictError>
where
    I: IntoIterator<Item = TemplateFragment>,
{
    let mut session = MergeSession::default();
    for fragment in fragments {
        session = session.merge(fragment).map_err(MergeFailure::into_error)?;
    }
    Ok(session.into_template())
}

fn merge_section(
    section: Section,
    accumulated: &mut Option<Mapping>,
    incoming: Option<Mapping>,
) -> Result<(), ConflictError> {
    let Some(incoming) = incoming else {
        trace!(%section, "section absent from fragment");
        return Ok(());
    };

    let Some(accumulated) = accumulated else {
        // First fragment to contribute the section sets its order.
        debug!(%section, keys = incoming.len(), "section taken from fragment");
        *accumulated = Some(incoming);
        return Ok(());
    };

    let result = match section {
        Section::Mappings => merge_two_level(accumulated, incoming),
        Section::Metadata | Section::Parameters | Section::Conditions => merge_single_level(accumulated, incoming),
    };
    result.map_err(|conflict| classify(section, conflict))
}

fn merge_single_level(accumulated: &mut Mapping, incoming: Mapping) -> Result<(), Conflict> {
    for (key, entry) in incoming {
        match accumulated.get(&key) {
            None => {
                debug!(key = %key, "appending key");
                accumulated.insert(entry.key, entry.value);
            }
            Some(existing) if existing.is_equal(&entry.value) => {
                debug!(key = %key, "identical definition already present");
            }
            Some(existing) => return Err(Conflict::new(key, existing.clone(), entry.value)),
        }
    }
    Ok(())
}

// Mappings are `MapName -> Key -> {Attr: Value}`. Map names present on both sides
// are merged one level down and conflicts report `MapName.Key`.
fn merge_two_level(accumulated: &mut Mapping, incoming: Mapping) -> Result<(), Conflict> {
    for (key, entry) in incoming {
        let Some(existing) = accumulated.get_mut(&key) else {
            debug!(key = %key, "appending mapping");
            accumulated.insert(entry.key, entry.value);
            continue;
        };

        match (existing, entry.value) {
            (Node::Mapping(existing_inner), Node::Mapping(incoming_inner)) => {
                merge_single_level(existing_inner, incoming_inner).map_err(|conflict| conflict.nested_under(&key))?;
            }
            (existing, incoming) => {
                if !existing.is_equal(&incoming) {
                    return Err(Conflict::new(key, existing.clone(), incoming));
                }
                debug!(key = %key, "identical mapping already present");
            }
        }
    }
    Ok(())
}
