// Copyright (c) Chris Gunn.
// Licensed under the MIT license.


use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    error::AddonsError,
    merge::MergeSession,
    template::TemplateFragment,
};

const PARAMS_STEM: &str = "params";
const OUTPUTS_STEM: &str = "outputs";

/// YAML files found in a service's addons directory, grouped by role.
#[derive(Debug, Clone)]
pub struct AddonsDir {
    path: PathBuf,
    params: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
    resources: Vec<PathBuf>,
}

/// The merged template of an addons directory.
#[derive(Debug, Clone)]
pub struct Addons {
    pub template: TemplateFragment,
    /// Files in the order they were merged.
    pub files: Vec<PathBuf>,
}

impl AddonsDir {
    /// Lists the directory. Files without a `.yaml`/`.yml` extension are skipped.
    pub fn open(path: impl Into<PathBuf>) -> Result<AddonsDir, AddonsError> {
        let path = path.into();
        let read_err = |source| AddonsError::Read {
            path: path.clone(),
            source,
        };

        let mut files = Vec::new();
        for dir_entry in fs::read_dir(&path).map_err(read_err)? {
            let dir_entry = dir_entry.map_err(read_err)?;
            let file_type = dir_entry.file_type().map_err(read_err)?;
            let file_path = dir_entry.path();
            if !file_type.is_file() || !is_yaml(&file_path) {
                debug!(file = %file_path.display(), "skipping non-template file");
                continue;
            }
            files.push(file_path);
        }
        files.sort();

        let mut addons_dir = AddonsDir {
            path,
            params: Vec::new(),
            outputs: Vec::new(),
            resources: Vec::new(),
        };
        for file in files {
            match file.file_stem().and_then(|stem| stem.to_str()) {
                Some(PARAMS_STEM) => addons_dir.params.push(file),
                Some(OUTPUTS_STEM) => addons_dir.outputs.push(file),
                _ => addons_dir.resources.push(file),
            }
        }
        Ok(addons_dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of every required file that is missing, all at once.
    pub fn missing_required(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.params.is_empty() {
            missing.push(format!("{}.yaml (or .yml)", PARAMS_STEM));
        }
        if self.outputs.is_empty() {
            missing.push(format!("{}.yaml (or .yml)", OUTPUTS_STEM));
        }
        if self.resources.is_empty() {
            missing.push("a resource template (*.yaml)".to_string());
        }
        missing
    }

    /// Template files in merge order: parameters, outputs, then resources.
    pub fn template_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.params.iter().chain(&self.outputs).chain(&self.resources)
    }

    /// Parses and merges every template file of the directory.
    pub fn load(&self) -> Result<Addons, AddonsError> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(AddonsError::MissingFiles {
                dir: self.path.clone(),
                missing,
            });
        }

        let mut session = MergeSession::default();
        let mut merged_files = Vec::new();
        for file in self.template_files() {
            let fragment = read_fragment(file)?;
            session = session.merge(fragment).map_err(|failure| AddonsError::Conflict {
                path: file.clone(),
                source: Box::new(failure.into_error()),
            })?;
            merged_files.push(file.clone());
        }

        info!(dir = %self.path.display(), files = merged_files.len(), "merged addons templates");
        Ok(Addons {
            template: session.into_template(),
            files: merged_files,
        })
    }
}

fn read_fragment(path: &Path) -> Result<TemplateFragment, AddonsError> {
    let content = fs::read_to_string(path).map_err(|source| AddonsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    TemplateFragment::parse(&content).map_err(|source| AddonsError::Template {
        path: path.to_path_buf(),
        source,
    })
}

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|ext| ext.to_str()), Some("yaml" | "yml"))
}
