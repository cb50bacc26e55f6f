//! Discovery of configuration files in a target directory.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::IacResult;

/// Configuration files found under a module directory.
#[derive(Debug, Clone)]
pub struct ConfigTree {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
}

impl ConfigTree {
    /// Collect the `*.tf` and `*.tf.json` files of the module at `root`.
    ///
    /// Only the top level is read, as the tool does. Nested module
    /// directories and hidden entries (`.terraform/`) are not part of it.
    pub fn scan(root: &Path) -> IacResult<Self> {
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() && is_config_file(entry.path()) {
                let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                files.push(relative.to_path_buf());
            }
        }

        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn is_config_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    name.ends_with(".tf") || name.ends_with(".tf.json")
}
