use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use wb_core::BindError;

use crate::{map_source_path, map_source_scan};

pub(crate) fn resolve_source_dir(dir: &str) -> Result<PathBuf, BindError> {
    let path = PathBuf::from(dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(|error| map_source_path(dir, error))?
            .join(path)
    };

    if !absolute.is_dir() {
        return Err(BindError::InvalidLocation {
            raw: dir.to_string(),
            reason: format!("not a directory: {}", absolute.display()),
        });
    }

    Ok(absolute)
}

/// Relative paths of every `.wsdl` and `.xsd` file under `root`, sorted.
pub(crate) fn collect_documents(root: &Path) -> Result<Vec<String>, BindError> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let is_document = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                extension.eq_ignore_ascii_case("wsdl") || extension.eq_ignore_ascii_case("xsd")
            });
        if !is_document {
            continue;
        }

        let relative = path
            .strip_prefix(root)
            .map_err(|error| map_source_scan(&root.to_string_lossy(), error))?
            .to_string_lossy()
            .replace('\\', "/");
        documents.push(relative);
    }

    if documents.is_empty() {
        return Err(BindError::InvalidLocation {
            raw: root.to_string_lossy().to_string(),
            reason: "no .wsdl or .xsd files found".to_string(),
        });
    }

    Ok(documents)
}
