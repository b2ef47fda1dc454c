use crate::error::RunnerError;
use ragq_index::DocumentInput;
use sha2::{Digest, Sha256};
use std::path::Path;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Loads every supported file under `source_dir`, sorted by relative path,
/// UTF-8 decoded and whitespace-trimmed. Empty files are dropped; a source
/// directory with zero surviving documents is a hard failure.
pub fn load_documents(source_dir: &Path) -> Result<Vec<DocumentInput>, RunnerError> {
    if !source_dir.exists() {
        return Err(RunnerError::SourceDirNotFound { path: source_dir.display().to_string() });
    }
    if !source_dir.is_dir() {
        return Err(RunnerError::SourceNotADirectory { path: source_dir.display().to_string() });
    }

    let mut paths = Vec::new();
    collect_files(source_dir, &mut paths)?;
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            continue;
        }

        let raw = std::fs::read_to_string(&path)?;
        let text = raw.trim().to_string();
        if text.is_empty() {
            continue;
        }

        let relative_path = path
            .strip_prefix(source_dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        let doc_id = format!("{:x}", Sha256::digest(relative_path.as_bytes()))[..16].to_string();

        documents.push(DocumentInput { id: doc_id, source_path: relative_path, text });
    }

    if documents.is_empty() {
        return Err(RunnerError::NoDocuments { source_dir: source_dir.display().to_string() });
    }

    Ok(documents)
}

fn collect_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> Result<(), RunnerError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
