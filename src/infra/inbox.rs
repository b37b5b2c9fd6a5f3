// ============================================================
// Layer 6 — Inbox Generator
// ============================================================
// A file-backed FormGenerator. Whatever produces forms (an LLM
// script, a person, a fixture) drops JSON files into an inbox
// directory; each batch drains them in file-name order:
//
//   inbox/
//     0001.json            ← one form object
//     0002.json            ← or an array of form objects
//     0000.json.consumed   ← already used by a committed batch
//
// `generate` takes exactly as many documents as the batch has
// slots and only records which files they came from. Nothing
// on disk changes until `commit`: fully drained files get a
// `.consumed` suffix, a partly drained array file is rewritten
// with the documents it still holds. A batch that never commits
// leaves the inbox untouched.

use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::{GenerationError, PersistenceError};
use crate::domain::traits::{FormGenerator, GenerationRequest};
use crate::infra::store::write_json_atomic;

pub const CONSUMED_SUFFIX: &str = "consumed";

/// Files handed out by the last `generate`, waiting for `commit`.
#[derive(Debug, Default)]
struct Claim {
    drained: Vec<PathBuf>,
    /// A file only partly taken, with the documents left in it.
    partial: Option<(PathBuf, Vec<Value>)>,
}

pub struct DirectoryGenerator {
    dir:   PathBuf,
    claim: Option<Claim>,
}

impl DirectoryGenerator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), claim: None }
    }

    /// Pending `*.json` files, sorted by name.
    fn pending(&self) -> Result<Vec<PathBuf>, GenerationError> {
        let io_err = |source| GenerationError::Io { path: self.dir.clone(), source };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl FormGenerator for DirectoryGenerator {
    fn generate(&mut self, request: &GenerationRequest) -> Result<Vec<Value>, GenerationError> {
        // An uncommitted claim belongs to a batch that did not land.
        self.claim = None;

        if !self.dir.exists() {
            return Err(GenerationError::Collaborator(format!(
                "inbox '{}' does not exist",
                self.dir.display()
            )));
        }

        let wanted        = request.count();
        let mut documents = Vec::new();
        let mut claim     = Claim::default();

        for path in self.pending()? {
            let room = wanted - documents.len();
            if room == 0 {
                break;
            }
            let mut docs = read_documents(&path)?;
            if docs.len() > room {
                let rest = docs.split_off(room);
                claim.partial = Some((path, rest));
                documents.extend(docs);
                break;
            }
            documents.extend(docs);
            claim.drained.push(path);
        }

        if documents.is_empty() {
            return Err(GenerationError::Collaborator(format!(
                "inbox '{}' has no pending forms",
                self.dir.display()
            )));
        }

        tracing::debug!(
            "Took {} document(s) from {} inbox file(s) for {} slot(s)",
            documents.len(),
            claim.drained.len() + usize::from(claim.partial.is_some()),
            wanted,
        );
        self.claim = Some(claim);
        Ok(documents)
    }

    fn commit(&mut self) -> Result<(), PersistenceError> {
        let Some(claim) = self.claim.take() else {
            return Ok(());
        };
        for path in &claim.drained {
            mark_consumed(path)?;
        }
        if let Some((path, rest)) = &claim.partial {
            write_json_atomic(path, rest)?;
            tracing::debug!("'{}' keeps {} pending document(s)", path.display(), rest.len());
        }
        Ok(())
    }
}

/// One file: a form object or an array of them.
fn read_documents(path: &Path) -> Result<Vec<Value>, GenerationError> {
    let text = fs::read_to_string(path)
        .map_err(|source| GenerationError::Io { path: path.to_path_buf(), source })?;

    let unparsable = |message: String| GenerationError::Unparsable {
        origin: path.display().to_string(),
        message,
    };

    match serde_json::from_str::<Value>(&text).map_err(|e| unparsable(e.to_string()))? {
        doc @ Value::Object(_) => Ok(vec![doc]),
        Value::Array(docs) => {
            if let Some(bad) = docs.iter().position(|d| !d.is_object()) {
                return Err(unparsable(format!("element {} is not a form object", bad)));
            }
            Ok(docs)
        }
        _ => Err(unparsable("expected a form object or an array of forms".into())),
    }
}

fn mark_consumed(path: &Path) -> Result<(), PersistenceError> {
    let mut target = path.as_os_str().to_owned();
    target.push(".");
    target.push(CONSUMED_SUFFIX);
    fs::rename(path, &target).map_err(|source| PersistenceError::Write { path: path.to_path_buf(), source })
}
