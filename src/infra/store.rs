// ============================================================
// Layer 6 — Config Store
// ============================================================
// Persists the corpus as two JSON documents, each an object of
// form id → form definition:
//
//   <corpus_dir>/
//     manual_config.json         ← hand-authored partition
//     llm_generated_config.json  ← generated partition
//     run_state.json             ← style counters (run_state.rs)
//     generate_config.json       ← last generate settings
//     batch_metrics.csv          ← one row per batch (metrics.rs)
//
// Writes are atomic per file: the document is written to a
// `.tmp` sibling and renamed over the target, so a crash leaves
// either the old or the new corpus, never half of one.
//
// Merging is left-biased: an id already present is never
// overwritten. The task pass is the only writer allowed to
// touch an existing form, and only its trainingTasks.

use serde::{
    de::{DeserializeOwned, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::domain::error::PersistenceError;
use crate::domain::form::{id_sort_key, FormDefinition, Task};

pub const MANUAL_FILE:          &str = "manual_config.json";
pub const GENERATED_FILE:       &str = "llm_generated_config.json";
pub const RUN_STATE_FILE:       &str = "run_state.json";
pub const GENERATE_CONFIG_FILE: &str = "generate_config.json";
pub const METRICS_FILE:         &str = "batch_metrics.csv";

// ─── Paths ────────────────────────────────────────────────────────────────────

/// Where the corpus lives on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusPaths {
    pub corpus_dir:     PathBuf,
    pub manual_file:    String,
    pub generated_file: String,
}

impl Default for CorpusPaths {
    fn default() -> Self {
        Self {
            corpus_dir:     PathBuf::from("public"),
            manual_file:    MANUAL_FILE.to_string(),
            generated_file: GENERATED_FILE.to_string(),
        }
    }
}

#[cfg(test)]
impl CorpusPaths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { corpus_dir: dir.into(), ..Self::default() }
    }
}

impl CorpusPaths {
    pub fn manual_path(&self) -> PathBuf {
        self.corpus_dir.join(&self.manual_file)
    }

    pub fn generated_path(&self) -> PathBuf {
        self.corpus_dir.join(&self.generated_file)
    }

    pub fn run_state_path(&self) -> PathBuf {
        self.corpus_dir.join(RUN_STATE_FILE)
    }

    pub fn generate_config_path(&self) -> PathBuf {
        self.corpus_dir.join(GENERATE_CONFIG_FILE)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.corpus_dir.join(METRICS_FILE)
    }
}

// ─── Partition ────────────────────────────────────────────────────────────────

/// Forms of one partition in insertion order, unique by id.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    forms: Vec<FormDefinition>,
    index: HashMap<String, usize>,
}

/// Result of a left-biased merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub inserted: Vec<String>,
    pub skipped:  Vec<String>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&FormDefinition> {
        self.index.get(id).map(|&i| &self.forms[i])
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.forms.iter().map(|f| &f.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormDefinition> {
        self.forms.iter()
    }

    /// Forms by ascending numeric id ("2" before "10").
    pub fn sorted(&self) -> Vec<&FormDefinition> {
        let mut forms: Vec<&FormDefinition> = self.forms.iter().collect();
        forms.sort_by_cached_key(|f| id_sort_key(&f.id));
        forms
    }

    fn insert_new(&mut self, form: FormDefinition) -> bool {
        if self.index.contains_key(&form.id) {
            return false;
        }
        self.index.insert(form.id.clone(), self.forms.len());
        self.forms.push(form);
        true
    }

    /// Left-biased union: ids already present (or repeated within
    /// `incoming`) keep their first definition.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = FormDefinition>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for form in incoming {
            let id = form.id.clone();
            if self.insert_new(form) {
                outcome.inserted.push(id);
            } else {
                tracing::debug!("Skipping '{}': id already in corpus", id);
                outcome.skipped.push(id);
            }
        }
        outcome
    }

    /// Overwrite the trainingTasks of an existing form.
    /// Returns false if the id is unknown.
    pub fn replace_tasks(&mut self, id: &str, tasks: Vec<Task>) -> bool {
        match self.index.get(id) {
            Some(&i) => {
                self.forms[i].training_tasks = tasks;
                true
            }
            None => false,
        }
    }
}

impl FromIterator<FormDefinition> for Partition {
    fn from_iter<I: IntoIterator<Item = FormDefinition>>(iter: I) -> Self {
        let mut partition = Partition::default();
        partition.merge(iter);
        partition
    }
}

impl PartialEq for Partition {
    fn eq(&self, other: &Self) -> bool {
        self.forms == other.forms
    }
}

impl Serialize for Partition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.forms.len()))?;
        for form in &self.forms {
            map.serialize_entry(&form.id, form)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Partition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PartitionVisitor;

        impl<'de> Visitor<'de> for PartitionVisitor {
            type Value = Partition;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping form ids to form definitions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Partition, A::Error> {
                let mut partition = Partition::default();
                while let Some((key, mut form)) = access.next_entry::<String, FormDefinition>()? {
                    // The object key is the stored identity.
                    if form.id != key {
                        tracing::warn!("Form keyed '{}' carries id '{}'; using the key", key, form.id);
                        form.id = key;
                    }
                    partition.insert_new(form);
                }
                Ok(partition)
            }
        }

        deserializer.deserialize_map(PartitionVisitor)
    }
}

// ─── Corpus ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub manual:    Partition,
    pub generated: Partition,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.manual.len() + self.generated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manual.is_empty() && self.generated.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&FormDefinition> {
        self.manual.get(id).or_else(|| self.generated.get(id))
    }

    /// Order the masking sampler walks: hand-authored forms by
    /// ascending numeric id, then generated forms likewise.
    pub fn task_order(&self) -> Vec<&FormDefinition> {
        let mut forms = self.manual.sorted();
        forms.extend(self.generated.sorted());
        forms
    }

    /// Overwrite trainingTasks wherever the id lives.
    pub fn replace_tasks(&mut self, id: &str, tasks: Vec<Task>) -> bool {
        if self.manual.contains(id) {
            self.manual.replace_tasks(id, tasks)
        } else {
            self.generated.replace_tasks(id, tasks)
        }
    }
}

// ─── Store ────────────────────────────────────────────────────────────────────

/// Loads and atomically saves the two corpus partitions.
pub struct ConfigStore {
    paths: CorpusPaths,
}

impl ConfigStore {
    pub fn new(paths: CorpusPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &CorpusPaths {
        &self.paths
    }

    /// Both partitions; a missing file is an empty partition.
    pub fn load(&self) -> Result<Corpus, PersistenceError> {
        let manual    = self.load_partition(&self.paths.manual_path())?;
        let generated = self.load_partition(&self.paths.generated_path())?;
        tracing::info!(
            "Loaded corpus: {} hand-authored, {} generated",
            manual.len(),
            generated.len(),
        );
        Ok(Corpus { manual, generated })
    }

    pub fn load_partition(&self, path: &Path) -> Result<Partition, PersistenceError> {
        Ok(read_json(path)?.unwrap_or_default())
    }

    pub fn save_generated(&self, generated: &Partition) -> Result<(), PersistenceError> {
        write_json_atomic(&self.paths.generated_path(), generated)?;
        tracing::debug!("Committed {} generated forms", generated.len());
        Ok(())
    }

    pub fn save(&self, corpus: &Corpus) -> Result<(), PersistenceError> {
        write_json_atomic(&self.paths.manual_path(), &corpus.manual)?;
        write_json_atomic(&self.paths.generated_path(), &corpus.generated)?;
        tracing::debug!("Committed corpus of {} forms", corpus.len());
        Ok(())
    }
}

// ─── JSON helpers ─────────────────────────────────────────────────────────────

/// Read and decode `path`. `Ok(None)` if the file does not exist
/// or holds only whitespace.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(PersistenceError::Read { path: path.to_path_buf(), source }),
    };
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| PersistenceError::Decode { path: path.to_path_buf(), source })
}

/// Pretty-print `value` to `<path>.tmp`, then rename it over `path`.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let write_err = |source| PersistenceError::Write { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let json = serde_json::to_string_pretty(value)
        .map_err(|source| PersistenceError::Encode { path: path.to_path_buf(), source })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}
