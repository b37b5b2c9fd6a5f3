// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Three failure families, each with its own blast radius:
//
//   SchemaViolation   — one form rejected, run continues
//   GenerationError   — one batch abandoned, run continues
//   PersistenceError  — run halts; committed batches stay on disk
//
// BatchError wraps the two batch-scoped families so the
// generate loop can decide between "log and continue" and
// "stop the run" with a single `is_fatal()` call.

use serde::Serialize;
use std::{fmt, path::PathBuf};
use thiserror::Error;

/// The rule a rejected form broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Invariant {
    /// Document does not decode into the form data model.
    Shape,
    UniqueFieldIds,
    GroundTruthBijection,
    ClosedVocabulary,
    WebsiteContext,
    TaskCount,
    TaskMasking,
    PageOrder,
    Composition,
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Shape                => "shape",
            Self::UniqueFieldIds       => "unique-field-ids",
            Self::GroundTruthBijection => "ground-truth-bijection",
            Self::ClosedVocabulary     => "closed-vocabulary",
            Self::WebsiteContext       => "website-context",
            Self::TaskCount            => "task-count",
            Self::TaskMasking          => "task-masking",
            Self::PageOrder            => "page-order",
            Self::Composition          => "composition",
        };
        f.write_str(name)
    }
}

/// A single broken rule, tagged with the field it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field_id:  Option<String>,
    pub invariant: Invariant,
    pub message:   String,
}

impl Violation {
    pub fn form(invariant: Invariant, message: impl Into<String>) -> Self {
        Self { field_id: None, invariant, message: message.into() }
    }

    pub fn field(field_id: impl Into<String>, invariant: Invariant, message: impl Into<String>) -> Self {
        Self { field_id: Some(field_id.into()), invariant, message: message.into() }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field_id {
            Some(id) => write!(f, "[{}] field '{}': {}", self.invariant, id, self.message),
            None     => write!(f, "[{}] {}", self.invariant, self.message),
        }
    }
}

/// Every violation found on one rejected form.
#[derive(Debug, Clone, Error)]
#[error("form '{form_id}' rejected with {} violation(s)", violations.len())]
pub struct SchemaViolation {
    pub form_id:    String,
    pub violations: Vec<Violation>,
}

#[cfg(test)]
impl SchemaViolation {
    pub fn has(&self, invariant: Invariant) -> bool {
        self.violations.iter().any(|v| v.invariant == invariant)
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation collaborator failed: {0}")]
    Collaborator(String),

    #[error("unparsable generator response from '{origin}': {message}")]
    Unparsable { origin: String, message: String },

    #[error("expected {expected} instructions, got {actual}")]
    InstructionCount { expected: usize, actual: usize },

    #[error("generator I/O failed on '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("cannot read '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not a valid corpus document", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode '{}'", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a batch did not commit.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl BatchError {
    /// Persistence failures stop the run; generation failures only
    /// cost the current batch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}
