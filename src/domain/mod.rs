// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain data types and traits that define what the corpus IS:
// forms, pages, fields, tasks, the closed vocabularies they
// are checked against, and the error families the pipeline
// can raise.
//
// Rules for this layer:
//   - NO file I/O
//   - NO randomness
//   - Only structs, enums, constants and traits

// Form, page, field and task types
pub mod form;

// Fixed reference lists (countries, states, addresses, industries)
pub mod vocab;

// SchemaViolation / GenerationError / PersistenceError
pub mod error;

// Generator and instruction-writer collaborator seams
pub mod traits;
