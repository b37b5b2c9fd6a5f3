// ============================================================
// Layer 4 — Corpus Rules
// ============================================================
// The deterministic algorithms every form passes through on
// its way into the corpus, plus the offline instruction
// writer and the reporting helpers.
//
// Rules for this layer:
//   - NO file I/O (that lives in infra)
//   - Randomness only through seeded StdRng values passed in
//     or built from an explicit seed

// Shape, bijection and closed-vocabulary checks
pub mod validator;

// Industry / layout per slot
pub mod distribution;

// Round-robin date and date-range picker styles
pub mod style;

// Corpus-wide task masking plan
pub mod masking;

// Template-based InstructionWriter
pub mod instructions;

// Submission scoring against groundTruth
pub mod comparison;

// Distribution report
pub mod stats;
