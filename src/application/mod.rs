// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case drives the lower layers through one workflow
// (grow the corpus, stamp tasks, report, evaluate).
//
// Rules for this layer:
//   - No validation or sampling logic here (that's Layer 4)
//   - No printing here (that's Layer 1)
//   - File access only through Layer 6
//   - Only workflow coordination

// Batched generation: assign → generate → validate → style → commit
pub mod generate_use_case;

// Corpus-wide masking plan and trainingTasks stamping
pub mod tasks_use_case;

// `validate` and `stats`
pub mod report_use_case;

// Submission scoring against groundTruth
pub mod evaluate_use_case;
