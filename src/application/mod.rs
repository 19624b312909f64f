// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal per command: turn photos into cartoons, or prepare and
// inspect a weights directory.
//
// Rules for this layer:
//   - No tensor code here (that's Layer 5)
//   - No printing here (that's Layer 1)
//   - File access only through Layer 4 and Layer 6
//   - Errors are anyhow::Result with context attached
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Settings shared by every command, loadable from JSON
pub mod config;

// The face → cartoon workflow
pub mod generate_use_case;

// Weight directory initialisation and inspection
pub mod weights_use_case;
