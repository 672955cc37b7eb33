pub mod models;
pub mod utils;

// Models and helpers shared by the engine library and its binary.
// Only data types and pure functions live here; no I/O.
