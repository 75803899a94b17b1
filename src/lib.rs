//! Polygen — random sentence generation from a small grammar language.
//!
//! A grammar is a list of `$symbol = alternative | alternative;`
//! definitions with optional `[...]` and plain `(...)` groups, forced
//! substitution (`>$symbol`), and postprocessing markers (`^`, `\`).
//! Source compiles once into an immutable table; each generation walks it
//! from `$s` with a caller-supplied random source.

pub mod core;
pub mod schema;
