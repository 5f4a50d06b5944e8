/// Indented tree rendering of the AST, used by tests and diagnostics.
pub mod tree;
