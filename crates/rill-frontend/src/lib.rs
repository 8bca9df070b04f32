//! The parser-facing half of the compiler: the syntax tree, the
//! pattern-removal and annotation-merging pass, and the free-variable
//! analysis used for module-parameter instantiation.

pub mod ast;
pub mod deps;
pub mod nopat;
