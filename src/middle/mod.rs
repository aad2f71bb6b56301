//! Program-wide and per-block facts the backend consults while lowering:
//! primitive types, the function signature table and lexical scopes.

pub mod scope;
pub mod signature;
pub mod ty;
