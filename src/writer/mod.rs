//! Component 3 – serialising translated programs.
pub mod asm;
pub mod json;
