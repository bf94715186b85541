// Parser module for extracting imports from Python source

pub mod ast;
mod python;

pub use ast::*;
pub use python::ImportExtractor;
