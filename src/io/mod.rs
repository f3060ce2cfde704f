//! I/O utilities for qa-forge.
//!
//! Provides file reading with memory mapping support for efficient
//! handling of large files, along with Unicode utilities.

pub mod input;
pub mod reader;
pub mod unicode;

pub use input::{parse_documents, read_documents_from_file, InputFormat};
pub use reader::FileReader;
pub use unicode::find_char_boundary;
