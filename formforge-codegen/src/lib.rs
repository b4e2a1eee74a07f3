//! Formforge Codegen Library
//!
//! Generates the TypeScript side of a form (Zod schemas, types and server
//! actions) plus its DDL file from a [`formforge::FormConfiguration`]. Source
//! is built as a [`ts::Module`] and printed, never assembled from string
//! templates. The main entry point is [`FormWriter`].

pub mod actions;
pub mod error;
pub mod names;
pub mod options;
pub mod ts;
pub mod types;
pub mod writer;
pub mod zod;

pub use error::{CodegenError, Result};
pub use names::FormNames;
pub use options::CodegenOptions;
pub use writer::{FormWriter, GeneratedFile};
