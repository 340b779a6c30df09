//! Renders template files and directory trees by substituting `{{name}}` tokens from a flat
//! variables file into file contents and, optionally, into output paths.
//!
//! Directory renders honour a gitignore-style ignore file (see the `kakine` crate), are
//! staged completely before anything is written and roll back on failure.
pub mod api;
pub mod errors;
mod preview;
pub mod render;
pub mod substitute;
mod transactions;
mod utils;
pub mod variables;
pub mod vfs;

pub use api::StencilError;
pub use kakine::RuleSet;
pub use render::{
    render_directory, render_file, DirectoryRenderRequest, FileRenderRequest, RenderError,
    RenderSummary,
};
pub use substitute::{substitute, Substitutor};
pub use variables::VariableMap;
