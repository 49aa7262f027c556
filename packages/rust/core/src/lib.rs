//! Orchestration for plugindoc.
//!
//! Ties the extractor, cache, badge client and renderers together into the
//! macros the docs site embeds, and runs the batch jobs (pages, redirects)
//! behind the CLI.

pub mod context;
pub mod macros;
pub mod pipeline;

pub use context::{DocsContext, RenderedPage};
pub use macros::{Macro, expand_macros};
pub use pipeline::{
    PagesResult, ProgressReporter, SilentProgress, generate_pages, generate_redirects,
    list_plugins, write_demos,
};
