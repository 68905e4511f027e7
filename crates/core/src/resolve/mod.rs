//! Source resolver contract for dependency fetching.
//!
//! Each source kind (GitHub releases, local directories) implements
//! [`SourceResolver`]. Resolvers are registered with a [`ResolverRegistry`]
//! and selected by the orchestrator based on each process's `sourceType`.

mod registry;
mod resolver;

pub use registry::ResolverRegistry;
pub use resolver::{FetchOutcome, Resolution, SourceResolver};
