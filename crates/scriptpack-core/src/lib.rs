//! ScriptPack Core: configuration, the embedded resource catalog and the
//! executable-relative runtime layout.

pub mod catalog;
pub mod config;
pub mod layout;

pub use catalog::{Catalog, CatalogError, EmbeddedResource, RUNTIME_PREFIX, SCRIPT_RESOURCE};
pub use layout::{LayoutError, RuntimeLayout};
