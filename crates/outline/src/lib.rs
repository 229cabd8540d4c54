//! Structural indexer for block documents: heading numbers, table of
//! contents, collapsed-section visibility, per-kind registries, and generated
//! lists written back into the document.

mod collapse;
mod config;
mod error;
mod indexer;
mod materialize;
mod navigate;
mod numbering;
mod order;
mod registry;
mod scan;
mod schedule;
mod signature;
mod surface;
mod visibility;

pub use crate::collapse::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::indexer::*;
pub use crate::materialize::*;
pub use crate::navigate::*;
pub use crate::numbering::*;
pub use crate::order::*;
pub use crate::registry::*;
pub use crate::scan::*;
pub use crate::schedule::*;
pub use crate::signature::*;
pub use crate::surface::*;
pub use crate::visibility::*;
