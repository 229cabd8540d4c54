mod block;
mod core;
mod ops;
mod serde_value;

pub use crate::block::*;
pub use crate::core::*;
pub use crate::ops::*;
pub use crate::serde_value::*;
