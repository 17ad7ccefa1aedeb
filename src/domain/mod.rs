//! Domain layer: the tree and its consistency rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod error;
pub mod mutation;
pub mod path;
pub mod render;

pub use arena::{NodeId, PostOrderIterator, Tree, TreeIterator, TreeNode};
pub use error::{InvariantViolation, TreeError, TreeResult};
pub use mutation::{BatchError, Mutation};
pub use path::ParentMap;
pub use render::{TreeNodeConvert, MAX_RENDER_DEPTH};
