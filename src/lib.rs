//! Rooted parent-pointer tree with cycle-safe mutations.
//!
//! The [`domain`] layer holds the tree itself: every live node reaches the
//! root along exactly one simple path, before and after every
//! [`add`](domain::Tree::add), [`remove`](domain::Tree::remove) and
//! [`move_node`](domain::Tree::move_node). The remaining layers host it:
//! mutation scripts, replay, configuration and the `fstree` CLI.
//!
//! ```
//! use fstree::domain::{Tree, TreeError};
//!
//! let mut tree = Tree::new("R");
//! tree.add("A", "R").unwrap();
//! tree.add("B", "A").unwrap();
//! tree.add("C", "B").unwrap();
//!
//! tree.move_node(&"B", &"A", &"R").unwrap();
//! assert_eq!(tree.path_to_root(&"C"), vec!["C", "B", "R"]);
//!
//! let err = tree.move_node(&"R", &"R", &"C").unwrap_err();
//! assert!(matches!(err, TreeError::InvalidArguments { .. }));
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
