//! Fine-grained source code change extraction.
//!
//! distiller compares two versions of a source file in two passes:
//! - **Declarations**: classes, fields and methods are aligned by kind and
//!   fully-qualified name into a [`StructureDiffNode`] tree
//! - **Statements**: the body of every declaration that changed is matched
//!   and differenced with [`distiller_tree`] into an edit script
//!
//! Parsing is up to the caller: a front end builds [`StructureNode`] trees
//! whose declarations carry [`StatementTree`] bodies labeled with [`EntityType`].
//!
//! # Example
//!
//! ```rust
//! use distiller::{ChangeDistiller, EntityType, StatementTree, StructureKind, StructureNode};
//! use distiller::distiller_tree::NodeData;
//!
//! fn version(statements: &[&str]) -> StructureNode {
//!     let mut body = StatementTree::new(NodeData::new(EntityType::Method, "close()"));
//!     for statement in statements {
//!         body.add_child(body.root, NodeData::new(EntityType::MethodInvocation, *statement));
//!     }
//!     StructureNode::new(StructureKind::Method, "close()")
//!         .with_content(statements.concat())
//!         .with_body(body)
//! }
//!
//! let before = version(&["flush();"]);
//! let after = version(&["flush();", "channel.close();"]);
//!
//! let distillation = ChangeDistiller::default().distill(&before, &after).unwrap();
//! assert_eq!(distillation.operation_count(), 1);
//! ```

mod tracing_macros;
pub(crate) use tracing_macros::{debug, trace};

pub mod differencer;
pub mod distill;
pub mod entity;
mod error;
pub mod structure;

pub use distiller_tree;

pub use differencer::{DiffType, StructureDiffNode, StructureDifferencer};
pub use distill::{BodyChange, ChangeDistiller, Distillation, DistillerConfig};
pub use entity::{EntityType, SourceRange, SourceTypes, StatementTree};
pub use error::DistillError;
pub use structure::{StructureKind, StructureNode};
