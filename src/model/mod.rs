//! Graph domain model: nodes, relations, collections.

mod collection;
pub mod keys;
mod node;
mod relation;

pub use collection::{Collection, CollectionKind};
pub use node::{Metadata, Node, NodeType};
pub use relation::{Relation, RelationType, ValidationProfile};
