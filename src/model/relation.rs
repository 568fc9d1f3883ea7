//! Relation representation and the closed relation-type taxonomy.
//!
//! Each relation type carries its own delete policy and validation profile.
//! Construction is a pure factory lookup: an unrecognized or blank type name
//! is rejected as a client error, never silently defaulted.

use super::node::Metadata;
use crate::error::{codes, EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Closed taxonomy of relation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    Hierarchy,
    Constituency,
    AssociatedTo,
    SetMembership,
    SequenceMembership,
    SubSet,
    CoOccurrence,
    PreRequisite,
}

/// Which structural checks a relation type requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationProfile {
    /// No structural checks
    None,
    /// Cycle check + endpoint types + schema compatibility
    Full,
    /// Endpoints must be schema-compatible
    SchemaOnly,
    /// The member (end node) must be a data node
    MemberType,
}

impl RelationType {
    /// Wire name, verbatim as persisted in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hierarchy => "HIERARCHY",
            Self::Constituency => "CONSTITUENCY",
            Self::AssociatedTo => "ASSOCIATED_TO",
            Self::SetMembership => "SET_MEMBERSHIP",
            Self::SequenceMembership => "SEQUENCE_MEMBERSHIP",
            Self::SubSet => "SUB_SET",
            Self::CoOccurrence => "CO_OCCURRENCE",
            Self::PreRequisite => "PRE_REQUISITE",
        }
    }

    /// Factory lookup from a type name.
    ///
    /// Blank or unrecognized names fail with `ERR_RELATION_CREATE`.
    pub fn parse(name: &str) -> EngineResult<Self> {
        match name.trim() {
            "HIERARCHY" => Ok(Self::Hierarchy),
            "CONSTITUENCY" => Ok(Self::Constituency),
            "ASSOCIATED_TO" => Ok(Self::AssociatedTo),
            "SET_MEMBERSHIP" => Ok(Self::SetMembership),
            "SEQUENCE_MEMBERSHIP" => Ok(Self::SequenceMembership),
            "SUB_SET" => Ok(Self::SubSet),
            "CO_OCCURRENCE" => Ok(Self::CoOccurrence),
            "PRE_REQUISITE" => Ok(Self::PreRequisite),
            other => Err(EngineError::client(
                codes::ERR_RELATION_CREATE,
                format!("UnSupported Relation: {}", other),
            )),
        }
    }

    /// Whether a relation of this type may be deleted on its own.
    ///
    /// A constituency part cannot exist alone without the whole, so its
    /// relation can never be deleted independently.
    pub fn delete_allowed(&self) -> bool {
        !matches!(self, Self::Constituency)
    }

    /// The validation checks this type requires.
    pub fn validation_profile(&self) -> ValidationProfile {
        match self {
            Self::Constituency => ValidationProfile::Full,
            Self::AssociatedTo => ValidationProfile::SchemaOnly,
            Self::SetMembership | Self::SequenceMembership => ValidationProfile::MemberType,
            Self::Hierarchy | Self::SubSet | Self::CoOccurrence | Self::PreRequisite => {
                ValidationProfile::None
            }
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed edge between two nodes.
///
/// Identity is the ordered triple (start, type, end) within a graph; the
/// numeric `store_id` exists only for store bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub graph_id: String,
    pub start_node_id: String,
    pub end_node_id: String,
    relation_type: RelationType,
    pub metadata: Metadata,
    /// Store-side numeric id, when materialized from the store
    pub store_id: Option<i64>,
}

impl Relation {
    pub fn new(
        graph_id: impl Into<String>,
        start_node_id: impl Into<String>,
        relation_type: RelationType,
        end_node_id: impl Into<String>,
    ) -> Self {
        Self {
            graph_id: graph_id.into(),
            start_node_id: start_node_id.into(),
            end_node_id: end_node_id.into(),
            relation_type,
            metadata: Metadata::new(),
            store_id: None,
        }
    }

    pub fn relation_type(&self) -> RelationType {
        self.relation_type
    }

    /// Identity triple within the graph.
    pub fn identity(&self) -> (&str, RelationType, &str) {
        (&self.start_node_id, self.relation_type, &self.end_node_id)
    }

    /// Enforce the per-type delete policy before any store interaction.
    pub fn check_deletable(&self) -> EngineResult<()> {
        if self.relation_type.delete_allowed() {
            Ok(())
        } else {
            Err(EngineError::server(
                codes::ERR_RELATION_DELETE,
                "Part of a constituent relation cannot exist alone without reference to the whole",
            ))
        }
    }
}
