//! Relation-compatibility rules keyed by object type.

use crate::model::RelationType;
use std::collections::{HashMap, HashSet};

/// Decides whether a relation type is permitted between two object types.
pub trait SchemaRegistry: Send + Sync {
    fn is_relation_allowed(
        &self,
        start_object_type: Option<&str>,
        relation_type: RelationType,
        end_object_type: Option<&str>,
    ) -> bool;
}

/// Allows everything. Default when no schema definitions are loaded.
#[derive(Debug, Default, Clone)]
pub struct PermissiveSchema;

impl SchemaRegistry for PermissiveSchema {
    fn is_relation_allowed(
        &self,
        _start: Option<&str>,
        _relation_type: RelationType,
        _end: Option<&str>,
    ) -> bool {
        true
    }
}

/// Explicit rule set: per relation type, the permitted
/// (start object type, end object type) pairs.
///
/// A relation type with no rule set is unconstrained. Once a rule set
/// exists, a node without an object type cannot match any pair.
#[derive(Debug, Default)]
pub struct RuleSetSchema {
    rules: HashMap<RelationType, HashSet<(String, String)>>,
}

impl RuleSetSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permit(
        mut self,
        relation_type: RelationType,
        start_object_type: impl Into<String>,
        end_object_type: impl Into<String>,
    ) -> Self {
        self.rules
            .entry(relation_type)
            .or_default()
            .insert((start_object_type.into(), end_object_type.into()));
        self
    }
}

impl SchemaRegistry for RuleSetSchema {
    fn is_relation_allowed(
        &self,
        start: Option<&str>,
        relation_type: RelationType,
        end: Option<&str>,
    ) -> bool {
        match self.rules.get(&relation_type) {
            None => true,
            Some(pairs) => match (start, end) {
                (Some(s), Some(e)) => pairs.contains(&(s.to_string(), e.to_string())),
                _ => false,
            },
        }
    }
}
