//! Recursive AND/OR filter groups.

use super::criteria::FilterCriteria;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// How the children of a group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    #[default]
    And,
    Or,
}

/// A boolean combination of criteria leaves and nested groups.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterGroup {
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterNode>,
}

/// One child of a [`FilterGroup`].
///
/// On the wire a child with an `operator` key is a group; anything else is
/// a criteria leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Group(FilterGroup),
    Criteria(FilterCriteria),
}

impl FilterGroup {
    /// Create an empty group.
    pub fn new(operator: Operator) -> Self {
        Self {
            operator,
            name: None,
            filters: Vec::new(),
        }
    }

    pub fn and() -> Self {
        Self::new(Operator::And)
    }

    pub fn or() -> Self {
        Self::new(Operator::Or)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_criteria(mut self, criteria: FilterCriteria) -> Self {
        self.push_criteria(criteria);
        self
    }

    pub fn with_group(mut self, group: FilterGroup) -> Self {
        self.push_group(group);
        self
    }

    pub fn push_criteria(&mut self, criteria: FilterCriteria) {
        self.filters.push(FilterNode::Criteria(criteria));
    }

    pub fn push_group(&mut self, group: FilterGroup) {
        self.filters.push(FilterNode::Group(group));
    }

    /// Copy the tree, transforming every criteria leaf with `f`.
    ///
    /// The shape of the tree, operators and names are preserved.
    pub fn map_criteria<F>(&self, f: &mut F) -> FilterGroup
    where
        F: FnMut(&FilterCriteria) -> FilterCriteria,
    {
        let mut filters = Vec::with_capacity(self.filters.len());
        for node in &self.filters {
            filters.push(match node {
                FilterNode::Group(group) => FilterNode::Group(group.map_criteria(&mut *f)),
                FilterNode::Criteria(criteria) => FilterNode::Criteria(f(criteria)),
            });
        }

        FilterGroup {
            operator: self.operator,
            name: self.name.clone(),
            filters,
        }
    }

    /// Call `f` on every criteria leaf, depth first.
    pub fn visit_criteria<F>(&self, f: &mut F)
    where
        F: FnMut(&FilterCriteria),
    {
        for node in &self.filters {
            match node {
                FilterNode::Group(group) => group.visit_criteria(&mut *f),
                FilterNode::Criteria(criteria) => f(criteria),
            }
        }
    }

    /// Nesting depth; a group with no nested groups has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .filters
            .iter()
            .filter_map(|node| match node {
                FilterNode::Group(group) => Some(group.depth()),
                FilterNode::Criteria(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Number of criteria leaves anywhere in the tree.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.visit_criteria(&mut |_: &FilterCriteria| count += 1);
        count
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// The single leaf of an AND group holding exactly one criteria node.
    ///
    /// This is the shape the tabbed editor reads and writes.
    pub fn as_simple(&self) -> Option<&FilterCriteria> {
        match (self.operator, self.filters.as_slice()) {
            (Operator::And, [FilterNode::Criteria(criteria)]) => Some(criteria),
            _ => None,
        }
    }
}

impl From<FilterCriteria> for FilterNode {
    fn from(criteria: FilterCriteria) -> Self {
        FilterNode::Criteria(criteria)
    }
}

impl From<FilterGroup> for FilterNode {
    fn from(group: FilterGroup) -> Self {
        FilterNode::Group(group)
    }
}

impl Serialize for FilterNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FilterNode::Group(group) => group.serialize(serializer),
            FilterNode::Criteria(criteria) => criteria.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FilterNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let is_group = raw
            .as_object()
            .map(|obj| obj.contains_key("operator"))
            .unwrap_or(false);

        if is_group {
            serde_json::from_value(raw)
                .map(FilterNode::Group)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(raw)
                .map(FilterNode::Criteria)
                .map_err(de::Error::custom)
        }
    }
}
