//! Query model of the key-value store contract

use serde_json::Value;

use crate::cursor::Cursor;
use crate::item::{Index, RawItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanDirection {
    #[default]
    Forward,
    Reverse,
}

/// Condition on the sort key of the scanned table or index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKeyCondition {
    Equals(String),
    BeginsWith(String),
    /// Inclusive on both ends
    Between(String, String),
    LessThan(String),
    GreaterOrEqual(String),
}

impl SortKeyCondition {
    pub fn matches(&self, sk: &str) -> bool {
        match self {
            SortKeyCondition::Equals(v) => sk == v,
            SortKeyCondition::BeginsWith(p) => sk.starts_with(p.as_str()),
            SortKeyCondition::Between(lo, hi) => sk >= lo.as_str() && sk <= hi.as_str(),
            SortKeyCondition::LessThan(v) => sk < v.as_str(),
            SortKeyCondition::GreaterOrEqual(v) => sk >= v.as_str(),
        }
    }
}

/// Post-read filter on item attributes
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equals { attribute: String, value: Value },
    /// Array attributes contain `value`; string attributes contain it as a
    /// substring
    Contains { attribute: String, value: Value },
    And(Vec<Filter>),
}

impl Filter {
    pub fn equals(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn contains(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Contains {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, data: &Value) -> bool {
        match self {
            Filter::Equals { attribute, value } => data.get(attribute) == Some(value),
            Filter::Contains { attribute, value } => match (data.get(attribute), value) {
                (Some(Value::Array(items)), v) => items.contains(v),
                (Some(Value::String(s)), Value::String(needle)) => s.contains(needle.as_str()),
                _ => false,
            },
            Filter::And(filters) => filters.iter().all(|f| f.matches(data)),
        }
    }
}

/// One query against the main table or a secondary index
#[derive(Debug, Clone, PartialEq)]
pub struct QueryInput {
    pub index: Option<Index>,
    pub partition_key: String,
    pub sort_key: Option<SortKeyCondition>,
    /// Applied after `limit`: a page may hold fewer items than the limit
    pub filter: Option<Filter>,
    /// Items evaluated per page, counted before filtering
    pub limit: Option<usize>,
    pub direction: ScanDirection,
}

impl QueryInput {
    /// Query the main table
    pub fn main(partition_key: impl Into<String>) -> Self {
        Self {
            index: None,
            partition_key: partition_key.into(),
            sort_key: None,
            filter: None,
            limit: None,
            direction: ScanDirection::Forward,
        }
    }

    pub fn on_index(index: Index, partition_key: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            ..Self::main(partition_key)
        }
    }

    pub fn with_sort_key(mut self, condition: SortKeyCondition) -> Self {
        self.sort_key = Some(condition);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn reverse(mut self) -> Self {
        self.direction = ScanDirection::Reverse;
        self
    }

    /// Whether `item` belongs to the partition and sort-key range queried
    pub fn selects(&self, item: &RawItem) -> bool {
        let (Some(pk), Some(sk)) = (
            item.partition_key_for(self.index),
            item.sort_key_for(self.index),
        ) else {
            return false;
        };
        pk == self.partition_key && self.sort_key.as_ref().map_or(true, |c| c.matches(sk))
    }
}

/// One page of query output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub items: Vec<RawItem>,
    /// Set when more items remain after this page
    pub last_evaluated: Option<Cursor>,
}
