//! Search filters over stored patterns.
//!
//! Type, minimum confidence and name substring run in SQL. Predicates on
//! the JSON `data` and `metadata` objects run afterwards in Rust, and the
//! limit is applied last so it counts only patterns that passed every
//! filter.

use std::str::FromStr;

use serde_json::{Map, Value};

use mnemos_core::{Pattern, PatternType};

use crate::error::StoreError;

/// Which JSON object of a pattern a predicate inspects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Data,
    Metadata,
}

/// A post-filter on a dot-separated path such as `"stats.count"`.
/// Numeric path segments index into arrays.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Equals { scope: Scope, path: String, value: Value },
    Exists { scope: Scope, path: String },
    GreaterThan { scope: Scope, path: String, value: f64 },
    LessThan { scope: Scope, path: String, value: f64 },
    /// String containing `needle`, or array holding the string `needle`.
    Contains { scope: Scope, path: String, needle: String },
}

impl Predicate {
    pub fn data_equals(path: &str, value: Value) -> Self {
        Self::Equals {
            scope: Scope::Data,
            path: path.to_string(),
            value,
        }
    }

    pub fn data_exists(path: &str) -> Self {
        Self::Exists {
            scope: Scope::Data,
            path: path.to_string(),
        }
    }

    pub fn data_gt(path: &str, value: f64) -> Self {
        Self::GreaterThan {
            scope: Scope::Data,
            path: path.to_string(),
            value,
        }
    }

    pub fn data_lt(path: &str, value: f64) -> Self {
        Self::LessThan {
            scope: Scope::Data,
            path: path.to_string(),
            value,
        }
    }

    pub fn data_contains(path: &str, needle: &str) -> Self {
        Self::Contains {
            scope: Scope::Data,
            path: path.to_string(),
            needle: needle.to_string(),
        }
    }

    pub fn metadata_equals(path: &str, value: Value) -> Self {
        Self::Equals {
            scope: Scope::Metadata,
            path: path.to_string(),
            value,
        }
    }

    fn parts(&self) -> (Scope, &str) {
        match self {
            Self::Equals { scope, path, .. }
            | Self::Exists { scope, path }
            | Self::GreaterThan { scope, path, .. }
            | Self::LessThan { scope, path, .. }
            | Self::Contains { scope, path, .. } => (*scope, path.as_str()),
        }
    }

    pub fn matches(&self, pattern: &Pattern) -> bool {
        let (scope, path) = self.parts();
        let root = match scope {
            Scope::Data => Some(&pattern.data),
            Scope::Metadata => pattern.metadata.as_ref(),
        };
        let Some(found) = root.and_then(|r| lookup(r, path)) else {
            return false;
        };
        match self {
            Self::Equals { value, .. } => found == value,
            Self::Exists { .. } => true,
            Self::GreaterThan { value, .. } => found.as_f64().is_some_and(|v| v > *value),
            Self::LessThan { value, .. } => found.as_f64().is_some_and(|v| v < *value),
            Self::Contains { needle, .. } => match found {
                Value::String(s) => s.contains(needle.as_str()),
                Value::Array(items) => items.iter().any(|v| v.as_str() == Some(needle.as_str())),
                _ => false,
            },
        }
    }
}

/// Resolve a dot-separated path inside a JSON object.
pub fn lookup<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Confidence,
    LastSeen,
    Occurrences,
    FirstSeen,
    Name,
}

impl SortKey {
    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::Confidence => "confidence",
            Self::LastSeen => "last_seen",
            Self::Occurrences => "occurrences",
            Self::FirstSeen => "first_seen",
            Self::Name => "name",
        }
    }
}

impl FromStr for SortKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "confidence" => Ok(Self::Confidence),
            "last_seen" => Ok(Self::LastSeen),
            "occurrences" => Ok(Self::Occurrences),
            "first_seen" => Ok(Self::FirstSeen),
            "name" => Ok(Self::Name),
            _ => Err(StoreError::InvalidParameter(format!("unknown sort key '{s}'"))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(StoreError::InvalidParameter(format!("unknown sort order '{s}'"))),
        }
    }
}

/// Builder for [`crate::PatternStore::search`]. The default query matches
/// everything, most confident first, then most recently seen.
#[derive(Clone, Debug, Default)]
pub struct PatternQuery {
    pub pattern_type: Option<PatternType>,
    pub min_confidence: Option<f64>,
    pub name_contains: Option<String>,
    pub predicates: Vec<Predicate>,
    pub sort: SortKey,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl PatternQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_type(mut self, pattern_type: PatternType) -> Self {
        self.pattern_type = Some(pattern_type);
        self
    }

    pub fn min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = Some(confidence);
        self
    }

    pub fn name_contains(mut self, needle: &str) -> Self {
        self.name_contains = Some(needle.to_string());
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn sort_by(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort = key;
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `ORDER BY` clause: the chosen key, then last-seen in the same
    /// direction, then id for a total order.
    pub(crate) fn order_clause(&self) -> String {
        let dir = self.order.keyword();
        match self.sort {
            SortKey::LastSeen => format!("ORDER BY last_seen {dir}, id ASC"),
            key => format!("ORDER BY {} {dir}, last_seen {dir}, id ASC", key.column()),
        }
    }

    pub(crate) fn accepts(&self, pattern: &Pattern) -> bool {
        self.predicates.iter().all(|p| p.matches(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pattern(data: Value) -> Pattern {
        Pattern::new(PatternType::Emergent, "p", data).unwrap()
    }

    #[test]
    fn test_lookup_nested_and_indexed() {
        let p = pattern(json!({"a": {"b": [10, {"c": "x"}]}}));
        assert_eq!(lookup(&p.data, "a.b.0"), Some(&json!(10)));
        assert_eq!(lookup(&p.data, "a.b.1.c"), Some(&json!("x")));
        assert_eq!(lookup(&p.data, "a.missing"), None);
        assert_eq!(lookup(&p.data, "a.b.9"), None);
    }

    #[test]
    fn test_predicates() {
        let p = pattern(json!({"n": 5, "tag": "burst-wave", "ids": ["a", "b"]}));
        assert!(Predicate::data_equals("n", json!(5)).matches(&p));
        assert!(!Predicate::data_equals("n", json!(6)).matches(&p));
        assert!(Predicate::data_exists("tag").matches(&p));
        assert!(!Predicate::data_exists("nope").matches(&p));
        assert!(Predicate::data_gt("n", 4.5).matches(&p));
        assert!(!Predicate::data_gt("n", 5.0).matches(&p));
        assert!(Predicate::data_lt("n", 5.5).matches(&p));
        assert!(!Predicate::data_lt("tag", 1.0).matches(&p));
        assert!(Predicate::data_contains("tag", "wave").matches(&p));
        assert!(Predicate::data_contains("ids", "b").matches(&p));
        assert!(!Predicate::data_contains("ids", "c").matches(&p));
    }

    #[test]
    fn test_metadata_predicate_without_metadata() {
        let p = pattern(json!({"n": 1}));
        assert!(!Predicate::metadata_equals("source", json!("cli")).matches(&p));

        let mut meta = Map::new();
        meta.insert("source".into(), json!("cli"));
        let p = p.with_metadata(meta);
        assert!(Predicate::metadata_equals("source", json!("cli")).matches(&p));
    }

    #[test]
    fn test_order_clause() {
        assert_eq!(
            PatternQuery::new().order_clause(),
            "ORDER BY confidence DESC, last_seen DESC, id ASC"
        );
        let q = PatternQuery::new().sort_by(SortKey::Name, SortOrder::Ascending);
        assert_eq!(q.order_clause(), "ORDER BY name ASC, last_seen ASC, id ASC");
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!("occurrences".parse::<SortKey>().unwrap(), SortKey::Occurrences);
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Ascending);
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
