use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const EMBEDDED_FIXTURE: &str = include_str!("../assets/policies.yaml");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read policy fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse policy fixture: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("duplicate policy id: {0}")]
    DuplicateId(String),
}

/// One line of a policy's coverage table, e.g. `collision` / `Up to $50,000`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageItem {
    pub category: String,
    pub description: String,
}

/// A customer's insurance policy. Amounts are display text, not numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub id: String,
    pub customer_name: String,
    pub policy_type: String,
    pub coverage: Vec<CoverageItem>,
    pub premium: String,
    pub deductible: String,
    pub exclusions: String,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    policies: Vec<PolicyRecord>,
}

/// Read-only set of policies, kept in fixture order.
///
/// Built once at startup; only shared references to records are ever handed out.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    records: Vec<PolicyRecord>,
}

impl PolicyStore {
    /// Build a store, rejecting repeated ids
    pub fn new(records: Vec<PolicyRecord>) -> Result<Self, StoreError> {
        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.id.as_str()) {
                return Err(StoreError::DuplicateId(record.id.clone()));
            }
        }
        Ok(Self { records })
    }

    /// The two-policy fixture shipped with the binary
    pub fn embedded() -> Result<Self, StoreError> {
        Self::from_yaml_str(EMBEDDED_FIXTURE)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, StoreError> {
        let fixture: Fixture = serde_yaml::from_str(yaml)?;
        Self::new(fixture.policies)
    }

    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Load from `path` when given, otherwise fall back to the embedded fixture
    pub fn load(path: Option<&Path>) -> Result<Self, StoreError> {
        let store = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::embedded()?,
        };
        info!(
            policies = store.len(),
            source = %path.map(|p| p.display().to_string()).unwrap_or_else(|| "embedded".to_string()),
            "policy store loaded"
        );
        Ok(store)
    }

    pub fn get(&self, id: &str) -> Option<&PolicyRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PolicyRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_fixture_keeps_order() {
        let store = PolicyStore::embedded().unwrap();
        let ids: Vec<&str> = store.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["policy_1001", "policy_1002"]);

        let jane = store.get("policy_1001").unwrap();
        assert_eq!(jane.customer_name, "Jane Doe");
        assert_eq!(jane.policy_type, "Auto Insurance");
        let categories: Vec<&str> = jane.coverage.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(categories, vec!["collision", "comprehensive", "roadside_assistance"]);

        let john = store.get("policy_1002").unwrap();
        assert_eq!(john.premium, "$85/month");
        assert_eq!(john.deductible, "$1,000");
        assert_eq!(john.exclusions, "Damage from floods and earthquakes.");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let yaml = r#"
policies:
  - id: p1
    customer_name: A
    policy_type: Auto
    coverage: []
    premium: "1"
    deductible: "2"
    exclusions: none
  - id: p1
    customer_name: B
    policy_type: Home
    coverage: []
    premium: "3"
    deductible: "4"
    exclusions: none
"#;
        let err = PolicyStore::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(id) if id == "p1"));
    }

    #[test]
    fn malformed_fixture_is_a_parse_error() {
        let err = PolicyStore::from_yaml_str("policies: [ { id: 1 } ]").unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = PolicyStore::from_path(Path::new("/nonexistent/policies.yaml")).unwrap_err();
        match err {
            StoreError::Io { path, .. } => assert_eq!(path, Path::new("/nonexistent/policies.yaml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_without_path_uses_embedded() {
        let store = PolicyStore::load(None).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get("policy_9999").is_none());
    }
}
