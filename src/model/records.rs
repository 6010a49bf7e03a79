use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A commit object from the commits endpoint, tagged with its project
///
/// The upstream object is kept as-is; only `project_id` is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub project_id: i64,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Commit {
    /// Tags a decoded commit with `project_id`
    ///
    /// Returns None if `value` is not a JSON object. An upstream `project_id`
    /// key is replaced by the injected one.
    pub fn from_value(project_id: i64, value: Value) -> Option<Self> {
        match value {
            Value::Object(mut fields) => {
                fields.remove("project_id");
                Some(Self { project_id, fields })
            }
            _ => None,
        }
    }
}

/// Flags scraped from a project's HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub project_id: i64,

    /// Text of the license link, e.g. "MIT License"
    pub project_license: Option<String>,

    /// Lower-cased text of the "pull mirror" notice
    pub project_mirrored: Option<String>,
}

impl ProjectMeta {
    /// A record with both flags absent
    pub fn absent(project_id: i64) -> Self {
        Self {
            project_id,
            ..Self::default()
        }
    }

    pub fn is_mirror(&self) -> bool {
        self.project_mirrored.is_some()
    }
}
