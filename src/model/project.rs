use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A project as returned by the listing endpoint
///
/// Every field is optional: the listing payload is decoded leniently and a
/// missing or mistyped field simply stays `None`. Timestamps are kept as the
/// upstream ISO 8601 strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub web_url: Option<String>,
    pub readme_url: Option<String>,
    pub forks_count: Option<u64>,
    pub star_count: Option<u64>,
    pub last_activity_at: Option<String>,
}

impl Project {
    /// Builds a project from an optional listing entry
    ///
    /// A `None` payload, a non-object payload, or an object missing some keys
    /// all produce a project whose corresponding fields are `None`.
    pub fn from_payload(payload: Option<&Value>) -> Self {
        Self {
            id: field(payload, "id").and_then(Value::as_i64),
            name: string_field(payload, "name"),
            description: string_field(payload, "description"),
            created_at: string_field(payload, "created_at"),
            web_url: string_field(payload, "web_url"),
            readme_url: string_field(payload, "readme_url"),
            forks_count: field(payload, "forks_count").and_then(Value::as_u64),
            star_count: field(payload, "star_count").and_then(Value::as_u64),
            last_activity_at: string_field(payload, "last_activity_at"),
        }
    }
}

fn field<'a>(payload: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    payload.and_then(|p| p.get(key))
}

fn string_field(payload: Option<&Value>, key: &str) -> Option<String> {
    field(payload, key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_full_payload() {
        let payload = json!({
            "id": 278964,
            "name": "GitLab",
            "description": "GitLab is an open source end-to-end software development platform",
            "created_at": "2015-05-20T10:47:11.949Z",
            "web_url": "https://gitlab.com/gitlab-org/gitlab",
            "readme_url": "https://gitlab.com/gitlab-org/gitlab/-/blob/master/README.md",
            "forks_count": 9000,
            "star_count": 4000,
            "last_activity_at": "2020-10-01T12:00:00.000Z",
            "visibility": "public"
        });

        let project = Project::from_payload(Some(&payload));
        assert_eq!(project.id, Some(278964));
        assert_eq!(project.name.as_deref(), Some("GitLab"));
        assert_eq!(
            project.web_url.as_deref(),
            Some("https://gitlab.com/gitlab-org/gitlab")
        );
        assert_eq!(project.forks_count, Some(9000));
        assert_eq!(project.star_count, Some(4000));
    }

    #[test]
    fn test_from_missing_payload() {
        assert_eq!(Project::from_payload(None), Project::default());
    }

    #[test]
    fn test_null_and_mistyped_fields_are_absent() {
        let payload = json!({
            "id": "not-a-number",
            "name": null,
            "readme_url": null,
            "star_count": -3
        });

        let project = Project::from_payload(Some(&payload));
        assert_eq!(project.id, None);
        assert_eq!(project.name, None);
        assert_eq!(project.readme_url, None);
        assert_eq!(project.star_count, None);
    }

    #[test]
    fn test_non_object_payload() {
        let payload = json!([1, 2, 3]);
        assert_eq!(Project::from_payload(Some(&payload)), Project::default());
    }
}
