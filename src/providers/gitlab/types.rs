use serde::Deserialize;

/// Subset of `GET /projects/:id` that is needed to address a project.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiProject {
    pub id: u64,
    pub path_with_namespace: String,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// `GET /user`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_ignores_unknown_fields() {
        let project: ApiProject = serde_json::from_str(
            r#"{"id": 4242, "path_with_namespace": "group/project", "star_count": 3}"#,
        )
        .unwrap();
        assert_eq!(project.id, 4242);
        assert_eq!(project.web_url, None);
    }

    #[test]
    fn test_user_name_is_optional() {
        let user: ApiUser = serde_json::from_str(r#"{"id": 7, "username": "dev"}"#).unwrap();
        assert_eq!(user.username, "dev");
        assert_eq!(user.name, None);
    }
}
