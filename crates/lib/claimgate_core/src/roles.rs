//! Role membership index.

use std::collections::HashSet;

/// Set of role names built once from the normalized role sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleIndex {
    roles: HashSet<String>,
}

impl RoleIndex {
    /// Build the index from a role sequence. Duplicates collapse.
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `role` is present.
    pub fn contains(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// True if at least one of `roles` is present. False for an empty query.
    pub fn has_any<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|r| self.contains(r.as_ref()))
    }

    /// True if every one of `roles` is present. True for an empty query.
    pub fn has_all<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().all(|r| self.contains(r.as_ref()))
    }

    /// Role names in sorted order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut roles: Vec<&str> = self.roles.iter().map(String::as_str).collect();
        roles.sort_unstable();
        roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> RoleIndex {
        RoleIndex::new(["admin", "editor", "admin"])
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(index().len(), 2);
        assert_eq!(index().sorted(), vec!["admin", "editor"]);
    }

    #[test]
    fn has_any_matches_one() {
        assert!(index().has_any(&["viewer", "editor"]));
        assert!(!index().has_any(&["viewer"]));
    }

    #[test]
    fn has_all_requires_every_role() {
        assert!(index().has_all(&["admin", "editor"]));
        assert!(!index().has_all(&["admin", "viewer"]));
    }

    #[test]
    fn empty_query_semantics() {
        let empty: [&str; 0] = [];
        assert!(!index().has_any(&empty));
        assert!(index().has_all(&empty));
    }

    #[test]
    fn accepts_owned_strings() {
        let query = vec!["admin".to_string()];
        assert!(index().has_any(query.as_slice()));
    }
}
