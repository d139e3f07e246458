use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Backend-specific reference to stored bytes.
///
/// For the local-filesystem and remote object store backends this is a
/// `{space_id}/{suffix}_{filename}` key; for the embedded-blob backend it
/// is the blob row id. Locators are unique within a backend namespace and
/// are never reused after deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(inner: impl Into<String>) -> Self {
        Self(inner.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this locator lives under `space_id`'s namespace.
    ///
    /// The check is an exact path-segment match: `al` does not own
    /// `alice/...`, and a bare `{space_id}/` with nothing after it does
    /// not count.
    pub fn is_namespaced_to(&self, space_id: &str) -> bool {
        self.0
            .strip_prefix(space_id)
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|object| !object.is_empty())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Locator {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Locator {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Length of the random portion of generated object keys.
const SUFFIX_LEN: usize = 12;

/// Random alphanumeric suffix used to make object keys collision-free.
pub fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect()
}

/// Reduce a user-supplied filename to a single safe path component.
///
/// Keeps only the final component, drops control characters, and refuses
/// names that would resolve to the current or parent directory.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    match cleaned.trim() {
        "" | "." | ".." => "unnamed".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Build a fresh space-scoped object key: `{space_id}/{suffix}_{filename}`.
pub fn scoped_key(space_id: &str, filename: &str) -> Locator {
    Locator::new(format!(
        "{}/{}_{}",
        space_id,
        random_suffix(),
        sanitize_filename(filename)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_check() {
        let locator = Locator::new("alice/abc123_notes.txt");
        assert!(locator.is_namespaced_to("alice"));
        assert!(!locator.is_namespaced_to("bob"));
        // A prefix of the space id must not match.
        assert!(!locator.is_namespaced_to("al"));
        // Neither must a bare namespace with no object part.
        assert!(!Locator::new("alice/").is_namespaced_to("alice"));
        assert!(!Locator::new("alice").is_namespaced_to("alice"));
    }

    #[test]
    fn test_sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("notes.txt"), "notes.txt");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("dir\\evil.exe"), "evil.exe");
        assert_eq!(sanitize_filename(".."), "unnamed");
        assert_eq!(sanitize_filename("  "), "unnamed");
        assert_eq!(sanitize_filename("name\nwith\tcontrol"), "namewithcontrol");
    }

    #[test]
    fn test_scoped_keys_do_not_collide() {
        let a = scoped_key("alice", "notes.txt");
        let b = scoped_key("alice", "notes.txt");
        assert_ne!(a, b);
        assert!(a.is_namespaced_to("alice"));
        assert!(a.as_str().ends_with("_notes.txt"));
    }
}
