use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Generates one unguessable route identifier. Webhook paths double as the
/// only authentication the signal source has, so they must not be guessable.
fn new_route_id() -> String {
    format!("hook-{}", Uuid::new_v4().simple())
}

/// Loads the persisted route identifiers, generating and appending new ones
/// until `count` exist. The file is rewritten only when it grows; when it
/// holds more ids than requested the surplus stays on disk and is ignored.
///
/// # Errors
/// Returns an error if the file cannot be read or written.
pub fn load_or_generate(path: &Path, count: usize) -> Result<Vec<String>> {
    let mut routes: Vec<String> = if path.exists() {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read routes file {}", path.display()))?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()
    } else {
        Vec::new()
    };

    if routes.len() < count {
        let added = count - routes.len();
        routes.resize_with(count, new_route_id);
        let mut contents = routes.join("\n");
        contents.push('\n');
        fs::write(path, contents)
            .with_context(|| format!("failed to write routes file {}", path.display()))?;
        tracing::info!(added, total = routes.len(), file = %path.display(), "extended route list");
    }

    routes.truncate(count);
    Ok(routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn generates_fresh_routes_when_file_is_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routes.txt");

        let routes = load_or_generate(&path, 3).unwrap();
        assert_eq!(routes.len(), 3);
        assert!(routes.iter().all(|r| r.starts_with("hook-")));

        let persisted = std::fs::read_to_string(&path).unwrap();
        assert_eq!(persisted.lines().count(), 3);
    }

    #[test]
    fn extends_when_more_strategies_are_requested() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routes.txt");
        std::fs::write(&path, "hook-aaa\n").unwrap();

        let routes = load_or_generate(&path, 3).unwrap();
        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0], "hook-aaa");

        let persisted = std::fs::read_to_string(&path).unwrap();
        assert_eq!(persisted.lines().count(), 3);
    }

    #[test]
    fn surplus_stored_routes_are_ignored_but_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routes.txt");
        std::fs::write(&path, "hook-a\nhook-b\nhook-c\n").unwrap();

        let routes = load_or_generate(&path, 2).unwrap();
        assert_eq!(routes, vec!["hook-a".to_string(), "hook-b".to_string()]);

        // the file keeps all three for a future larger run
        let persisted = std::fs::read_to_string(&path).unwrap();
        assert_eq!(persisted.lines().count(), 3);
    }

    #[test]
    fn stable_across_repeated_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routes.txt");

        let first = load_or_generate(&path, 2).unwrap();
        let second = load_or_generate(&path, 2).unwrap();
        assert_eq!(first, second);
    }
}
