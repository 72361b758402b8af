use uuid::Uuid;

/// Generate a unique entity id: `<prefix>-<uuid v7>`
///
/// v7 ids are time-ordered with a monotonic counter, so two ids created in
/// the same millisecond still differ.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::now_v7().simple())
}

/// Use the caller-supplied id when it is non-blank, else generate one
pub fn resolve_id(requested: Option<String>, prefix: &str) -> String {
    requested
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| generate_id(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_unique_in_tight_loop() {
        let ids: HashSet<String> = (0..10_000).map(|_| generate_id("task")).collect();
        assert_eq!(ids.len(), 10_000);
        assert!(ids.iter().all(|id| id.starts_with("task-")));
    }

    #[test]
    fn test_resolve_id() {
        assert_eq!(resolve_id(Some("given".into()), "skill"), "given");
        assert!(resolve_id(Some("   ".into()), "skill").starts_with("skill-"));
        assert!(resolve_id(None, "skill").starts_with("skill-"));
    }
}
