const DEFAULT_PROFILE: &str = "default";

/// Profile names become file names, so anything outside `[A-Za-z0-9_-.]`
/// is replaced.
pub fn resolve_profile(requested: &str) -> String {
    let trimmed = requested.trim().trim_matches('.');
    if trimmed.is_empty() {
        return DEFAULT_PROFILE.to_string();
    }

    trimmed
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}
