pub const WILDCARD: &str = "*";

/// Match a request path against a resource pattern.
///
/// A pattern is either an exact path, `*`, or a prefix followed by a single
/// trailing `*` which matches any suffix (including the empty one).
pub fn resource_matches(pattern: &str, path: &str) -> bool {
    if pattern == WILDCARD {
        return true;
    }
    match pattern.strip_suffix('*') {
        Some(prefix) => path.starts_with(prefix),
        None => pattern == path,
    }
}

/// Match an HTTP method against an action pattern (`*` or a literal method).
pub fn action_matches(pattern: &str, method: &str) -> bool {
    pattern == WILDCARD || pattern == method
}

/// Check that `*` is either the whole resource pattern or a final segment
/// following `/`.
pub fn validate_resource_pattern(pattern: &str) -> Result<(), String> {
    if pattern.is_empty() {
        return Err("resource pattern is empty".to_string());
    }
    let body = pattern.strip_suffix('*').unwrap_or(pattern);
    if body.contains('*') {
        return Err(format!(
            "resource pattern {pattern} has a wildcard before its last segment"
        ));
    }
    if pattern != WILDCARD && pattern.ends_with('*') && !body.ends_with('/') {
        return Err(format!(
            "resource pattern {pattern} has a wildcard that does not follow /"
        ));
    }
    Ok(())
}

/// Check that an action pattern is `*` or an uppercase method token.
pub fn validate_action_pattern(pattern: &str) -> Result<(), String> {
    if pattern == WILDCARD {
        return Ok(());
    }
    if pattern.is_empty() || !pattern.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(format!(
            "action pattern {pattern} must be * or an uppercase HTTP method"
        ));
    }
    Ok(())
}
