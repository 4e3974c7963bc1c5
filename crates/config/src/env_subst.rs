/// Resolve a raw config value against the process environment.
///
/// A value that is exactly `${NAME}` is replaced by the variable, or `None`
/// when it is unset. Placeholders embedded in a longer value are substituted
/// in place; unresolvable ones are left as-is.
pub fn resolve(raw: &str) -> Option<String> {
    resolve_with(raw, |name| std::env::var(name).ok())
}

/// Same as [`resolve`] with a custom lookup, so tests don't touch the process
/// environment.
fn resolve_with(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    match whole_placeholder(raw) {
        Some(name) => lookup(name),
        None => Some(substitute_with(raw, lookup)),
    }
}

fn whole_placeholder(raw: &str) -> Option<&str> {
    let name = raw.trim().strip_prefix("${")?.strip_suffix('}')?;
    (!name.is_empty() && !name.contains(['$', '{', '}'])).then_some(name)
}

fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next();

        let mut name = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            name.push(c);
        }

        match (closed && !name.is_empty()).then(|| lookup(&name)).flatten() {
            Some(value) => result.push_str(&value),
            None => {
                result.push_str("${");
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            },
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "TORTUGA_TOKEN" => Some("s3cret".to_string()),
            "TORTUGA_PREFIX" => Some("!".to_string()),
            _ => None,
        }
    }

    #[test]
    fn whole_value_resolves_to_variable() {
        assert_eq!(
            resolve_with("${TORTUGA_TOKEN}", lookup).as_deref(),
            Some("s3cret")
        );
    }

    #[test]
    fn whole_value_with_unset_variable_is_absent() {
        assert_eq!(resolve_with("${TORTUGA_MISSING}", lookup), None);
    }

    #[test]
    fn embedded_placeholder_is_substituted() {
        assert_eq!(
            resolve_with("prefix ${TORTUGA_PREFIX} here", lookup).as_deref(),
            Some("prefix ! here")
        );
    }

    #[test]
    fn embedded_unknown_placeholder_is_kept() {
        assert_eq!(
            resolve_with("a ${NOPE} b", lookup).as_deref(),
            Some("a ${NOPE} b")
        );
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        assert_eq!(
            resolve_with("x ${TORTUGA_TOKEN", lookup).as_deref(),
            Some("x ${TORTUGA_TOKEN")
        );
    }

    #[test]
    fn plain_value_passes_through() {
        assert_eq!(resolve("SECONDS").as_deref(), Some("SECONDS"));
    }
}
