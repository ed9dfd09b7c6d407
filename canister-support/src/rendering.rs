//! Rendering helpers for human-friendly error output.

/// Joins a dependency chain into one arrow-separated line.
///
/// # Examples
/// ```
/// use canister_support::rendering::render_chain;
///
/// let chain = ["notifier", "mailer", "notifier"];
/// assert_eq!(render_chain(&chain), "notifier -> mailer -> notifier");
/// ```
pub fn render_chain<S: AsRef<str>>(chain: &[S]) -> String {
    let mut out = String::new();
    for (i, id) in chain.iter().enumerate() {
        if i > 0 {
            out.push_str(" -> ");
        }
        out.push_str(id.as_ref());
    }
    out
}

/// Strips module paths from a fully qualified identifier for display.
///
/// Path prefixes are dropped in every position, including inside generic
/// brackets, so type-name-derived identifiers stay readable.
///
/// ```
/// use canister_support::rendering::shorten_id;
///
/// assert_eq!(shorten_id("app::mail::Mailer"), "Mailer");
/// assert_eq!(
///     shorten_id("alloc::sync::Arc<dyn app::mail::Transport>"),
///     "Arc<dyn Transport>"
/// );
/// assert_eq!(shorten_id("mailer.primary"), "mailer.primary");
/// ```
pub fn shorten_id(full: &str) -> String {
    let bytes = full.as_bytes();
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b':' if bytes.get(i + 1) == Some(&b':') => {
                // Discard everything seen since the last delimiter.
                segment_start = i + 2;
                i += 2;
            }
            b'<' | b'>' | b',' | b' ' | b'(' | b')' | b'[' | b']' => {
                out.push_str(&full[segment_start..i]);
                out.push(bytes[i] as char);
                segment_start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    out.push_str(&full[segment_start..]);
    out
}

/// Ranks known identifiers by similarity to a requested one and returns
/// the closest matches, best first.
///
/// Matching is case-insensitive and considers both the full identifier
/// and its [`shorten_id`] form.
pub fn suggest_similar(requested: &str, known: &[&str], limit: usize) -> Vec<String> {
    let full_needle = requested.to_ascii_lowercase();
    let short_needle = shorten_id(requested).to_ascii_lowercase();

    let mut ranked: Vec<(usize, &str)> = known
        .iter()
        .filter_map(|&candidate| {
            let full = candidate.to_ascii_lowercase();
            let short = shorten_id(candidate).to_ascii_lowercase();
            let score = similarity(&full_needle, &full)
                .max(similarity(&short_needle, &short));
            score.map(|s| (s, candidate))
        })
        .collect();

    // Stable order for equal scores so output is deterministic.
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

/// Similarity score between two lowercased names, `None` when unrelated.
fn similarity(needle: &str, candidate: &str) -> Option<usize> {
    if needle.is_empty() || candidate.is_empty() {
        return None;
    }
    if candidate.contains(needle) || needle.contains(candidate) {
        return Some(100);
    }
    let common_prefix = candidate
        .bytes()
        .zip(needle.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    (common_prefix >= 3).then_some(common_prefix * 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_with_multiple_entries() {
        assert_eq!(render_chain(&["a", "b", "c"]), "a -> b -> c");
    }

    #[test]
    fn chain_with_one_entry() {
        assert_eq!(render_chain(&["only"]), "only");
    }

    #[test]
    fn chain_empty() {
        assert_eq!(render_chain::<&str>(&[]), "");
    }

    #[test]
    fn shorten_plain_path() {
        assert_eq!(shorten_id("app::services::Mailer"), "Mailer");
    }

    #[test]
    fn shorten_generic_path() {
        assert_eq!(
            shorten_id("alloc::sync::Arc<app::db::Pool>"),
            "Arc<Pool>"
        );
    }

    #[test]
    fn shorten_leaves_string_keys_alone() {
        assert_eq!(shorten_id("mailer.primary"), "mailer.primary");
    }

    #[test]
    fn suggests_close_match_for_typo() {
        let known = ["app::Mailer", "app::MailerConfig", "app::Database"];
        let suggestions = suggest_similar("app::Maler", &known, 2);
        assert!(!suggestions.is_empty());
        assert!(suggestions[0].contains("Mailer"));
    }

    #[test]
    fn suggests_nothing_for_unrelated_name() {
        let known = ["app::Database"];
        assert!(suggest_similar("zzz", &known, 3).is_empty());
    }

    #[test]
    fn suggestion_order_is_deterministic() {
        let known = ["b::Thing", "a::Thing"];
        let suggestions = suggest_similar("Thing", &known, 2);
        assert_eq!(suggestions, vec!["a::Thing", "b::Thing"]);
    }
}
