//! Domain ID generation
//!
//! All IDs use the format: `{6-char-hex}-{kind}-{slug}`
//! Example: `019430-step-search-the-web`

/// Longest slug carried in an ID. Step descriptions are full sentences,
/// so the slug keeps only the leading portion.
const MAX_SLUG_LEN: usize = 48;

/// Generate a domain ID from kind and title
pub fn generate_id(kind: &str, title: &str) -> String {
    let uuid = uuid::Uuid::now_v7();
    let hex_prefix = &uuid.to_string()[..6];
    let slug = slugify(title);
    format!("{}-{}-{}", hex_prefix, kind, slug)
}

/// Slugify a title for use in IDs
fn slugify(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.chars().count() <= MAX_SLUG_LEN {
        return slug;
    }

    // Cut at a hyphen boundary so the slug never ends mid-word
    let head: String = slug.chars().take(MAX_SLUG_LEN).collect();
    match head.rfind('-') {
        Some(cut) => head[..cut].to_string(),
        None => head,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let id = generate_id("step", "Search the web for recent results");
        assert!(id.len() > 10);
        assert!(id.contains("-step-"));
        assert!(id.contains("search-the-web"));
    }

    #[test]
    fn test_generate_id_unique() {
        let a = generate_id("plan", "same title");
        let b = generate_id("plan", "same title");
        assert_ne!(a, b);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Fetch results!"), "fetch-results");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("CamelCase"), "camelcase");
        // Apostrophes are stripped, not converted to hyphens
        assert_eq!(slugify("here's a test"), "heres-a-test");
        assert_eq!(slugify("don't stop"), "dont-stop");
    }

    #[test]
    fn test_slugify_truncates_long_titles() {
        let long = "analyze the quarterly revenue figures and produce a written summary for the board";
        let slug = slugify(long);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
        assert!(slug.starts_with("analyze-the-quarterly"));
    }
}
