/// Turns a category or tag name into a URL slug. Unicode letters survive, so
/// `"Korean Tag"` becomes `korean-tag` and `"한국어 태그"` becomes `한국어-태그`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.to_lowercase().chars() {
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
        } else if c.is_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        }
    }
    slug.trim_matches(|c| c == '-' || c == '_').to_owned()
}

/// Splits the free text tag field on `;` and `,`. Tokens are trimmed, empty
/// tokens dropped and repeated names kept once, in first-seen order.
pub fn parse_tag_names(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for token in raw.split([';', ',']) {
        let token = token.trim();
        if !token.is_empty() && !names.iter().any(|name| name == token) {
            names.push(token.to_owned());
        }
    }
    names
}

/// First `limit` characters of `text`, with an ellipsis when cut.
pub fn excerpt(text: &str, limit: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// `?, ?, ?` for an `IN (...)` clause with `count` parameters.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
