use scraper::Html;

/// Plain text of an HTML fragment, entities decoded.
pub fn strip_tags(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect()
}

/// Keep the first `max_words` whitespace-separated words, joined by single
/// spaces, with an ellipsis appended when anything was cut.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    format!("{}…", words[..max_words].join(" "))
}

/// Excerpt used for entries: stripped body text cut to `max_words`.
pub fn excerpt(html: &str, max_words: usize) -> String {
    truncate_words(&strip_tags(html), max_words)
}
