use scraper::{Html, Node};

/// Elements whose text never reaches the reader.
const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

/// Reduces an HTML document to its visible text, one text run per line with
/// whitespace collapsed.
pub fn html_to_text(body: &str) -> String {
    let document = Html::parse_document(body);

    document
        .root_element()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some((node, text)),
            _ => None,
        })
        .filter(|(node, _)| {
            !node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .map(|e| SKIPPED_ELEMENTS.contains(&e.name()))
                    .unwrap_or(false)
            })
        })
        .map(|(_, text)| clean_text(text))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
