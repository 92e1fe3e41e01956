use scraper::{ElementRef, Node};

/// Elements whose contents never count as visible text
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Collapses every run of whitespace into a single space and trims the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element with script and style subtrees removed
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut fragments = Vec::new();
    collect_text(element, &mut fragments);
    normalize_whitespace(&fragments.join(" "))
}

/// Visible text of an inline-level element (heading, list item, cell)
///
/// Text nodes are concatenated as written, so `Pric<em>ing</em>` stays one word.
pub fn inline_text(element: ElementRef<'_>) -> String {
    let mut fragments = Vec::new();
    collect_text(element, &mut fragments);
    normalize_whitespace(&fragments.concat())
}

fn collect_text<'a>(element: ElementRef<'a>, fragments: &mut Vec<&'a str>) {
    if is_hidden(element) {
        return;
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, fragments);
        } else if let Node::Text(text) = child.value() {
            fragments.push(text);
        }
    }
}

pub fn is_hidden(element: ElementRef<'_>) -> bool {
    HIDDEN_ELEMENTS.contains(&element.value().name())
}

/// Number of characters (not bytes) in already-normalized text
pub fn text_length(text: &str) -> usize {
    text.chars().count()
}
