use std::sync::LazyLock;

use scraper::Selector;

use super::text::{element_text, normalize_whitespace};
use super::{ContentTree, selector};
use crate::results::Metadata;

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[name="description"]"#));
static OG_TITLE: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[property="og:title"]"#));
static OG_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[property="og:description"]"#));
static HTML: LazyLock<Selector> = LazyLock::new(|| selector("html"));
static CANONICAL: LazyLock<Selector> = LazyLock::new(|| selector(r#"link[rel~="canonical"]"#));

/// Title, description, language and canonical URL of a document
pub fn extract_metadata(tree: &ContentTree) -> Metadata {
    let title = tree
        .first(&TITLE)
        .map(element_text)
        .and_then(non_empty)
        .or_else(|| meta_content(tree, &OG_TITLE));

    let description =
        meta_content(tree, &DESCRIPTION).or_else(|| meta_content(tree, &OG_DESCRIPTION));

    let language = tree
        .first(&HTML)
        .and_then(|html| html.value().attr("lang"))
        .map(normalize_whitespace)
        .and_then(non_empty);

    let canonical = tree
        .first(&CANONICAL)
        .and_then(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .and_then(|href| tree.base_url().join(href).ok())
        .map(|url| url.to_string());

    Metadata {
        title,
        description,
        language,
        canonical,
    }
}

fn meta_content(tree: &ContentTree, selector: &Selector) -> Option<String> {
    tree.first(selector)
        .and_then(|meta| meta.value().attr("content"))
        .map(normalize_whitespace)
        .and_then(non_empty)
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn tree(markup: &str) -> ContentTree {
        ContentTree::parse(markup, &Url::parse("https://example.com/blog/post").unwrap()).unwrap()
    }

    #[test]
    fn test_full_metadata() {
        let tree = tree(
            r#"<html lang="en-GB"><head>
                <title>  My   Post </title>
                <meta name="description" content="A short  summary">
                <link rel="canonical" href="/blog/post">
            </head><body></body></html>"#,
        );
        let meta = extract_metadata(&tree);
        assert_eq!(meta.title.as_deref(), Some("My Post"));
        assert_eq!(meta.description.as_deref(), Some("A short summary"));
        assert_eq!(meta.language.as_deref(), Some("en-GB"));
        assert_eq!(
            meta.canonical.as_deref(),
            Some("https://example.com/blog/post")
        );
    }

    #[test]
    fn test_missing_metadata_is_none() {
        let meta = extract_metadata(&tree("<html><head><title> </title></head><body>x</body></html>"));
        assert_eq!(meta, Metadata::default());
    }

    #[test]
    fn test_open_graph_fallbacks() {
        let tree = tree(
            r#"<html><head>
                <meta property="og:title" content="OG Title">
                <meta property="og:description" content="OG description">
            </head><body></body></html>"#,
        );
        let meta = extract_metadata(&tree);
        assert_eq!(meta.title.as_deref(), Some("OG Title"));
        assert_eq!(meta.description.as_deref(), Some("OG description"));
    }
}
