use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use crate::filter::UrlFilter;
use crate::parsers::text::{element_text, inline_text, is_hidden, text_length};
use crate::parsers::{ContentTree, selector};
use crate::results::ContentBlock;

static LANDMARKS: LazyLock<Selector> =
    LazyLock::new(|| selector("header, nav, main, section, article, aside, footer"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3, h4, h5, h6"));
static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static IMAGES: LazyLock<Selector> = LazyLock::new(|| selector("img[src]"));
static LISTS: LazyLock<Selector> = LazyLock::new(|| selector("ul, ol"));
static TABLES: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("tr"));

/// Containers considered when a page has no landmarks
const BLOCK_CONTAINERS: &[&str] = &[
    "div",
    "p",
    "ul",
    "ol",
    "dl",
    "table",
    "form",
    "blockquote",
    "pre",
    "figure",
    "details",
    "fieldset",
    "address",
    "center",
];

/// Candidate section nodes in document order
///
/// Landmark elements win; only a page without any falls back to the
/// text-bearing block containers directly under `body`.
pub fn find_candidates(tree: &ContentTree, min_container_text: usize) -> Vec<ElementRef<'_>> {
    let landmarks: Vec<_> = tree
        .select(&LANDMARKS)
        .filter(|element| !has_hidden_ancestor(*element, None))
        .collect();
    if !landmarks.is_empty() {
        return landmarks;
    }

    let Some(body) = tree.first(&BODY) else {
        return Vec::new();
    };

    let containers: Vec<_> = body
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| BLOCK_CONTAINERS.contains(&child.value().name()))
        .filter(|child| text_length(&element_text(*child)) > min_container_text)
        .collect();

    ::log::debug!(
        "No landmarks in {}, using {} top-level containers",
        tree.url(),
        containers.len()
    );
    containers
}

/// Pull the structured content out of one candidate node
pub fn build_block(element: ElementRef<'_>, filter: &UrlFilter) -> ContentBlock {
    let text = element_text(element);

    let headings = visible(element, &HEADINGS)
        .map(inline_text)
        .filter(|heading| !heading.is_empty())
        .collect();

    let links = filter.resolve_all(
        visible(element, &LINKS).filter_map(|anchor| anchor.value().attr("href")),
    );
    let images =
        filter.resolve_all(visible(element, &IMAGES).filter_map(|img| img.value().attr("src")));

    let lists = visible(element, &LISTS)
        .map(list_items)
        .filter(|items| !items.is_empty())
        .collect();

    let tables = visible(element, &TABLES)
        .map(table_rows)
        .filter(|rows| !rows.is_empty())
        .collect();

    ContentBlock {
        headings,
        text,
        links,
        images,
        lists,
        tables,
    }
}

/// Descendants of `root` matching `selector` that are not inside script-like elements
fn visible<'a>(
    root: ElementRef<'a>,
    selector: &'a Selector,
) -> impl Iterator<Item = ElementRef<'a>> {
    root.select(selector)
        .filter(move |element| !has_hidden_ancestor(*element, Some(root)))
}

fn has_hidden_ancestor(element: ElementRef<'_>, stop_at: Option<ElementRef<'_>>) -> bool {
    for ancestor in element.ancestors() {
        if stop_at.is_some_and(|root| root.id() == ancestor.id()) {
            return false;
        }
        if ElementRef::wrap(ancestor).is_some_and(is_hidden) {
            return true;
        }
    }
    false
}

/// Text of the `li` items directly under a `ul`/`ol`
fn list_items(list: ElementRef<'_>) -> Vec<String> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li")
        .map(inline_text)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Cell text per row, skipping rows that belong to nested tables
fn table_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    table
        .select(&ROWS)
        .filter(|row| owning_table(*row).is_some_and(|owner| owner.id() == table.id()))
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(inline_text)
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect()
}

fn owning_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "table")
}
