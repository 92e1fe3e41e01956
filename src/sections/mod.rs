pub mod classifier;
pub mod extractor;

use crate::config::ScraperConfig;
use crate::filter::UrlFilter;
use crate::parsers::ContentTree;
use crate::parsers::text::text_length;
use crate::results::Section;
use crate::utils::truncate_chars;
use classifier::NodeTraits;

/// Detect, extract and classify the sections of a parsed page
pub fn detect_sections(
    tree: &ContentTree,
    filter: &UrlFilter,
    config: &ScraperConfig,
) -> Vec<Section> {
    let candidates = extractor::find_candidates(tree, config.fallback_container_text);
    let mut sections = Vec::with_capacity(candidates.len());

    for (index, element) in candidates.into_iter().enumerate() {
        let content = extractor::build_block(element, filter);
        if text_length(&content.text) < config.min_section_text {
            ::log::trace!(
                "Dropping <{}> #{}: only {} chars of text",
                element.value().name(),
                index,
                text_length(&content.text)
            );
            continue;
        }

        let traits = NodeTraits::of(element);
        let classification = classifier::classify(&traits, &content);
        let (raw_html, truncated) = truncate_chars(&element.html(), config.raw_html_limit);

        sections.push(Section {
            id: format!("{}-{}", traits.tag, index),
            kind: classification.kind,
            label: classification.label,
            source_url: tree.url().to_string(),
            content,
            raw_html,
            truncated,
        });
    }

    sections
}
