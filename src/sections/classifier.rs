use scraper::ElementRef;

use crate::parsers::text::normalize_whitespace;
use crate::results::{ContentBlock, SectionType};
use crate::utils::{first_words, truncate_chars};

/// Class/id keywords per section type, checked in this order
const KEYWORD_RULES: &[(SectionType, &[&str])] = &[
    (SectionType::Hero, &["hero", "banner", "jumbotron"]),
    (SectionType::Pricing, &["pricing", "price", "plan"]),
    (SectionType::Faq, &["faq", "question", "accordion"]),
    (SectionType::Grid, &["grid", "cards", "features"]),
];

const MAX_LABEL_CHARS: usize = 60;
const LABEL_WORDS: usize = 7;

/// The parts of a section node that classification looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTraits {
    pub tag: String,
    /// Lowercased class attribute
    pub class: String,
    /// Lowercased id attribute
    pub id: String,
    pub aria_label: Option<String>,
}

impl NodeTraits {
    pub fn of(element: ElementRef<'_>) -> Self {
        let value = element.value();
        Self {
            tag: value.name().to_ascii_lowercase(),
            class: value.attr("class").unwrap_or_default().to_lowercase(),
            id: value.id().unwrap_or_default().to_lowercase(),
            aria_label: value
                .attr("aria-label")
                .map(normalize_whitespace)
                .filter(|label| !label.is_empty()),
        }
    }

    fn mentions(&self, keyword: &str) -> bool {
        self.class.contains(keyword) || self.id.contains(keyword)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: SectionType,
    pub label: String,
}

/// Type and label for a section, derived only from its node traits and content
pub fn classify(traits: &NodeTraits, block: &ContentBlock) -> Classification {
    Classification {
        kind: section_type(traits, block),
        label: label(traits, block),
    }
}

pub fn section_type(traits: &NodeTraits, block: &ContentBlock) -> SectionType {
    match traits.tag.as_str() {
        "nav" => return SectionType::Nav,
        "footer" => return SectionType::Footer,
        "header" => return SectionType::Hero,
        _ => {}
    }

    for (kind, keywords) in KEYWORD_RULES {
        if keywords.iter().any(|keyword| traits.mentions(keyword)) {
            return *kind;
        }
    }

    if block.lists.len() >= 2 {
        return SectionType::List;
    }

    SectionType::Section
}

/// First heading, then aria-label, then the opening words, then the tag name
pub fn label(traits: &NodeTraits, block: &ContentBlock) -> String {
    let candidate = block
        .headings
        .first()
        .cloned()
        .or_else(|| traits.aria_label.clone())
        .or_else(|| Some(first_words(&block.text, LABEL_WORDS)).filter(|words| !words.is_empty()))
        .unwrap_or_else(|| format!("Section {}", traits.tag));

    truncate_chars(&candidate, MAX_LABEL_CHARS).0
}
