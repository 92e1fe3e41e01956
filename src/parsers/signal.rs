use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

use super::text::text_length;
use super::{ContentTree, selector};
use crate::results::Section;

/// Attributes and ids that client-rendered frameworks put on their mount points
const MOUNT_MARKERS: &[(&str, &str)] = &[
    ("[data-reactroot]", "react root attribute"),
    ("[data-react-helmet]", "react helmet"),
    ("#__next", "next.js mount point"),
    ("script#__NEXT_DATA__", "next.js data script"),
    ("#__nuxt", "nuxt mount point"),
    ("[data-server-rendered]", "vue server-rendered marker"),
    ("[data-v-app]", "vue 3 mount point"),
    ("[ng-version]", "angular version attribute"),
    ("[ng-app]", "angularjs app attribute"),
    ("#___gatsby", "gatsby mount point"),
    ("#svelte", "svelte mount point"),
];

static MOUNT_SELECTORS: LazyLock<Vec<(Selector, &'static str)>> = LazyLock::new(|| {
    MOUNT_MARKERS
        .iter()
        .map(|&(css, name)| (selector(css), name))
        .collect()
});

static SCRIPT_WITH_SRC: LazyLock<Selector> = LazyLock::new(|| selector("script[src]"));
static EMPTY_MOUNT_CANDIDATES: LazyLock<Selector> =
    LazyLock::new(|| selector("body #root, body #app"));

/// Script paths produced by framework bundlers
static BUNDLE_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(
        r"(?i)(/_next/static/|/_nuxt/|react(-dom)?([.\-]production)?(\.min)?\.js|vue(\.runtime)?(\.global)?(\.prod)?(\.min)?\.js|angular(\.min)?\.js|/static/js/main\.[0-9a-f]{6,}|(main|runtime|polyfills|vendor|app)[.\-][0-9a-f]{6,}\.js|chunk[.\-][0-9a-f]{6,}\.js|bundle(\.[0-9a-f]+)?\.js)",
    ) {
        Ok(regex) => regex,
        Err(e) => panic!("invalid bundle script pattern: {e}"),
    }
});

/// How much content a parsed page shows and whether a JS framework built it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSignal {
    /// Sum of the text length of every detected section
    pub text_length: usize,
    /// The first framework fingerprint found, if any
    pub framework: Option<String>,
}

impl ContentSignal {
    pub fn measure(tree: &ContentTree, sections: &[Section]) -> Self {
        let text_length = sections
            .iter()
            .map(|section| text_length(&section.content.text))
            .sum();

        Self {
            text_length,
            framework: detect_framework(tree),
        }
    }

    pub fn framework_detected(&self) -> bool {
        self.framework.is_some()
    }
}

/// Look for mount-point attributes, empty root containers and bundler script tags
pub fn detect_framework(tree: &ContentTree) -> Option<String> {
    for (selector, name) in MOUNT_SELECTORS.iter() {
        if tree.first(selector).is_some() {
            return Some((*name).to_string());
        }
    }

    for mount in tree.select(&EMPTY_MOUNT_CANDIDATES) {
        let has_children = mount.children().any(|child| {
            child.value().is_element()
                || child
                    .value()
                    .as_text()
                    .is_some_and(|text| !text.trim().is_empty())
        });
        if !has_children {
            let id = mount.value().id().unwrap_or_default();
            return Some(format!("empty #{id} mount point"));
        }
    }

    for script in tree.select(&SCRIPT_WITH_SRC) {
        if let Some(src) = script.value().attr("src") {
            if BUNDLE_SCRIPT.is_match(src) {
                return Some(format!("bundler script {src}"));
            }
        }
    }

    None
}
