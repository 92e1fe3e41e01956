use chrono::Utc;
use url::Url;

use crate::results::{ErrorRecord, InteractionLog, Metadata, Phase, ScrapeResult, Section};

/// Append-only collection of phase-tagged failures for one request
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    records: Vec<ErrorRecord>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, phase: Phase, message: impl Into<String>) {
        let message = message.into();
        ::log::warn!("{:?} phase error: {}", phase, message);
        self.records.push(ErrorRecord { phase, message });
    }

    pub fn fetch(&mut self, error: impl ToString) {
        self.record(Phase::Fetch, error.to_string());
    }

    pub fn render(&mut self, error: impl ToString) {
        self.record(Phase::Render, error.to_string());
    }

    pub fn parse(&mut self, error: impl ToString) {
        self.record(Phase::Parse, error.to_string());
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<ErrorRecord> {
        self.records
    }
}

/// Builds the final [`ScrapeResult`] from whatever the phases produced
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    url: Url,
    meta: Metadata,
    interactions: InteractionLog,
    sections: Vec<Section>,
    errors: ErrorLog,
}

impl ResultAssembler {
    pub fn new(url: &Url) -> Self {
        Self {
            url: url.clone(),
            meta: Metadata::default(),
            interactions: InteractionLog::starting_at(url),
            sections: Vec::new(),
            errors: ErrorLog::new(),
        }
    }

    pub fn meta(mut self, meta: Metadata) -> Self {
        self.meta = meta;
        self
    }

    pub fn interactions(mut self, interactions: InteractionLog) -> Self {
        self.interactions = interactions;
        self
    }

    pub fn sections(mut self, sections: Vec<Section>) -> Self {
        self.sections = sections;
        self
    }

    pub fn errors(mut self, errors: ErrorLog) -> Self {
        self.errors = errors;
        self
    }

    /// Stamp the result with the current time
    pub fn finish(self) -> ScrapeResult {
        ScrapeResult {
            url: self.url.to_string(),
            scraped_at: Utc::now(),
            meta: self.meta,
            interactions: self.interactions,
            sections: self.sections,
            errors: self.errors.into_records(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    #[test]
    fn test_error_log_keeps_order_and_phase() {
        let mut errors = ErrorLog::new();
        assert!(errors.is_empty());

        errors.fetch(FetchError::Status(403));
        errors.render("Browser error: no session");
        errors.parse("Failed to parse HTML: document is empty");

        let phases: Vec<_> = errors.records().iter().map(|record| record.phase).collect();
        assert_eq!(phases, [Phase::Fetch, Phase::Render, Phase::Parse]);
        assert_eq!(errors.records()[0].message, "HTTP error: 403");
    }

    #[test]
    fn test_assembler_defaults_to_empty_result() {
        let url = Url::parse("https://example.com/").unwrap();
        let before = Utc::now();
        let result = ResultAssembler::new(&url).finish();

        assert_eq!(result.url, "https://example.com/");
        assert!(result.scraped_at >= before);
        assert_eq!(result.meta, Metadata::default());
        assert_eq!(result.interactions.pages(), ["https://example.com/"]);
        assert!(result.sections.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_assembler_carries_every_part() {
        let url = Url::parse("https://example.com/").unwrap();
        let mut errors = ErrorLog::new();
        errors.render("Page load timeout after 30000ms");
        let mut interactions = InteractionLog::starting_at(&url);
        interactions.record_scroll();

        let result = ResultAssembler::new(&url)
            .meta(Metadata {
                language: Some("en".to_string()),
                ..Metadata::default()
            })
            .interactions(interactions)
            .errors(errors)
            .finish();

        assert_eq!(result.meta.language.as_deref(), Some("en"));
        assert_eq!(result.interactions.scrolls(), 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].phase, Phase::Render);
    }
}
