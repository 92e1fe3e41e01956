use crate::config::FallbackThresholds;
use crate::parsers::signal::ContentSignal;

/// Decide whether a statically fetched page has to be rendered in a browser
///
/// A page needs rendering when it shows almost no text, or when a client-side
/// framework built it and the text it shows is too thin to be server-rendered.
pub fn needs_rendering(
    text_length: usize,
    framework_detected: bool,
    thresholds: &FallbackThresholds,
) -> bool {
    if text_length < thresholds.min_text_length {
        return true;
    }
    framework_detected && text_length <= thresholds.ssr_text_length
}

/// [`needs_rendering`] over a measured signal
pub fn signal_needs_rendering(signal: &ContentSignal, thresholds: &FallbackThresholds) -> bool {
    needs_rendering(signal.text_length, signal.framework_detected(), thresholds)
}
