use once_cell::sync::Lazy;
use regex::Regex;

static NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]+").expect("valid noise regex"));

/// Lower-case, trim, turn hyphens into spaces, blank out anything outside `[a-z0-9\s]`
/// and collapse whitespace runs.
pub fn normalize_text(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    if lowered.is_empty() {
        return String::new();
    }

    let spaced = lowered.replace('-', " ");
    let cleaned = NOISE.replace_all(&spaced, " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
