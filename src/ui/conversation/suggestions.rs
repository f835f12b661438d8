//! Canned prompt suggestions shown under the composer.

const DEFAULT_LABELS: [&str; 6] = [
    "V20 Strategy",
    "Range Bound Strategy",
    "SMA Strategy",
    "Reverse Head and Shoulder Strategy",
    "Cup with Handle Strategy",
    "Fifty Two Week Low Stratrgy",
];

pub fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|label| label.to_string()).collect()
}

/// Prompt placed in the composer when a suggestion is picked
pub fn prompt_for(label: &str) -> String {
    format!("Give me stocks for that satisfy the {label}.")
}
