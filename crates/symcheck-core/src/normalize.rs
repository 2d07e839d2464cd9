//! Symptom term normalisation.
//!
//! Vocabulary entries and caller input are compared through one key so that
//! `"Fever"`, `"fever"` and `"FEVER "` all address the same feature.
//!
//! # Rules
//!
//! - Leading and trailing Unicode whitespace is removed
//! - The remainder is lower-cased with full Unicode case mapping
//! - Inner whitespace is kept as-is (`"chest pain"` and `"chest  pain"` differ)

/// Normalise a symptom term into its lookup key.
///
/// Input: raw term like `"  Skin_Rash "`
/// Output: `"skin_rash"`
pub fn normalize_term(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Split one line of comma-separated symptoms, dropping blank entries.
///
/// `"fever, cough,, "` → `["fever", " cough"]`. Entries keep their inner
/// whitespace; [`normalize_term`] trims them at lookup time.
pub fn split_symptom_line(line: &str) -> Vec<String> {
    line.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .collect()
}
