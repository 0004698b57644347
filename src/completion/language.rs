//! Summary output language.

/// Known language codes and the names used in the prompt.
const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("pt-br", "Brazilian Portuguese"),
    ("nl", "Dutch"),
    ("sv", "Swedish"),
    ("da", "Danish"),
    ("no", "Norwegian"),
    ("fi", "Finnish"),
    ("pl", "Polish"),
    ("cs", "Czech"),
    ("ru", "Russian"),
    ("uk", "Ukrainian"),
    ("tr", "Turkish"),
    ("el", "Greek"),
    ("ar", "Arabic"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("zh-tw", "Traditional Chinese"),
];

/// Resolve a code such as `"de"`, `"pt_BR"` or `"fr-CA"` to a language name.
///
/// The full code is tried first, then its primary subtag. `"auto"`, the empty
/// string and unknown codes give `None`.
pub fn language_name(code: &str) -> Option<&'static str> {
    let normalized = code.trim().to_lowercase().replace('_', "-");
    let lookup = |key: &str| {
        LANGUAGES
            .iter()
            .find(|(c, _)| *c == key)
            .map(|&(_, name)| name)
    };

    lookup(&normalized).or_else(|| {
        let prefix = normalized.split('-').next().unwrap_or("");
        lookup(prefix)
    })
}

/// The sentence telling the model which language to write in.
pub fn language_directive(preference: &str) -> String {
    match language_name(preference) {
        Some(name) => format!("Write the summary in {name}."),
        None => {
            if !matches!(preference.trim(), "" | "auto") {
                tracing::debug!(preference, "Unknown summary language, matching source");
            }
            "Write the summary in the same language as the email.".to_string()
        }
    }
}

/// All supported codes, for CLI help.
pub fn known_codes() -> impl Iterator<Item = &'static str> {
    LANGUAGES.iter().map(|&(code, _)| code)
}
