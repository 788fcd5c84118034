//! Label name normalization
//!
//! Maps free-form label names, abbreviations and slugs onto canonical label
//! identifiers. Pure and idempotent: `normalize(normalize(x)) == normalize(x)`.

/// A label the catalog knows by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownLabel {
    /// Canonical identifier (also the `labels.id` primary key)
    pub id: &'static str,
    /// Name as printed on releases; used as the upstream search term
    pub display_name: &'static str,
}

pub const KNOWN_LABELS: &[KnownLabel] = &[
    KnownLabel {
        id: "buildit-records",
        display_name: "Build It Records",
    },
    KnownLabel {
        id: "buildit-tech",
        display_name: "Build It Tech",
    },
    KnownLabel {
        id: "buildit-deep",
        display_name: "Build It Deep",
    },
];

/// Aliases in normalized-key form (see [`normalized_key`]) → canonical id.
///
/// Every canonical id's own key is listed so canonical ids map to themselves.
const ALIASES: &[(&str, &str)] = &[
    ("buildit records", "buildit-records"),
    ("buildit", "buildit-records"),
    ("bir", "buildit-records"),
    ("records", "buildit-records"),
    ("buildit tech", "buildit-tech"),
    ("bit", "buildit-tech"),
    ("tech", "buildit-tech"),
    ("buildit deep", "buildit-deep"),
    ("bid", "buildit-deep"),
    ("deep", "buildit-deep"),
];

/// Canonical label identifier for `input`.
///
/// Lowercases, turns punctuation (hyphens, underscores, dots) into spaces,
/// collapses whitespace, joins the "build it" token pair into "buildit", then
/// consults the alias table. Unknown labels fall back to the normalized form
/// with spaces replaced by hyphens. Empty input yields an empty string.
///
/// ```ignore
/// assert_eq!(normalize("Build It Tech"), "buildit-tech");
/// assert_eq!(normalize("BIT"), "buildit-tech");
/// assert_eq!(normalize("Some  Other_Label"), "some-other-label");
/// ```
pub fn normalize(input: &str) -> String {
    let key = normalized_key(input);
    match alias_for(&key) {
        Some(canonical) => canonical.to_string(),
        None => key.replace(' ', "-"),
    }
}

/// Whether `id` is one of the canonical ids in [`KNOWN_LABELS`]
pub fn is_known(id: &str) -> bool {
    known_label(id).is_some()
}

pub fn known_label(id: &str) -> Option<&'static KnownLabel> {
    KNOWN_LABELS.iter().find(|label| label.id == id)
}

/// Term to send to the upstream label search for a canonical id.
///
/// Known labels use their display name; anything else is searched as its
/// de-slugged form.
pub fn search_name(id: &str) -> String {
    match known_label(id) {
        Some(label) => label.display_name.to_string(),
        None => id.replace('-', " "),
    }
}

fn alias_for(key: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
}

/// Lowercased, punctuation-free, single-spaced form with "build it" joined
fn normalized_key(input: &str) -> String {
    let cleaned: String = input
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    let mut joined: Vec<String> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] == "build" && tokens.get(i + 1) == Some(&"it") {
            joined.push("buildit".to_string());
            i += 2;
        } else {
            joined.push(tokens[i].to_string());
            i += 1;
        }
    }
    joined.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_map_to_canonical() {
        let cases = [
            ("Build It Tech", "buildit-tech"),
            ("build-it-tech", "buildit-tech"),
            ("BUILD_IT_TECH", "buildit-tech"),
            ("  build   it  tech ", "buildit-tech"),
            ("BIT", "buildit-tech"),
            ("buildit-tech", "buildit-tech"),
            ("Build It Records", "buildit-records"),
            ("buildit", "buildit-records"),
            ("Build It Deep", "buildit-deep"),
            ("bid", "buildit-deep"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_unknown_labels_fall_back_to_slug() {
        assert_eq!(normalize("Some  Other_Label"), "some-other-label");
        assert_eq!(normalize("Rebuild It Audio"), "rebuild-it-audio");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" - "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "Build It Tech",
            "BIT",
            "build_it_records",
            "Deep",
            "Some Other Label",
            "label.with.dots",
            "Ünïcode Läbel",
            "build it",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_canonical_ids_map_to_themselves() {
        for label in KNOWN_LABELS {
            assert_eq!(normalize(label.id), label.id);
            assert_eq!(normalize(label.display_name), label.id);
            assert!(is_known(label.id));
        }
        assert!(!is_known("some-other-label"));
    }

    #[test]
    fn test_search_name() {
        assert_eq!(search_name("buildit-tech"), "Build It Tech");
        assert_eq!(search_name("some-other-label"), "some other label");
    }
}
