//! Lossy canonical form used for perfume identity, note comparison and
//! cache fingerprints.

/// Keeps only Unicode letters and digits, lowercased.
///
/// `"  Chanel  N°5!! "` and `"chaneln5"` share the canonical form `chaneln5`.
/// Accented letters are letters, so they survive (lowercased).
pub fn canonicalize(input: &str) -> String {
    let mut canonical = String::with_capacity(input.len());
    for ch in input.chars().filter(|ch| ch.is_alphanumeric()) {
        canonical.extend(ch.to_lowercase());
    }
    canonical
}

#[cfg(test)]
mod tests {
    use super::canonicalize;

    #[test]
    fn punctuation_and_whitespace_are_stripped() {
        assert_eq!(canonicalize("  Chanel  N°5!! "), canonicalize("chaneln5"));
        assert_eq!(canonicalize("  Chanel  N°5!! "), "chaneln5");
    }

    #[test]
    fn diacritics_are_kept_as_lowercase_letters() {
        assert_eq!(canonicalize("Église Épicée"), "égliseépicée");
        assert_eq!(canonicalize("ТОМ Форд"), "томфорд");
    }

    #[test]
    fn digits_survive_and_symbols_do_not() {
        assert_eq!(canonicalize("L'Eau d'Issey 2024 (EDT)"), "leaudissey2024edt");
        assert_eq!(canonicalize("---"), "");
    }
}
