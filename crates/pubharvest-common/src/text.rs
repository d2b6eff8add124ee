//! Text normalization helpers.

use unicode_normalization::UnicodeNormalization;

/// Convert any non-ASCII character to its closest ASCII equivalent.
///
/// Decomposes via NFKD and drops everything outside ASCII, so `"Kärre"`
/// becomes `"Karre"`. Characters with no canonical decomposition (e.g.
/// `ø`) are dropped entirely. The external search service does not
/// reliably handle non-ASCII names, so folded forms are used both in
/// queries and in the stored `*_normalized` author fields.
pub fn to_ascii(value: &str) -> String {
    value.nfkd().filter(|c| c.is_ascii()).collect()
}
