//! # Name Keys
//!
//! Folding of display names into comparison keys.
//!
//! ```text
//!   "  Periféricos   USB "  ──► NFKD ──► strip marks ──► lowercase ──► "perifericos usb"
//!   "PERIFERICOS USB"       ─────────────────────────────────────────► "perifericos usb"
//! ```
//!
//! The key is stored next to the original name and carries the UNIQUE
//! index, so duplicates are detected case- and accent-insensitively while
//! the name keeps the casing it was entered with.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Folds `name` into its comparison key.
///
/// ## Example
/// ```rust
/// use tally_core::text::name_key;
///
/// assert_eq!(name_key("Teclado Mecánico"), name_key("teclado mecanico"));
/// assert_eq!(name_key("  Año   Nuevo "), "ano nuevo");
/// ```
pub fn name_key(name: &str) -> String {
    let folded: String = name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns true when two names collide under the key rules.
#[inline]
pub fn same_name(a: &str, b: &str) -> bool {
    name_key(a) == name_key(b)
}
