//! Class index to letter lookup

/// Display value for indices outside the label table
pub const UNKNOWN_LETTER: &str = "?";

/// Letters by class index: 0 is space, 1..=26 are A..Z (order matches training)
pub const LETTERS: [&str; 27] = [
    " ", "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q",
    "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
];

/// Map a predicted class index to its letter, degrading to `?` when unknown
pub fn letter_for(index: usize) -> &'static str {
    LETTERS.get(index).copied().unwrap_or(UNKNOWN_LETTER)
}
