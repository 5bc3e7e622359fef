//! Sixteen fixed latitude bands, one per group of Unicode general
//! categories, used to seed the projector's `ψ` angle for codepoint
//! seeds (§4.1). Grounded on `unicode-general-category`'s 30-category
//! enum, bucketed down to 16 bands so every codepoint lands in a
//! deterministic, stable band regardless of future category additions
//! (new/unassigned categories fall into the last band).

use unicode_general_category::{get_general_category, GeneralCategory as Gc};

/// Number of latitude bands the projector partitions `ψ ∈ (0, π)` into.
pub const BAND_COUNT: u8 = 16;

/// Returns the band index `0..16` for a codepoint's general category.
#[must_use]
pub fn latitude_band(cp: u32) -> u8 {
    let Some(c) = char::from_u32(cp) else {
        return BAND_COUNT - 1;
    };
    match get_general_category(c) {
        Gc::UppercaseLetter => 0,
        Gc::LowercaseLetter => 1,
        Gc::TitlecaseLetter | Gc::ModifierLetter | Gc::OtherLetter => 2,
        Gc::NonspacingMark | Gc::SpacingMark | Gc::EnclosingMark => 3,
        Gc::DecimalNumber => 4,
        Gc::LetterNumber | Gc::OtherNumber => 5,
        Gc::ConnectorPunctuation | Gc::DashPunctuation => 6,
        Gc::OpenPunctuation | Gc::ClosePunctuation => 7,
        Gc::InitialPunctuation | Gc::FinalPunctuation | Gc::OtherPunctuation => 8,
        Gc::MathSymbol => 9,
        Gc::CurrencySymbol => 10,
        Gc::ModifierSymbol | Gc::OtherSymbol => 11,
        Gc::SpaceSeparator | Gc::LineSeparator | Gc::ParagraphSeparator => 12,
        Gc::Control | Gc::Format => 13,
        Gc::Surrogate | Gc::PrivateUse => 14,
        Gc::Unassigned => 15,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_band_is_in_range() {
        for cp in [0x41, 0x61, 0x1F600, 0x0300, 0x0030, 0x002B, 0x0028] {
            assert!(latitude_band(cp) < BAND_COUNT);
        }
    }

    #[test]
    fn ascii_letters_differ_by_case() {
        assert_ne!(latitude_band(u32::from('A')), latitude_band(u32::from('a')));
    }
}
