//! Map-unit helpers (spec.md §4.8): two-character labels over a 10x8 grid
//! (`A`..`J` columns, `1`..`8` rows, one-indexed) encoded as a single byte
//! 1..80 for storage in a `FlagRecord`'s `ExtraByte` field.

use crate::error::MapUnitError;

const LETTERS: [char; 10] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J'];

/// Encode a map unit like `"F5"` into its extra-byte form, 1..80.
pub fn calc_extra_byte(map_unit: &str) -> Result<i32, MapUnitError> {
    let chars: Vec<char> = map_unit.chars().collect();
    let invalid = || MapUnitError::OutOfRangeUnit(map_unit.to_string());

    if chars.len() != 2 {
        return Err(invalid());
    }
    let letter_idx = LETTERS.iter().position(|&c| c == chars[0]).ok_or_else(invalid)?;
    let row: i32 = chars[1].to_digit(10).ok_or_else(invalid)? as i32;
    if !(1..=8).contains(&row) {
        return Err(invalid());
    }
    Ok(letter_idx as i32 + 10 * (row - 1) + 1)
}

/// Decode an extra-byte value 1..80 back into its map-unit label.
pub fn calc_map_unit(extra_byte: i32) -> Result<String, MapUnitError> {
    if !(1..=80).contains(&extra_byte) {
        return Err(MapUnitError::OutOfRangeByte(extra_byte));
    }
    let zero_based = extra_byte - 1;
    let letter_idx = (zero_based % 10) as usize;
    let row = zero_based / 10 + 1;
    Ok(format!("{}{}", LETTERS[letter_idx], row))
}
