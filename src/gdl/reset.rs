//! Reset-type bitmask (spec.md §3): `ResetTypeValue` is a signed 32-bit
//! bitmask over ten named reset events, in positional order.

/// Reset-event names in their bit-position order (bit 0 first).
pub const RESET_EVENTS: [&str; 10] = [
    "cOnSceneChange",
    "cOnGameDayChange",
    "cOptionReset",
    "cOnBloodyMoon",
    "cOnStartNewData",
    "cOnGameDayChangeRandom",
    "cOnSceneInitialize",
    "cZonauEnemyRespawnTimer",
    "cRandomRevival",
    "cOnStartNewDataOnly",
]; // NOTE: index 8 ("cRandomRevival") is ExtraByte's bit, despite the name.

/// The bit used by `ExtraByte`-bearing flags (spec.md §4.7): bit 8.
pub const EXTRA_BYTE_BIT: i32 = 1 << 8;

/// Combine named reset events into their bitmask (boundary scenario S3).
pub fn calc_reset_type_value(names: &[&str]) -> Option<i32> {
    let mut value = 0i32;
    for name in names {
        let bit = RESET_EVENTS.iter().position(|e| e == name)?;
        value |= 1 << bit;
    }
    Some(value)
}

/// The reverse: the names set in a `ResetTypeValue` bitmask, in bit order.
pub fn reset_event_names(value: i32) -> Vec<&'static str> {
    RESET_EVENTS
        .iter()
        .enumerate()
        .filter(|(i, _)| value & (1 << i) != 0)
        .map(|(_, name)| *name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_scenario_s3() {
        let value = calc_reset_type_value(&["cOnSceneChange", "cOnStartNewData", "cOnSceneInitialize"]);
        assert_eq!(value, Some(1 | 16 | 64));
        assert_eq!(value.unwrap(), 81);
    }

    #[test]
    fn round_trips_through_names() {
        let value = calc_reset_type_value(&["cOptionReset", "cRandomRevival"]).unwrap();
        let names = reset_event_names(value);
        assert_eq!(names, vec!["cOptionReset", "cRandomRevival"]);
    }

    #[test]
    fn extra_byte_bit_matches_ninth_event() {
        assert_eq!(EXTRA_BYTE_BIT, 1 << 8);
        assert_eq!(RESET_EVENTS[8], "cRandomRevival");
    }
}
