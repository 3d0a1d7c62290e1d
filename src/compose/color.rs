//! Hex color parsing with lenient fallback.

/// Fallback used for any malformed color string.
pub const FALLBACK_RGB: (u8, u8, u8) = (20, 20, 20);

/// Parse a `#RRGGBB` string. Anything that is not six hex digits (after an
/// optional leading `#`) degrades to [`FALLBACK_RGB`] instead of failing.
#[must_use]
pub fn parse_hex(value: &str) -> (u8, u8, u8) {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return FALLBACK_RGB;
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).unwrap_or(FALLBACK_RGB.0)
    };
    (channel(0..2), channel(2..4), channel(4..6))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_hex_parses_byte_pairs() {
        assert_eq!(parse_hex("#E30613"), (0xE3, 0x06, 0x13));
        assert_eq!(parse_hex("ffd700"), (0xFF, 0xD7, 0x00));
    }

    #[test]
    fn malformed_hex_falls_back() {
        assert_eq!(parse_hex("#ZZ"), FALLBACK_RGB);
        assert_eq!(parse_hex(""), FALLBACK_RGB);
        assert_eq!(parse_hex("#12345"), FALLBACK_RGB);
        assert_eq!(parse_hex("#GGGGGG"), FALLBACK_RGB);
    }
}
