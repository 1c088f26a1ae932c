//! Timestamp and color conversions between plain values and ASS wire formats.

use crate::error::Error;

/// Format a number of seconds as an ASS timestamp: `H:MM:SS.CC`.
///
/// The hour field is not zero-padded. Centiseconds are truncated, not
/// rounded. Negative input clamps to zero.
#[must_use]
pub fn format_ass_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let total_centis = (seconds * 100.0) as u64;
    let hours = total_centis / 360_000;
    let minutes = (total_centis / 6_000) % 60;
    let secs = (total_centis / 100) % 60;
    let centis = total_centis % 100;
    format!("{hours}:{minutes:02}:{secs:02}.{centis:02}")
}

/// Convert a `#RGB`/`#RRGGBB` hex color plus an opacity percentage into an
/// ASS `&HAABBGGRR` literal. ASS alpha is the inverse of opacity: fully
/// opaque is `00`, fully transparent is `FF`.
pub fn css_hex_to_ass(hex: &str, opacity_pct: u8) -> Result<String, Error> {
    let (r, g, b) = parse_hex_rgb(hex)?;
    let alpha = ((100u32.saturating_sub(u32::from(opacity_pct.min(100))) * 255 + 50) / 100) as u8;
    Ok(format!("&H{alpha:02X}{b:02X}{g:02X}{r:02X}"))
}

fn parse_hex_rgb(hex: &str) -> Result<(u8, u8, u8), Error> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    let expanded = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => digits.to_string(),
        _ => return Err(Error::invalid_color(format!("expected #RGB or #RRGGBB, got {hex:?}"))),
    };
    let byte = |slice: &str| {
        u8::from_str_radix(slice, 16)
            .map_err(|_| Error::invalid_color(format!("non-hex digits in {hex:?}")))
    };
    Ok((
        byte(&expanded[0..2])?,
        byte(&expanded[2..4])?,
        byte(&expanded[4..6])?,
    ))
}

/// Escape ASS dialogue text: backslashes, braces, and embedded newlines.
#[must_use]
pub fn escape_ass_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str(r"\\"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '\n' => out.push_str(r"\N"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_formats_to_zero() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
    }

    #[test]
    fn truncates_not_rounds() {
        assert_eq!(format_ass_time(65.239), "0:01:05.23");
    }

    #[test]
    fn hour_field_unpadded() {
        assert_eq!(format_ass_time(3723.999), "1:02:03.99");
    }

    #[test]
    fn negative_clamps_to_zero() {
        assert_eq!(format_ass_time(-5.0), "0:00:00.00");
    }

    #[test]
    fn color_opaque() {
        assert_eq!(css_hex_to_ass("#6D5AE6", 100).unwrap(), "&H00E65A6D");
    }

    #[test]
    fn color_half_opacity() {
        assert_eq!(css_hex_to_ass("#FFFFFF", 50).unwrap(), "&H80FFFFFF");
    }

    #[test]
    fn color_shorthand() {
        assert_eq!(css_hex_to_ass("#FFF", 100).unwrap(), "&H00FFFFFF");
    }

    #[test]
    fn color_rejects_bad_input() {
        assert!(css_hex_to_ass("not-a-color", 100).is_err());
        assert!(css_hex_to_ass("#GGGGGG", 100).is_err());
    }

    #[test]
    fn escapes_backslash_and_braces() {
        assert_eq!(escape_ass_text(r"a\b{c}d"), r"a\\b\{c\}d");
    }

    #[test]
    fn escapes_newline_to_hard_n() {
        assert_eq!(escape_ass_text("line1\nline2"), r"line1\Nline2");
    }
}
