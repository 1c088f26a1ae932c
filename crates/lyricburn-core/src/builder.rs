//! ASS document builder: composes `[Script Info]`, `[V4+ Styles]`, and
//! `[Events]` from a style descriptor, a resolution, and a segment list.

use std::fmt::Write as _;

use crate::codec::{css_hex_to_ass, escape_ass_text, format_ass_time};
use crate::error::Error;
use crate::segment::Segment;
use crate::style::StyleDescriptor;

/// Render a complete ASS v4+ document. `segments` must already be sorted
/// and validated (see [`crate::segment::validate_replacement`]); this
/// function does not re-check ordering or overlap.
pub fn build_document(
    segments: &[Segment],
    style: &StyleDescriptor,
    play_res_x: u32,
    play_res_y: u32,
) -> Result<String, Error> {
    let mut out = String::new();

    write_script_info(&mut out, play_res_x, play_res_y);
    out.push('\n');
    write_styles(&mut out, style)?;
    out.push('\n');
    write_events(&mut out, segments, style)?;

    // Trim trailing blank line left by the last Dialogue row's `\n`.
    while out.ends_with('\n') {
        out.pop();
    }
    out.push('\n');

    Ok(out)
}

fn write_script_info(out: &mut String, play_res_x: u32, play_res_y: u32) {
    out.push_str("[Script Info]\n");
    out.push_str("ScriptType: v4.00+\n");
    let _ = writeln!(out, "PlayResX: {play_res_x}");
    let _ = writeln!(out, "PlayResY: {play_res_y}");
    out.push_str("WrapStyle: 2\n");
    out.push_str("ScaledBorderAndShadow: yes\n");
}

const STYLE_FIELDS: &str = "Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, \
OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, \
Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

fn write_styles(out: &mut String, style: &StyleDescriptor) -> Result<(), Error> {
    out.push_str("[V4+ Styles]\n");
    let _ = writeln!(out, "Format: {STYLE_FIELDS}");

    let primary = css_hex_to_ass(&style.color, style.opacity)?;
    let outline = css_hex_to_ass(&style.stroke_color, 100)?;
    let bold = if style.bold { -1 } else { 0 };
    let italic = if style.italic { -1 } else { 0 };

    let _ = writeln!(
        out,
        "Style: Default,{},{},{},&H000000FF,{},&H00000000,{},{},0,0,100,100,0,0,1,{},0,{},0,0,0,1",
        style.font_family,
        style.font_size_px,
        primary,
        outline,
        bold,
        italic,
        style.stroke_px,
        style.align.numpad_code(),
    );
    Ok(())
}

fn write_events(out: &mut String, segments: &[Segment], style: &StyleDescriptor) -> Result<(), Error> {
    out.push_str("[Events]\n");
    out.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");

    let prefix = override_prefix(style);
    for segment in segments {
        let start = format_ass_time(segment.start_s);
        let end = format_ass_time(segment.end_s);
        let text = escape_ass_text(&segment.text);
        let _ = writeln!(
            out,
            "Dialogue: 0,{start},{end},Default,,0,0,0,,{prefix}{text}"
        );
    }
    Ok(())
}

/// `{\pos(x,y)\frz<angle>}` — empty when neither an absolute position nor
/// a non-zero rotation is set.
fn override_prefix(style: &StyleDescriptor) -> String {
    let mut tags = String::new();
    if let (Some(x), Some(y)) = (style.pos_x, style.pos_y) {
        let _ = write!(tags, r"\pos({x},{y})");
    }
    if style.rotation != 0 {
        let _ = write!(tags, r"\frz{}", style.rotation);
    }
    if tags.is_empty() {
        String::new()
    } else {
        format!("{{{tags}}}")
    }
}
