//! Advanced SubStation Alpha rendering of subtitle scripts.

use std::fmt::Write;

use super::layout::{ScriptEvent, StyledRun, SubtitleScript};
use super::style::{Anchor, Rgb, RunStyle, ScriptHeader};

/// Format seconds as an ASS timestamp `H:MM:SS.cc`.
pub fn format_timestamp(seconds: f64) -> String {
    let centis = (seconds.max(0.0) * 100.0).round() as u64;
    let hours = centis / 360_000;
    let minutes = (centis / 6_000) % 60;
    let secs = (centis / 100) % 60;
    let cs = centis % 100;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, cs)
}

/// Render a whole script as an `.ass` document.
pub fn render(script: &SubtitleScript) -> String {
    let mut out = render_header(&script.header);
    for event in &script.events {
        out.push_str(&render_event(event));
        out.push('\n');
    }
    out
}

fn render_header(header: &ScriptHeader) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "[Script Info]");
    let _ = writeln!(out, "Title: {}", header.title);
    let _ = writeln!(out, "ScriptType: v4.00+");
    let _ = writeln!(out, "PlayResX: {}", header.width);
    let _ = writeln!(out, "PlayResY: {}", header.height);
    let _ = writeln!(out, "WrapStyle: 0");
    let _ = writeln!(out, "ScaledBorderAndShadow: yes");
    let _ = writeln!(out);
    let _ = writeln!(out, "[V4+ Styles]");
    let _ = writeln!(
        out,
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, \
         Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, \
         Shadow, Alignment, MarginL, MarginR, MarginV, Encoding"
    );
    let _ = writeln!(
        out,
        "Style: Default,{},{},{},{},{},{},{},0,0,0,100,100,0,0,1,{},0,{},{},{},{},1",
        header.font,
        header.font_size,
        style_color(header.primary, 1.0),
        style_color(header.secondary, 1.0),
        style_color(header.outline, 1.0),
        style_color(header.shadow, header.shadow_opacity),
        if header.bold { -1 } else { 0 },
        format_number(header.outline_width),
        alignment(header.anchor),
        header.margin_h,
        header.margin_h,
        header.margin_v,
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "[Events]");
    let _ = writeln!(
        out,
        "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
    );
    out
}

/// Render one `Dialogue:` line.
pub fn render_event(event: &ScriptEvent) -> String {
    let text = event
        .runs
        .iter()
        .map(render_run)
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "Dialogue: 0,{},{},Default,,0,0,0,,{}",
        format_timestamp(event.start),
        format_timestamp(event.end),
        text
    )
}

fn render_run(run: &StyledRun) -> String {
    format!("{}{}", style_override(&run.style), escape_text(&run.text))
}

/// Inline override block for a run style.
pub fn style_override(style: &RunStyle) -> String {
    format!(
        "{{\\1c{}\\alpha{}\\3c{}\\bord{}\\blur{}}}",
        inline_color(style.color),
        inline_alpha(style.opacity),
        inline_color(style.outline_color),
        format_number(style.outline_width),
        format_number(style.blur),
    )
}

/// Numpad-style alignment code.
fn alignment(anchor: Anchor) -> u8 {
    match anchor {
        Anchor::BottomLeft => 1,
        Anchor::BottomCenter => 2,
        Anchor::BottomRight => 3,
        Anchor::MiddleCenter => 5,
        Anchor::TopCenter => 8,
    }
}

/// ASS alpha is inverted: 00 is opaque, FF transparent.
fn alpha_byte(opacity: f32) -> u8 {
    ((1.0 - opacity.clamp(0.0, 1.0)) * 255.0).round() as u8
}

fn style_color(rgb: Rgb, opacity: f32) -> String {
    format!(
        "&H{:02X}{:02X}{:02X}{:02X}",
        alpha_byte(opacity),
        rgb.b,
        rgb.g,
        rgb.r
    )
}

fn inline_color(rgb: Rgb) -> String {
    format!("&H{:02X}{:02X}{:02X}&", rgb.b, rgb.g, rgb.r)
}

fn inline_alpha(opacity: f32) -> String {
    format!("&H{:02X}&", alpha_byte(opacity))
}

fn format_number(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Keep user text from being read as override blocks or line breaks.
fn escape_text(text: &str) -> String {
    text.replace('\\', "\u{29F5}")
        .replace('{', "(")
        .replace('}', ")")
        .replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitles::layout::{uniform_word_timings, KaraokeLayout};

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "0:00:00.00");
        assert_eq!(format_timestamp(1.0), "0:00:01.00");
        assert_eq!(format_timestamp(61.257), "0:01:01.26");
        assert_eq!(format_timestamp(3661.5), "1:01:01.50");
        assert_eq!(format_timestamp(-2.0), "0:00:00.00");
    }

    #[test]
    fn test_style_overrides() {
        assert_eq!(
            style_override(&RunStyle::highlight()),
            "{\\1c&HFFFFFF&\\alpha&H00&\\3c&H000000&\\bord15\\blur5}"
        );
        assert_eq!(
            style_override(&RunStyle::plain()),
            "{\\1c&HFFFFFF&\\alpha&H00&\\3c&H000000&\\bord0\\blur0}"
        );
    }

    #[test]
    fn test_color_byte_order() {
        assert_eq!(inline_color(Rgb::new(0x11, 0x22, 0x33)), "&H332211&");
        assert_eq!(style_color(Rgb::BLACK, 0.5), "&H80000000");
    }

    #[test]
    fn test_render_karaoke_document() {
        let header = ScriptHeader::karaoke(1920, 1080, 130);
        let script = KaraokeLayout::default()
            .script_from_timings(header, &uniform_word_timings("hello world", 0.0, 2.0));
        let doc = render(&script);

        assert!(doc.contains("PlayResX: 1920\n"));
        assert!(doc.contains("PlayResY: 1080\n"));
        assert!(doc.contains(
            "Style: Default,Arial,130,&H00FFFFFF,&H0000FFFF,&H00000000,&H80000000,-1,0,0,0,100,100,0,0,1,0,0,2,10,10,200,1"
        ));

        let dialogues: Vec<&str> = doc.lines().filter(|l| l.starts_with("Dialogue:")).collect();
        assert_eq!(dialogues.len(), 2);
        assert!(dialogues[0].starts_with("Dialogue: 0,0:00:00.00,0:00:01.00,Default,,0,0,0,,"));
        assert!(dialogues[0].ends_with("\\bord15\\blur5}hello {\\1c&HFFFFFF&\\alpha&H00&\\3c&H000000&\\bord0\\blur0}world"));
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a {b}\nc"), "a (b) c");
    }
}
