//! Styles for the arbor CLI.
//!
//! Rendering code asks for styles by meaning (a path, a tag, a row that is
//! only shown because something below it matched), never for raw colours.
//! Row colours are the one exception: they come from the outline itself and
//! are mapped from the palette's hex values onto the 256-colour cube.
//!
//! `console` drops all styling when stdout is not a terminal, so piped
//! output and tests see plain text.

use arborapp::model::Color;
use console::Style;
use once_cell::sync::Lazy;

pub struct Styles {
    pub path: Style,
    pub id: Style,
    pub muted: Style,
    /// Rows shown only to lead to a match.
    pub context: Style,
    pub tag: Style,
    pub done: Style,
    pub project: Style,
    pub success: Style,
    pub warning: Style,
}

pub static STYLES: Lazy<Styles> = Lazy::new(|| {
    let muted = Style::new().color256(rgb_to_ansi256((140, 140, 140)));
    Styles {
        path: Style::new().color256(rgb_to_ansi256((196, 140, 0))),
        id: muted.clone().italic(),
        context: muted.clone(),
        tag: Style::new().cyan(),
        done: muted.clone().strikethrough(),
        project: Style::new().bold(),
        success: Style::new().green(),
        warning: Style::new().yellow().bold(),
        muted,
    }
});

/// Foreground style for a row colour. `None` for uncoloured rows.
pub fn row_color(color: Color) -> Option<Style> {
    let hex = color.hex()?;
    let rgb = parse_hex(hex)?;
    Some(Style::new().color256(rgb_to_ansi256(rgb)))
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Nearest entry of the xterm 6x6x6 colour cube.
pub fn rgb_to_ansi256((r, g, b): (u8, u8, u8)) -> u8 {
    let level = |c: u8| -> u8 {
        if c < 48 {
            0
        } else if c < 115 {
            1
        } else {
            (c - 35) / 40
        }
    };
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_corners() {
        assert_eq!(rgb_to_ansi256((0, 0, 0)), 16);
        assert_eq!(rgb_to_ansi256((255, 255, 255)), 231);
        assert_eq!(rgb_to_ansi256((255, 0, 0)), 196);
    }

    #[test]
    fn palette_colours_have_styles() {
        assert!(row_color(Color::Red).is_some());
        assert!(row_color(Color::NoColor).is_none());
    }

    #[test]
    fn rejects_bad_hex() {
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("123456"), None);
        assert_eq!(parse_hex("#a0b0c0"), Some((0xa0, 0xb0, 0xc0)));
    }
}
