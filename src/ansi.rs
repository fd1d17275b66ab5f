//! ANSI escape sequence handling for the log pane.
//!
//! Children run with `FORCE_COLOR` set, so their output carries SGR color
//! codes. This module converts a raw line into Ratatui spans instead of
//! letting control bytes leak into the frame. Non-SGR CSI sequences and OSC
//! sequences are dropped; a carriage return keeps only the final segment of
//! the line, matching how a real terminal would have overwritten it.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

/// Converts one line of raw child output into styled spans.
pub fn styled_spans(line: &str) -> Vec<Span<'static>> {
    let chars: Vec<char> = line.chars().collect();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut text = String::new();
    let mut sgr = Sgr::default();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\x1b' if chars.get(i + 1) == Some(&'[') => {
                let (params, end) = take_csi(&chars, i + 2);
                if chars.get(end) == Some(&'m') {
                    push_span(&mut spans, &mut text, &sgr);
                    sgr.apply(&params);
                }
                i = end + 1;
            }
            '\x1b' if chars.get(i + 1) == Some(&']') => {
                i = skip_osc(&chars, i + 2);
            }
            '\x1b' => i += 1,
            '\r' => {
                // Overwritten from the line start; drop what came before.
                text.clear();
                spans.clear();
                i += 1;
            }
            ch => {
                text.push(ch);
                i += 1;
            }
        }
    }
    push_span(&mut spans, &mut text, &sgr);
    spans
}

fn push_span(spans: &mut Vec<Span<'static>>, text: &mut String, sgr: &Sgr) {
    if !text.is_empty() {
        spans.push(Span::styled(std::mem::take(text), sgr.style()));
    }
}

// Collects CSI parameter values up to (not including) the final byte.
fn take_csi(chars: &[char], mut i: usize) -> (Vec<u16>, usize) {
    let mut params = Vec::new();
    let mut current: Option<u16> = None;
    while i < chars.len() && !('\u{40}'..='\u{7e}').contains(&chars[i]) {
        match chars[i] {
            '0'..='9' => {
                let digit = chars[i] as u16 - '0' as u16;
                current = Some(current.unwrap_or(0).saturating_mul(10).saturating_add(digit));
            }
            ';' => {
                params.push(current.take().unwrap_or(0));
            }
            _ => {}
        }
        i += 1;
    }
    params.push(current.unwrap_or(0));
    (params, i)
}

// OSC payloads end with BEL or ESC-backslash.
fn skip_osc(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() {
        if chars[i] == '\x07' {
            return i + 1;
        }
        if chars[i] == '\x1b' && chars.get(i + 1) == Some(&'\\') {
            return i + 2;
        }
        i += 1;
    }
    i
}

/// Accumulated SGR state for the line being converted.
#[derive(Debug, Default, Clone)]
struct Sgr {
    fg: Option<Color>,
    bg: Option<Color>,
    modifiers: Modifier,
}

impl Sgr {
    fn style(&self) -> Style {
        let mut style = Style::default();
        if let Some(fg) = self.fg {
            style = style.fg(fg);
        }
        if let Some(bg) = self.bg {
            style = style.bg(bg);
        }
        style.add_modifier(self.modifiers)
    }

    fn apply(&mut self, params: &[u16]) {
        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => *self = Sgr::default(),
                1 => self.modifiers |= Modifier::BOLD,
                2 => self.modifiers |= Modifier::DIM,
                3 => self.modifiers |= Modifier::ITALIC,
                4 => self.modifiers |= Modifier::UNDERLINED,
                7 => self.modifiers |= Modifier::REVERSED,
                9 => self.modifiers |= Modifier::CROSSED_OUT,
                22 => self.modifiers &= !(Modifier::BOLD | Modifier::DIM),
                23 => self.modifiers &= !Modifier::ITALIC,
                24 => self.modifiers &= !Modifier::UNDERLINED,
                27 => self.modifiers &= !Modifier::REVERSED,
                29 => self.modifiers &= !Modifier::CROSSED_OUT,
                30..=37 => self.fg = Some(palette(params[i] - 30, false)),
                39 => self.fg = None,
                40..=47 => self.bg = Some(palette(params[i] - 40, false)),
                49 => self.bg = None,
                90..=97 => self.fg = Some(palette(params[i] - 90, true)),
                100..=107 => self.bg = Some(palette(params[i] - 100, true)),
                38 | 48 => {
                    let target_fg = params[i] == 38;
                    let Some((color, used)) = extended_color(&params[i + 1..]) else {
                        break;
                    };
                    if target_fg {
                        self.fg = Some(color);
                    } else {
                        self.bg = Some(color);
                    }
                    i += used;
                }
                _ => {}
            }
            i += 1;
        }
    }
}

fn extended_color(params: &[u16]) -> Option<(Color, usize)> {
    match params.first()? {
        5 => {
            let index = u8::try_from(*params.get(1)?).ok()?;
            Some((Color::Indexed(index), 2))
        }
        2 => {
            let r = u8::try_from(*params.get(1)?).ok()?;
            let g = u8::try_from(*params.get(2)?).ok()?;
            let b = u8::try_from(*params.get(3)?).ok()?;
            Some((Color::Rgb(r, g, b), 4))
        }
        _ => None,
    }
}

fn palette(index: u16, bright: bool) -> Color {
    match (index, bright) {
        (0, false) => Color::Black,
        (1, false) => Color::Red,
        (2, false) => Color::Green,
        (3, false) => Color::Yellow,
        (4, false) => Color::Blue,
        (5, false) => Color::Magenta,
        (6, false) => Color::Cyan,
        (7, false) => Color::Gray,
        (0, true) => Color::DarkGray,
        (1, true) => Color::LightRed,
        (2, true) => Color::LightGreen,
        (3, true) => Color::LightYellow,
        (4, true) => Color::LightBlue,
        (5, true) => Color::LightMagenta,
        (6, true) => Color::LightCyan,
        _ => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_yields_one_unstyled_span() {
        let spans = styled_spans("hello");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "hello");
        assert_eq!(spans[0].style.fg, None);
    }

    #[test]
    fn sgr_color_and_reset_split_spans() {
        let spans = styled_spans("\u{1b}[31mred\u{1b}[0m plain");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].content, "red");
        assert_eq!(spans[0].style.fg, Some(Color::Red));
        assert_eq!(spans[1].content, " plain");
        assert_eq!(spans[1].style.fg, None);
    }

    #[test]
    fn bright_and_extended_colors() {
        let spans = styled_spans("\u{1b}[92mok\u{1b}[38;5;120mx\u{1b}[38;2;9;8;7my");
        assert_eq!(spans[0].style.fg, Some(Color::LightGreen));
        assert_eq!(spans[1].style.fg, Some(Color::Indexed(120)));
        assert_eq!(spans[2].style.fg, Some(Color::Rgb(9, 8, 7)));
    }

    #[test]
    fn bold_combines_with_color() {
        let spans = styled_spans("\u{1b}[1;33mwarn");
        assert_eq!(spans[0].style.fg, Some(Color::Yellow));
        assert!(spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn non_sgr_sequences_are_dropped() {
        let spans = styled_spans("a\u{1b}[2Kb\u{1b}]0;title\u{7}c");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "abc");
    }

    #[test]
    fn carriage_return_keeps_the_last_segment() {
        let spans = styled_spans("10%\r20%\rdone");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "done");
    }
}
