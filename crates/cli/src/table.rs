//! Plain-text tables for human output. Meter labels are free text, so
//! widths are measured in display columns rather than bytes.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Widest a text column may grow before labels are truncated.
const MAX_TEXT_WIDTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Right,
}

pub(crate) struct Table {
    headers: Vec<&'static str>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub(crate) fn new(columns: &[(&'static str, Align)]) -> Self {
        Self {
            headers: columns.iter().map(|(h, _)| *h).collect(),
            align: columns.iter().map(|(_, a)| *a).collect(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn row(&mut self, cells: Vec<String>) {
        debug_assert_eq!(cells.len(), self.headers.len());
        self.rows.push(cells);
    }

    pub(crate) fn render(&self) -> String {
        let widths: Vec<usize> = (0..self.headers.len())
            .map(|c| {
                let widest = self
                    .rows
                    .iter()
                    .map(|r| UnicodeWidthStr::width(r[c].as_str()))
                    .chain(std::iter::once(self.headers[c].len()))
                    .max()
                    .unwrap_or(0);
                match self.align[c] {
                    Align::Left => widest.min(MAX_TEXT_WIDTH),
                    Align::Right => widest,
                }
            })
            .collect();

        let mut out = String::new();
        let header: Vec<String> = self.headers.iter().map(|h| h.to_string()).collect();
        self.push_line(&mut out, &header, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        self.push_line(&mut out, &rule, &widths);
        for row in &self.rows {
            self.push_line(&mut out, row, &widths);
        }
        out
    }

    fn push_line(&self, out: &mut String, cells: &[String], widths: &[usize]) {
        let line: Vec<String> = cells
            .iter()
            .zip(widths)
            .zip(&self.align)
            .map(|((cell, &w), align)| match align {
                Align::Left => pad_right(cell, w),
                Align::Right => pad_left(cell, w),
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
}

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .next()
            .filter(|ch| ch.width().unwrap_or(0) <= width)
            .map(String::from)
            .unwrap_or_default();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = ch.width().unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }

    format!("{}..", &s[..end_byte])
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = UnicodeWidthStr::width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

pub(crate) fn pad_left(s: &str, width: usize) -> String {
    let sw = UnicodeWidthStr::width(s);
    if sw >= width {
        s.to_string()
    } else {
        format!("{}{}", " ".repeat(width - sw), s)
    }
}

/// Volume with two decimals and thousands separators: `12345.5` -> `12,345.50`.
pub(crate) fn fmt_volume(v: f64) -> String {
    let fixed = format!("{:.2}", v.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if v < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

pub(crate) fn fmt_pct(p: f64) -> String {
    format!("{p:.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_fits() {
        assert_eq!(truncate_display("abc", 5), "abc");
        assert_eq!(truncate_display("abc", 3), "abc");
    }

    #[test]
    fn truncate_cuts() {
        assert_eq!(truncate_display("abcdef", 5), "abc..");
        assert_eq!(truncate_display("abc", 2), "a");
    }

    #[test]
    fn truncate_wide_chars() {
        // "世界你好" is 8 display columns
        let t = truncate_display("\u{4e16}\u{754c}\u{4f60}\u{597d}", 6);
        assert_eq!(t, "\u{4e16}\u{754c}..");
    }

    #[test]
    fn padding() {
        assert_eq!(pad_right("ab", 5), "ab   ");
        assert_eq!(pad_right("abcdef", 5), "abc..");
        assert_eq!(pad_left("12", 5), "   12");
        assert_eq!(pad_left("123456", 5), "123456");
    }

    #[test]
    fn volumes() {
        assert_eq!(fmt_volume(0.0), "0.00");
        assert_eq!(fmt_volume(999.0), "999.00");
        assert_eq!(fmt_volume(1000.0), "1,000.00");
        assert_eq!(fmt_volume(1234567.891), "1,234,567.89");
        assert_eq!(fmt_volume(-12.0), "-12.00");
        assert_eq!(fmt_volume(-0.001), "0.00");
    }

    #[test]
    fn percentages() {
        assert_eq!(fmt_pct(12.5), "12.5%");
        assert_eq!(fmt_pct(-25.0), "-25.0%");
    }

    #[test]
    fn render_aligns_columns() {
        let mut table = Table::new(&[("zone", Align::Left), ("loss", Align::Right)]);
        table.row(vec!["Z3".into(), "120.00".into()]);
        table.row(vec!["Zone 10".into(), "5.00".into()]);
        let out = table.render();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "zone       loss");
        assert_eq!(lines[1], "-------  ------");
        assert_eq!(lines[2], "Z3       120.00");
        assert_eq!(lines[3], "Zone 10    5.00");
    }
}
