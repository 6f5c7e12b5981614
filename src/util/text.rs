use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate to at most `max_cells` cells, ending in `…` when cut.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    let budget = max_cells - 1;
    let mut width = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let gw = UnicodeWidthStr::width(g);
        if width + gw > budget {
            break;
        }
        width += gw;
        out.push_str(g);
    }
    out.push('\u{2026}');
    out
}

/// Truncate or pad with spaces to exactly `cells` cells, left-aligned
pub fn fit_left(s: &str, cells: usize) -> String {
    let mut out = truncate_to_width(s, cells);
    let w = display_width(&out);
    out.extend(std::iter::repeat_n(' ', cells.saturating_sub(w)));
    out
}

/// Truncate or pad with spaces to exactly `cells` cells, right-aligned
pub fn fit_right(s: &str, cells: usize) -> String {
    let out = truncate_to_width(s, cells);
    let w = display_width(&out);
    format!("{}{}", " ".repeat(cells.saturating_sub(w)), out)
}

/// Remove the last grapheme (backspace)
pub fn pop_grapheme(s: &mut String) {
    if let Some((idx, _)) = s.grapheme_indices(true).next_back() {
        s.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_counts_wide_chars() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("日本"), 4);
    }

    #[test]
    fn truncation_adds_ellipsis() {
        assert_eq!(truncate_to_width("Laptop Pro", 20), "Laptop Pro");
        assert_eq!(truncate_to_width("Laptop Pro", 6), "Lapto…");
        assert_eq!(truncate_to_width("日本語", 4), "日…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn fitting_pads_both_ways() {
        assert_eq!(fit_left("ab", 4), "ab  ");
        assert_eq!(fit_right("ab", 4), "  ab");
        assert_eq!(fit_left("abcdef", 4), "abc…");
    }

    #[test]
    fn backspace_removes_whole_grapheme() {
        let mut s = String::from("cafe\u{301}");
        pop_grapheme(&mut s);
        assert_eq!(s, "caf");
        let mut empty = String::new();
        pop_grapheme(&mut empty);
        assert_eq!(empty, "");
    }
}
