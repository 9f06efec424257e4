//! Pure text layout for progress frames.
//!
//! Nothing in here touches shared state or the terminal. The engine samples the
//! progress state, hands the numbers to these functions and writes whatever comes
//! back, which keeps every formatting rule testable without a terminal.

use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Columns kept free for the `] NNN% (speed it/s)` suffix of a bar line.
pub const BAR_SUFFIX_RESERVE: usize = 20;

/// Braille animation used when the terminal can display it.
pub const UNICODE_SPINNER: &[&str] = &[
    "⠋", "⠙", "⠚", "⠒", "⠂", "⠂", "⠒", "⠲", "⠴", "⠦", "⠖", "⠒", "⠐", "⠐", "⠒", "⠓", "⠋",
];

/// Fallback animation for consoles without Unicode glyphs.
pub const ASCII_SPINNER: &[&str] = &["\\", "|", "/", "-"];

const ELLIPSIS: &str = "...";

/// Renders the body of a bounded bar, exactly `width` columns wide.
///
/// The filled part is drawn with `=` and ends in a `>` marker; at 100% the marker is
/// dropped and the bar is solid. Widths below one are raised to one so the marker
/// always has somewhere to go, and percentages above 100 are treated as 100.
#[must_use]
pub fn render_bar(percentage: u8, width: usize) -> String {
    let width = width.max(1);
    let percentage = usize::from(percentage.min(100));

    if percentage == 100 {
        return "=".repeat(width);
    }

    let filled = percentage * width / 100;
    let mut bar = String::with_capacity(width);
    bar.push_str(&"=".repeat(filled.saturating_sub(1)));
    bar.push('>');
    while bar.len() < width {
        bar.push(' ');
    }
    bar
}

/// Returns the spinner glyph for `phase`.
///
/// The phase wraps around the sequence, so callers can simply keep counting.
#[must_use]
pub fn render_spinner(phase: usize, unicode: bool) -> &'static str {
    let frames = spinner_frames(unicode);
    frames[phase % frames.len()]
}

/// The glyph sequence the spinner cycles through.
#[must_use]
pub const fn spinner_frames(unicode: bool) -> &'static [&'static str] {
    if unicode { UNICODE_SPINNER } else { ASCII_SPINNER }
}

/// Formats a throughput value in items per second.
///
/// Below 100 one decimal place is kept; from 100 upwards the value is rounded to a
/// whole number. Non-finite or negative input is shown as zero.
#[must_use]
pub fn format_speed(value: f64) -> String {
    let value = if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    };

    if value < 100.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.0}")
    }
}

/// Shortens a status line to at most `max_width` display columns.
///
/// A width of three columns or less only has room for the ellipsis, so `...` is
/// returned whatever the input. Otherwise text that already fits is returned
/// untouched, and longer text keeps whole words while they fit into
/// `max_width - 3` columns before `...` is appended.
#[must_use]
pub fn truncate_status(text: &str, max_width: usize) -> Cow<'_, str> {
    if max_width <= ELLIPSIS.len() {
        return Cow::Borrowed(ELLIPSIS);
    }
    if text.width() <= max_width {
        return Cow::Borrowed(text);
    }

    let budget = max_width - ELLIPSIS.len();
    let mut out = String::with_capacity(max_width);
    let mut used = 0;

    for word in text.split_whitespace() {
        let gap = usize::from(!out.is_empty());
        let needed = gap + word.width();
        if used + needed > budget {
            break;
        }
        if gap == 1 {
            out.push(' ');
        }
        out.push_str(word);
        used += needed;
    }

    out.push_str(ELLIPSIS);
    Cow::Owned(out)
}

/// Builds the full interactive bar line: `[bar] NNN% (speed it/s)`.
///
/// The bar takes whatever the terminal width leaves after [`BAR_SUFFIX_RESERVE`].
#[must_use]
pub fn bar_line(percentage: u8, speed: f64, terminal_width: usize) -> String {
    let bar = render_bar(
        percentage,
        terminal_width.saturating_sub(BAR_SUFFIX_RESERVE),
    );
    let line = format!(
        "[{bar}] {:>3}% ({} it/s)",
        percentage.min(100),
        format_speed(speed)
    );
    fit_line(line, terminal_width)
}

/// Builds the full interactive spinner line: `glyph (speed it/s)`.
#[must_use]
pub fn spinner_line(phase: usize, unicode: bool, speed: f64, terminal_width: usize) -> String {
    let line = format!(
        "{} ({} it/s)",
        render_spinner(phase, unicode),
        format_speed(speed)
    );
    fit_line(line, terminal_width)
}

/// Builds one line-mode record: `NNN% (speed it/s)`, without the percentage for spinners.
#[must_use]
pub fn log_line(percentage: Option<u8>, speed: f64) -> String {
    let speed = format_speed(speed);
    match percentage {
        Some(percentage) => format!("{:>3}% ({speed} it/s)", percentage.min(100)),
        None => format!("({speed} it/s)"),
    }
}

/// A run of spaces that blanks one terminal row without wrapping.
#[must_use]
pub fn blank_line(terminal_width: usize) -> String {
    " ".repeat(terminal_width.saturating_sub(1))
}

// Fits a line into one column short of the terminal width: longer lines are cut so
// the terminal never wraps them, shorter ones are padded so stale characters from a
// longer previous frame are overwritten.
fn fit_line(line: String, terminal_width: usize) -> String {
    let target = terminal_width.saturating_sub(1);
    let width = line.width();
    if width > target {
        let mut used = 0;
        let mut cut = String::with_capacity(target);
        for ch in line.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > target {
                break;
            }
            cut.push(ch);
            used += w;
        }
        return cut;
    }
    let mut line = line;
    line.push_str(&" ".repeat(target - width));
    line
}
