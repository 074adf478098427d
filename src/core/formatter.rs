//! Line rendering
//!
//! [`Formatter`] turns an already stringified message into the final printable line. It has two
//! surfaces:
//!
//! - terminal: one string with escape sequences embedded inline
//! - rich console: a `%c` template plus one CSS declaration per styled segment ([`ConsoleLine`])
//!
//! Callers may embed inline color markers, `<<c:COLOR>>text<</c>>`, which both surfaces split
//! into separately styled spans.

use super::color::{paint_with, ColorResolver};
use super::config::Config;
use super::error_cache::ErrorReport;
use super::log_level::LogLevel;
use super::log_record::LogOptions;
use super::timestamp::short_timestamp_now;
use serde::Serialize;

/// Color of the `[HH:MM:SS]` segment
pub const TIMESTAMP_COLOR: &str = "#888888";

/// Column width of the level segment; fits `[SUCCESS]`
pub const LEVEL_COLUMN_WIDTH: usize = 9;

const STACK_HEADER_COLOR: &str = "#ff8888";
const STACK_COLOR: &str = "#ffaaaa";

const MARKER_OPEN: &str = "<<c:";
const MARKER_OPEN_END: &str = ">>";
const MARKER_CLOSE: &str = "<</c>>";

/// Rich-console rendering: `template` holds one `%c` per entry of `styles`
///
/// A literal `%` in the text is written as `%%`, so the placeholders always match `styles`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsoleLine {
    pub template: String,
    pub styles: Vec<String>,
}

impl ConsoleLine {
    fn push(&mut self, text: &str, style: String) {
        self.template.push_str("%c");
        self.template.push_str(&text.replace('%', "%%"));
        self.styles.push(style);
    }

    /// Number of `%c` placeholders, not counting escaped `%%c`
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let mut chars = self.template.chars();
        while let Some(c) = chars.next() {
            if c == '%' && chars.next() == Some('c') {
                count += 1;
            }
        }
        count
    }

    /// Visible text with every placeholder removed
    pub fn plain_text(&self) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut chars = self.template.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('%') => out.push('%'),
                Some('c') | None => {}
                Some(other) => {
                    out.push('%');
                    out.push(other);
                }
            }
        }
        out
    }
}

/// One span of a message after inline markers are split out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t> {
    Plain(&'t str),
    Colored { color: &'t str, text: &'t str },
}

/// Split `<<c:COLOR>>text<</c>>` markers out of `text`
///
/// Markers do not nest. An unterminated marker is kept as plain text.
pub fn parse_markers(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(MARKER_OPEN) {
        let after_open = &rest[start + MARKER_OPEN.len()..];
        let Some(color_end) = after_open.find(MARKER_OPEN_END) else {
            break;
        };
        let body = &after_open[color_end + MARKER_OPEN_END.len()..];
        let Some(close) = body.find(MARKER_CLOSE) else {
            break;
        };

        if start > 0 {
            segments.push(Segment::Plain(&rest[..start]));
        }
        segments.push(Segment::Colored {
            color: after_open[..color_end].trim(),
            text: &body[..close],
        });
        rest = &body[close + MARKER_CLOSE.len()..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Plain(rest));
    }
    segments
}

/// Wrap `text` in an inline color marker
pub fn markup(text: &str, color: &str) -> String {
    format!("{}{}{}{}{}", MARKER_OPEN, color, MARKER_OPEN_END, text, MARKER_CLOSE)
}

pub struct Formatter<'a> {
    config: &'a Config,
    colors: &'a mut ColorResolver,
}

impl<'a> Formatter<'a> {
    pub fn new(config: &'a Config, colors: &'a mut ColorResolver) -> Self {
        Self { config, colors }
    }

    /// Map a level name to that level's configured color; other tokens pass through
    pub fn color_token(&self, token: &str) -> String {
        match token.parse::<LogLevel>() {
            Ok(level) => self.config.color_for(level).to_string(),
            Err(_) => token.to_string(),
        }
    }

    fn message_color(&self, level: LogLevel, options: &LogOptions) -> String {
        match options.color.as_deref() {
            Some(token) => self.color_token(token),
            None => self.config.color_for(level).to_string(),
        }
    }

    fn show_timestamp(&self, options: &LogOptions) -> bool {
        options.show_timestamp.unwrap_or(self.config.show_timestamp)
    }

    fn show_level(&self, options: &LogOptions) -> bool {
        options.show_level.unwrap_or(self.config.show_level)
    }

    fn level_tag(level: LogLevel) -> String {
        format!(
            "{:<width$}",
            format!("[{}]", level.tag()),
            width = LEVEL_COLUMN_WIDTH
        )
    }

    /// Paint `text` in `token`, accepting level names as tokens
    pub fn paint(&mut self, text: &str, token: &str) -> String {
        let token = self.color_token(token);
        self.colors.paint(text, &token)
    }

    /// Expand inline markers into painted spans
    pub fn expand_markers(&mut self, text: &str) -> String {
        if !text.contains(MARKER_OPEN) {
            return text.to_string();
        }
        parse_markers(text)
            .into_iter()
            .map(|segment| match segment {
                Segment::Plain(text) => text.to_string(),
                Segment::Colored { color, text } => self.paint(text, color),
            })
            .collect()
    }

    /// Terminal line: `[HH:MM:SS] [LEVEL]   message`, each segment optional except the message
    pub fn format(&mut self, message: &str, level: LogLevel, options: &LogOptions) -> String {
        let mut parts = Vec::with_capacity(3);

        if self.show_timestamp(options) {
            let stamp = format!("[{}]", short_timestamp_now());
            parts.push(self.colors.paint(&stamp, TIMESTAMP_COLOR));
        }
        if self.show_level(options) {
            let level_color = self.config.color_for(level).to_string();
            parts.push(self.colors.paint(&Self::level_tag(level), &level_color));
        }

        let color = self.message_color(level, options);
        let body = self.expand_markers(message);
        let code = self.colors.resolve(&color);
        parts.push(paint_with(&body, &code));

        parts.join(" ")
    }

    /// Rich-console line with one style per segment
    pub fn format_console(
        &mut self,
        message: &str,
        level: LogLevel,
        options: &LogOptions,
    ) -> ConsoleLine {
        let mut line = ConsoleLine::default();

        if self.show_timestamp(options) {
            let stamp = format!("[{}] ", short_timestamp_now());
            line.push(&stamp, self.colors.css(TIMESTAMP_COLOR));
        }
        if self.show_level(options) {
            let tag = format!("{} ", Self::level_tag(level));
            line.push(&tag, self.colors.css(self.config.color_for(level)));
        }

        let message_style = self.colors.css(&self.message_color(level, options));
        for segment in parse_markers(message) {
            match segment {
                Segment::Plain(text) => line.push(text, message_style.clone()),
                Segment::Colored { color, text } => {
                    let style = self.colors.css(&self.color_token(color));
                    line.push(text, style);
                }
            }
        }
        if line.styles.is_empty() {
            line.push("", message_style);
        }
        line
    }

    /// Multi-line error block: name, message and, when present, the cleaned stack
    pub fn format_error(&mut self, report: &ErrorReport) -> String {
        let error_color = self.config.color_for(LogLevel::Error).to_string();
        let mut lines = vec![
            self.colors.paint(&format!("Error: {}", report.kind), &error_color),
            self.colors
                .paint(&format!("Message: {}", report.message), &error_color),
        ];

        if let Some(stack) = report.clean_stack().filter(|s| !s.is_empty()) {
            lines.push(self.colors.paint("Stack Trace:", STACK_HEADER_COLOR));
            lines.push(self.colors.paint(&format!("  {}", stack), STACK_COLOR));
        }
        lines.join("\n")
    }

    pub fn format_error_console(&mut self, report: &ErrorReport) -> ConsoleLine {
        let error_style = self.colors.css(self.config.color_for(LogLevel::Error));
        let mut line = ConsoleLine::default();
        line.push(&format!("Error: {}\n", report.kind), error_style.clone());
        line.push(&format!("Message: {}", report.message), error_style);

        if let Some(stack) = report.clean_stack().filter(|s| !s.is_empty()) {
            line.push("\nStack Trace:\n", self.colors.css(STACK_HEADER_COLOR));
            line.push(&format!("  {}", stack), self.colors.css(STACK_COLOR));
        }
        line
    }
}
