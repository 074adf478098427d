//! Color token resolution
//!
//! Turns color tokens (`#rgb`, `#rrggbb`, `rgb(r, g, b)` or a registered name) into terminal
//! escape sequences or CSS style declarations. Resolved escapes are memoized per token.

use super::error::{LoggerError, Result};
use std::collections::HashMap;
use std::io::IsTerminal;
use std::sync::OnceLock;

/// SGR reset sequence
pub const RESET: &str = "\x1b[0m";

/// Built-in palette the registry starts from
const DEFAULT_COLOR_NAMES: [(&str, &str); 19] = [
    ("black", "#000000"),
    ("red", "#ff0000"),
    ("green", "#00ff00"),
    ("yellow", "#ffff00"),
    ("blue", "#0000ff"),
    ("magenta", "#ff00ff"),
    ("cyan", "#00ffff"),
    ("white", "#ffffff"),
    ("gray", "#808080"),
    ("grey", "#808080"),
    ("orange", "#ffa500"),
    ("purple", "#800080"),
    ("pink", "#ffc0cb"),
    ("brown", "#a52a2a"),
    ("lime", "#00ff00"),
    ("navy", "#000080"),
    ("teal", "#008080"),
    ("olive", "#808000"),
    ("maroon", "#800000"),
];

/// Color depth the terminal surface can display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSupport {
    /// No styling at all
    None,
    /// xterm 256-color palette
    Ansi256,
    /// 24-bit color
    TrueColor,
}

static DETECTED_SUPPORT: OnceLock<ColorSupport> = OnceLock::new();

/// Environment inputs of color capability detection
#[derive(Debug, Clone, Default)]
pub struct ColorEnv {
    pub no_color: bool,
    pub force_color: Option<String>,
    pub colorterm: Option<String>,
    pub term: Option<String>,
    pub is_terminal: bool,
}

impl ColorEnv {
    /// Snapshot the current process environment
    pub fn capture() -> Self {
        Self {
            no_color: std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()),
            force_color: std::env::var("FORCE_COLOR")
                .ok()
                .or_else(|| std::env::var("CLICOLOR_FORCE").ok()),
            colorterm: std::env::var("COLORTERM").ok(),
            term: std::env::var("TERM").ok(),
            is_terminal: std::io::stdout().is_terminal(),
        }
    }
}

impl ColorSupport {
    /// Inspect the process environment once; later calls return the memoized answer
    pub fn detect() -> Self {
        *DETECTED_SUPPORT.get_or_init(|| Self::from_env(&ColorEnv::capture()))
    }

    /// Decide the color depth from an environment snapshot
    pub fn from_env(env: &ColorEnv) -> Self {
        let truecolor_advertised = env
            .colorterm
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("truecolor") || v.eq_ignore_ascii_case("24bit"));

        if let Some(force) = env.force_color.as_deref() {
            return match force.trim() {
                "0" | "false" => ColorSupport::None,
                "3" => ColorSupport::TrueColor,
                _ if truecolor_advertised => ColorSupport::TrueColor,
                _ => ColorSupport::Ansi256,
            };
        }

        if env.no_color {
            return ColorSupport::None;
        }

        let term = env.term.as_deref().unwrap_or("");
        if term == "dumb" || !env.is_terminal {
            return ColorSupport::None;
        }
        if truecolor_advertised {
            ColorSupport::TrueColor
        } else if term.contains("256") || term.contains("color") {
            ColorSupport::Ansi256
        } else {
            ColorSupport::TrueColor
        }
    }
}

/// An (r, g, b) triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb`
    pub fn from_hex(token: &str) -> Option<Self> {
        let digits = token.strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            3 => {
                let expand = |i: usize| channel(digits[i..=i].repeat(2).as_str());
                Some(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Some(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            _ => None,
        }
    }

    /// Parse `rgb(r, g, b)` with each channel in 0..=255
    pub fn from_rgb_fn(token: &str) -> Option<Self> {
        let inner = token.strip_prefix("rgb(")?.strip_suffix(')')?;
        let mut channels = inner.split(',').map(|part| part.trim().parse::<u8>().ok());
        let rgb = Self::new(channels.next()??, channels.next()??, channels.next()??);
        if channels.next().is_some() {
            return None;
        }
        Some(rgb)
    }

    /// Parse either literal form
    pub fn parse(token: &str) -> Option<Self> {
        if token.starts_with('#') {
            Self::from_hex(token)
        } else if token.starts_with("rgb(") {
            Self::from_rgb_fn(token)
        } else {
            None
        }
    }

    /// Nearest entry of the 6x6x6 color cube (rounded, not truncated)
    pub fn to_ansi256(self) -> u8 {
        let level = |c: u8| (f64::from(c) / 255.0 * 5.0).round() as u8;
        16 + 36 * level(self.r) + 6 * level(self.g) + level(self.b)
    }

    fn escape(self, support: ColorSupport) -> String {
        match support {
            ColorSupport::None => String::new(),
            ColorSupport::Ansi256 => format!("\x1b[38;5;{}m", self.to_ansi256()),
            ColorSupport::TrueColor => truecolor_escape(self),
        }
    }
}

#[cfg(feature = "console")]
fn truecolor_escape(rgb: Rgb) -> String {
    let color = colored::Color::TrueColor {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    };
    format!("\x1b[{}m", color.to_fg_str())
}

#[cfg(not(feature = "console"))]
fn truecolor_escape(rgb: Rgb) -> String {
    format!("\x1b[38;2;{};{};{}m", rgb.r, rgb.g, rgb.b)
}

fn cache_key(token: &str) -> String {
    token.trim().to_lowercase()
}

/// Resolves color tokens to styling, with a mutable name registry and a per-token cache
#[derive(Debug, Clone)]
pub struct ColorResolver {
    registry: HashMap<String, String>,
    cache: HashMap<String, String>,
    support: Option<ColorSupport>,
}

impl ColorResolver {
    /// Resolver that detects terminal support on first use
    pub fn new() -> Self {
        Self {
            registry: DEFAULT_COLOR_NAMES
                .iter()
                .map(|(name, hex)| (name.to_string(), hex.to_string()))
                .collect(),
            cache: HashMap::new(),
            support: None,
        }
    }

    /// Resolver with a fixed color depth, bypassing environment detection
    pub fn with_support(support: ColorSupport) -> Self {
        Self {
            support: Some(support),
            ..Self::new()
        }
    }

    pub fn support(&self) -> ColorSupport {
        self.support.unwrap_or_else(ColorSupport::detect)
    }

    /// Override the color depth; clears every cached escape
    pub fn set_support(&mut self, support: ColorSupport) {
        self.support = Some(support);
        self.cache.clear();
    }

    /// Map a token to an (r, g, b) triple without touching the cache
    pub fn to_rgb(&self, token: &str) -> Option<Rgb> {
        let token = token.trim();
        Rgb::parse(token).or_else(|| {
            self.registry
                .get(&token.to_lowercase())
                .and_then(|value| Rgb::parse(value))
        })
    }

    /// Whether a token is a literal color or a registered name
    pub fn is_known(&self, token: &str) -> bool {
        self.to_rgb(token).is_some()
    }

    pub fn has_color(&self, name: &str) -> bool {
        self.registry.contains_key(&name.to_lowercase())
    }

    /// Escape sequence for `token`; empty when it cannot be styled
    pub fn resolve(&mut self, token: &str) -> String {
        let key = cache_key(token);
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let support = self.support();
        let escape = match support {
            ColorSupport::None => String::new(),
            _ => self
                .to_rgb(&key)
                .map(|rgb| rgb.escape(support))
                .unwrap_or_default(),
        };
        self.cache.insert(key, escape.clone());
        escape
    }

    /// Wrap `text` in `token`'s color
    ///
    /// Every reset already inside `text` is followed by the outer color again, so
    /// pre-colored spans do not leave the rest of the text unstyled.
    pub fn paint(&mut self, text: &str, token: &str) -> String {
        let code = self.resolve(token);
        paint_with(text, &code)
    }

    /// Register or override a named color
    pub fn add_custom_color(&mut self, name: &str, color: &str) -> Result<()> {
        let name = name.trim();
        let color = color.trim();
        if name.is_empty() || color.is_empty() {
            return Err(LoggerError::config("colors", "color name and value must be non-empty"));
        }
        if Rgb::parse(color).is_none() {
            return Err(LoggerError::config(
                "colors",
                format!("'{}' is not a hex or rgb() color", color),
            ));
        }

        let key = name.to_lowercase();
        if let Some(previous) = self.registry.insert(key.clone(), color.to_string()) {
            self.cache.remove(&cache_key(&previous));
        }
        self.cache.remove(&key);
        self.cache.remove(&cache_key(color));
        Ok(())
    }

    /// CSS declaration for the rich-console surface
    pub fn css(&self, token: &str) -> String {
        let token = token.trim();
        if token.is_empty() {
            return String::new();
        }
        match self.registry.get(&token.to_lowercase()) {
            Some(value) => format!("color: {}", value),
            None => format!("color: {}", token),
        }
    }

    /// Number of memoized tokens
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for ColorResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap `text` in an already resolved escape sequence
pub fn paint_with(text: &str, code: &str) -> String {
    if code.is_empty() {
        return text.to_string();
    }
    let reasserted = format!("{}{}", RESET, code);
    format!("{}{}{}", code, text.replace(RESET, &reasserted), RESET)
}
