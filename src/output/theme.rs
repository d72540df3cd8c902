//! Color themes and the rendering context.

use clap::ValueEnum;
use console::{Color, Style, Term};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fallback width when the terminal size is unknown.
const DEFAULT_WIDTH: usize = 80;

/// Named color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Standard,
    Hacker,
    Ocean,
    Vintage,
    Nord,
    /// Pick one of the named themes at startup.
    Random,
}

impl Theme {
    /// Concrete themes, in menu order.
    pub const NAMED: [Theme; 5] = [
        Theme::Standard,
        Theme::Hacker,
        Theme::Ocean,
        Theme::Vintage,
        Theme::Nord,
    ];

    /// Resolve `Random` to a concrete theme.
    pub fn resolve(self) -> Theme {
        match self {
            Theme::Random => *Self::NAMED
                .choose(&mut rand::thread_rng())
                .unwrap_or(&Theme::Standard),
            other => other,
        }
    }

    /// Styles for this theme. `Random` uses the standard palette.
    pub fn palette(self) -> Palette {
        let (text, success, highlight) = match self {
            Theme::Standard | Theme::Random => (Color::White, Color::Green, Color::Cyan),
            Theme::Hacker => (Color::Green, Color::Green, Color::Yellow),
            Theme::Ocean => (Color::Cyan, Color::White, Color::Blue),
            Theme::Vintage => (Color::Yellow, Color::Green, Color::Magenta),
            Theme::Nord => (Color::Color256(250), Color::Cyan, Color::White),
        };

        Palette {
            text: Style::new().fg(text),
            success: Style::new().fg(success).bold(),
            error: Style::new().red().bold(),
            highlight: Style::new().fg(highlight).bold(),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Standard => "Standard",
            Theme::Hacker => "Hacker",
            Theme::Ocean => "Ocean",
            Theme::Vintage => "Vintage",
            Theme::Nord => "Nord",
            Theme::Random => "Random",
        };
        write!(f, "{}", name)
    }
}

/// Styles used by the plain renderer.
#[derive(Debug, Clone)]
pub struct Palette {
    pub text: Style,
    pub success: Style,
    pub error: Style,
    pub highlight: Style,
}

/// Everything the plain renderer needs to know about the display.
///
/// Built once per session and passed down explicitly.
#[derive(Debug, Clone)]
pub struct RenderContext {
    theme: Theme,
    palette: Palette,
    width: usize,
}

impl RenderContext {
    /// Create a context for a theme, sized to the current terminal.
    pub fn new(theme: Theme) -> Self {
        let width = Term::stdout()
            .size_checked()
            .map(|(_, cols)| cols as usize)
            .unwrap_or(DEFAULT_WIDTH);
        Self::with_width(theme, width)
    }

    /// Create a context with a fixed width.
    pub fn with_width(theme: Theme, width: usize) -> Self {
        let theme = theme.resolve();
        Self {
            theme,
            palette: theme.palette(),
            width: width.clamp(20, 120),
        }
    }

    /// Switch to another theme, keeping the width.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme.resolve();
        self.palette = self.theme.palette();
    }

    /// The concrete theme in use.
    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Usable line width in columns.
    pub fn width(&self) -> usize {
        self.width
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::with_width(Theme::Standard, DEFAULT_WIDTH)
    }
}
