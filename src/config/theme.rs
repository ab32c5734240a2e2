use crossterm::style::{Attribute, Color, ContentStyle};
use serde::{Deserialize, Serialize};

/// Which palette is active. Switching is a pure local flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeMode::Light => write!(f, "light"),
            ThemeMode::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

impl Theme {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark(),
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            colors: ThemeColors {
                foreground: HexColor::new("#1f2937"),
                muted: HexColor::new("#6b7280"),
                user: HexColor::new("#4f46e5"),
                assistant: HexColor::new("#111827"),
                math: HexColor::new("#7c3aed"),
                error: HexColor::new("#dc2626"),
            },
        }
    }

    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            colors: ThemeColors {
                foreground: HexColor::new("#c0caf5"),
                muted: HexColor::new("#565f89"),
                user: HexColor::new("#7aa2f7"),
                assistant: HexColor::new("#c0caf5"),
                math: HexColor::new("#bb9af7"),
                error: HexColor::new("#f7768e"),
            },
        }
    }

    pub fn plain_style(&self) -> ContentStyle {
        fg(&self.colors.foreground)
    }

    pub fn user_style(&self) -> ContentStyle {
        let mut style = ContentStyle::new();
        style.foreground_color = Some(self.colors.user.to_color());
        style.attributes.set(Attribute::Bold);
        style
    }

    pub fn assistant_style(&self) -> ContentStyle {
        fg(&self.colors.assistant)
    }

    pub fn math_style(&self) -> ContentStyle {
        fg(&self.colors.math)
    }

    pub fn muted_style(&self) -> ContentStyle {
        fg(&self.colors.muted)
    }

    pub fn error_style(&self) -> ContentStyle {
        fg(&self.colors.error)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

fn fg(color: &HexColor) -> ContentStyle {
    let mut style = ContentStyle::new();
    style.foreground_color = Some(color.to_color());
    style
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeColors {
    pub foreground: HexColor,
    pub muted: HexColor,
    pub user: HexColor,
    pub assistant: HexColor,
    pub math: HexColor,
    pub error: HexColor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    pub fn new(hex: &str) -> Self {
        Self(hex.to_string())
    }

    pub fn to_color(&self) -> Color {
        self.parse_hex().unwrap_or(Color::Reset)
    }

    fn parse_hex(&self) -> Option<Color> {
        let hex = self.0.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }

        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;

        Some(Color::Rgb { r, g, b })
    }
}

impl Default for HexColor {
    fn default() -> Self {
        Self("#ffffff".to_string())
    }
}
