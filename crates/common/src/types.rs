use std::{fmt, str::FromStr};

use {
    serde::{Deserialize, Deserializer, Serialize, Serializer},
    tortuga_config::{ConfigSource, keys},
    tracing::warn,
};

// ── Colors ──────────────────────────────────────────────────────────────────

/// 24-bit RGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColor(pub String);

impl fmt::Display for InvalidColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color '{}', expected #rrggbb", self.0)
    }
}

impl std::error::Error for InvalidColor {}

impl Color {
    pub fn parse_hex(raw: &str) -> Result<Self, InvalidColor> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .unwrap_or(trimmed);
        if digits.len() != 6 {
            return Err(InvalidColor(raw.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| InvalidColor(raw.to_string()))
    }
}

impl FromStr for Color {
    type Err = InvalidColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0 & 0x00ff_ffff)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// Display colors for success, warning and error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            success: Color(0x00ff00),
            warning: Color(0xffff00),
            error: Color(0xff0000),
        }
    }
}

impl Palette {
    /// Read `color.success`, `color.warning` and `color.error`. Unparseable
    /// values are logged and replaced by the defaults.
    pub fn from_config(config: &dyn ConfigSource) -> Self {
        let defaults = Self::default();
        let read = |key: &str, fallback: Color| match config.get(key) {
            None => fallback,
            Some(raw) => Color::parse_hex(&raw).unwrap_or_else(|e| {
                warn!(key, error = %e, "using default color");
                fallback
            }),
        };
        Self {
            success: read(keys::COLOR_SUCCESS, defaults.success),
            warning: read(keys::COLOR_WARNING, defaults.warning),
            error: read(keys::COLOR_ERROR, defaults.error),
        }
    }
}

// ── Outbound payloads ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub embeds: Vec<Embed>,
    /// Visible only to the invoking user. Ignored for text replies.
    #[serde(default)]
    pub ephemeral: bool,
}

impl Response {
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ephemeral: false,
        }
    }

    #[must_use]
    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }
}

// ── Platform references ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub name: String,
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Server,
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: String,
    pub name: String,
    pub kind: ChannelKind,
}

impl ChannelRef {
    pub fn is_direct(&self) -> bool {
        self.kind == ChannelKind::Direct
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: String,
    pub channel_id: String,
}

/// Token used to answer one slash interaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionRef {
    pub id: String,
    pub token: String,
}

/// Typed slash-command option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

impl OptionValue {
    /// Guess the type of a raw textual value.
    pub fn infer(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("true") {
            Self::Boolean(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Self::Boolean(false)
        } else if let Ok(n) = raw.parse() {
            Self::Integer(n)
        } else if let Ok(x) = raw.parse() {
            Self::Number(x)
        } else {
            Self::String(raw.to_string())
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Number(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}
