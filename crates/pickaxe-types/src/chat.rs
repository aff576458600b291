//! Chat component tree (styled text used for status descriptions, disconnect
//! reasons, and chat messages). Encodes to / decodes from the raw JSON text
//! format the protocol embeds as a String field.

use serde_json::{Map, Value};

/// The sixteen legacy named colors, in their stable wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

impl NamedColor {
    const ALL: [(NamedColor, &'static str); 16] = [
        (NamedColor::Black, "black"),
        (NamedColor::DarkBlue, "dark_blue"),
        (NamedColor::DarkGreen, "dark_green"),
        (NamedColor::DarkAqua, "dark_aqua"),
        (NamedColor::DarkRed, "dark_red"),
        (NamedColor::DarkPurple, "dark_purple"),
        (NamedColor::Gold, "gold"),
        (NamedColor::Gray, "gray"),
        (NamedColor::DarkGray, "dark_gray"),
        (NamedColor::Blue, "blue"),
        (NamedColor::Green, "green"),
        (NamedColor::Aqua, "aqua"),
        (NamedColor::Red, "red"),
        (NamedColor::LightPurple, "light_purple"),
        (NamedColor::Yellow, "yellow"),
        (NamedColor::White, "white"),
    ];

    pub fn wire_name(self) -> &'static str {
        Self::ALL.iter().find(|(c, _)| *c == self).unwrap().1
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.iter().find(|(_, n)| *n == name).map(|(c, _)| *c)
    }
}

/// Either one of the sixteen named colors, or a 24-bit RGB value (alpha is
/// never carried and is dropped on encode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Named(NamedColor),
    Rgb(u8, u8, u8),
}

impl Color {
    pub fn to_wire_string(self) -> String {
        match self {
            Color::Named(c) => c.wire_name().to_string(),
            Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
        }
    }

    pub fn from_wire_string(s: &str) -> Result<Self, ChatError> {
        if let Some(hex) = s.strip_prefix('#') {
            let value = u32::from_str_radix(hex, 16)
                .map_err(|_| ChatError::InvalidColor(s.to_string()))?;
            if hex.len() != 6 {
                return Err(ChatError::InvalidColor(s.to_string()));
            }
            let r = ((value >> 16) & 0xFF) as u8;
            let g = ((value >> 8) & 0xFF) as u8;
            let b = (value & 0xFF) as u8;
            Ok(Color::Rgb(r, g, b))
        } else {
            NamedColor::from_wire_name(s)
                .map(Color::Named)
                .ok_or_else(|| ChatError::InvalidColor(s.to_string()))
        }
    }
}

/// Style attributes shared by every component variant. Each flag is a
/// tri-state optional: `None` means "inherit from parent", `Some(false)`
/// means explicitly off, `Some(true)` means explicitly on. Only present
/// (`Some`) states round-trip to JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underlined: Option<bool>,
    pub strikethrough: Option<bool>,
    pub obfuscated: Option<bool>,
    pub font: Option<String>,
    pub color: Option<Color>,
}

impl Style {
    fn write_into(&self, map: &mut Map<String, Value>) {
        if let Some(v) = self.bold {
            map.insert("bold".into(), Value::Bool(v));
        }
        if let Some(v) = self.italic {
            map.insert("italic".into(), Value::Bool(v));
        }
        if let Some(v) = self.underlined {
            map.insert("underlined".into(), Value::Bool(v));
        }
        if let Some(v) = self.strikethrough {
            map.insert("strikethrough".into(), Value::Bool(v));
        }
        if let Some(v) = self.obfuscated {
            map.insert("obfuscated".into(), Value::Bool(v));
        }
        if let Some(ref font) = self.font {
            map.insert("font".into(), Value::String(font.clone()));
        }
        if let Some(color) = self.color {
            map.insert("color".into(), Value::String(color.to_wire_string()));
        }
    }

    fn read_from(map: &Map<String, Value>) -> Result<Self, ChatError> {
        let mut style = Style::default();
        style.bold = read_bool(map, "bold")?;
        style.italic = read_bool(map, "italic")?;
        style.underlined = read_bool(map, "underlined")?;
        style.strikethrough = read_bool(map, "strikethrough")?;
        style.obfuscated = read_bool(map, "obfuscated")?;
        if let Some(v) = map.get("font") {
            style.font = Some(
                v.as_str()
                    .ok_or_else(|| ChatError::WrongType("font", "string"))?
                    .to_string(),
            );
        }
        if let Some(v) = map.get("color") {
            let s = v
                .as_str()
                .ok_or_else(|| ChatError::WrongType("color", "string"))?;
            style.color = Some(Color::from_wire_string(s)?);
        }
        Ok(style)
    }
}

fn read_bool(map: &Map<String, Value>, key: &'static str) -> Result<Option<bool>, ChatError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ChatError::WrongType(key, "bool")),
    }
}

/// A node in the chat component tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatComponent {
    Text {
        text: String,
        style: Style,
        children: Vec<ChatComponent>,
    },
    Translation {
        key: String,
        with: Vec<ChatComponent>,
        style: Style,
        children: Vec<ChatComponent>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat component JSON is not an object")]
    NotAnObject,
    #[error("chat component has neither 'text' nor 'translate'")]
    MissingContent,
    #[error("field {0:?} must be a {1}")]
    WrongType(&'static str, &'static str),
    #[error("invalid color {0:?}")]
    InvalidColor(String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChatComponent {
    pub fn text(text: impl Into<String>) -> Self {
        ChatComponent::Text {
            text: text.into(),
            style: Style::default(),
            children: Vec::new(),
        }
    }

    pub fn translation(key: impl Into<String>) -> Self {
        ChatComponent::Translation {
            key: key.into(),
            with: Vec::new(),
            style: Style::default(),
            children: Vec::new(),
        }
    }

    pub fn with_style(mut self, f: impl FnOnce(Style) -> Style) -> Self {
        match &mut self {
            ChatComponent::Text { style, .. } | ChatComponent::Translation { style, .. } => {
                *style = f(std::mem::take(style));
            }
        }
        self
    }

    pub fn with_child(mut self, child: ChatComponent) -> Self {
        match &mut self {
            ChatComponent::Text { children, .. } | ChatComponent::Translation { children, .. } => {
                children.push(child);
            }
        }
        self
    }

    pub fn style(&self) -> &Style {
        match self {
            ChatComponent::Text { style, .. } | ChatComponent::Translation { style, .. } => style,
        }
    }

    pub fn children(&self) -> &[ChatComponent] {
        match self {
            ChatComponent::Text { children, .. } | ChatComponent::Translation { children, .. } => {
                children
            }
        }
    }

    /// Encode this tree to a `serde_json::Value`.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        match self {
            ChatComponent::Text { text, style, .. } => {
                map.insert("text".into(), Value::String(text.clone()));
                style.write_into(&mut map);
            }
            ChatComponent::Translation {
                key, with, style, ..
            } => {
                map.insert("translate".into(), Value::String(key.clone()));
                if !with.is_empty() {
                    map.insert(
                        "with".into(),
                        Value::Array(with.iter().map(ChatComponent::to_json).collect()),
                    );
                }
                style.write_into(&mut map);
            }
        }
        let children = self.children();
        if !children.is_empty() {
            map.insert(
                "extra".into(),
                Value::Array(children.iter().map(ChatComponent::to_json).collect()),
            );
        }
        Value::Object(map)
    }

    /// Encode as a JSON string, the form the protocol embeds in packet fields.
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    /// Decode a tree from a `serde_json::Value`. Array / bare-string root
    /// forms are out of scope and rejected.
    pub fn from_json(value: &Value) -> Result<Self, ChatError> {
        let map = value.as_object().ok_or(ChatError::NotAnObject)?;
        let style = Style::read_from(map)?;

        let children = match map.get("extra") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(ChatComponent::from_json)
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(ChatError::WrongType("extra", "array")),
        };

        if let Some(text) = map.get("text") {
            let text = text
                .as_str()
                .ok_or_else(|| ChatError::WrongType("text", "string"))?
                .to_string();
            return Ok(ChatComponent::Text {
                text,
                style,
                children,
            });
        }

        if let Some(translate) = map.get("translate") {
            let key = translate
                .as_str()
                .ok_or_else(|| ChatError::WrongType("translate", "string"))?
                .to_string();
            let with = match map.get("with") {
                None => Vec::new(),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(ChatComponent::from_json)
                    .collect::<Result<Vec<_>, _>>()?,
                Some(_) => return Err(ChatError::WrongType("with", "array")),
            };
            return Ok(ChatComponent::Translation {
                key,
                with,
                style,
                children,
            });
        }

        Err(ChatError::MissingContent)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ChatError> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_json(&value)
    }
}
