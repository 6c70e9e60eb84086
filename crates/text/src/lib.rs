//! Rich-text chat components with legacy `&` markup support.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static STRIP_COLOR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new("(?i)&[0-9A-FK-OR]").unwrap());

/// Removes every legacy color/style code pair (`&` followed by one of
/// `0-9`, `a-f`, `k-o` or `r`, case-insensitive) and nothing else.
pub fn strip_color(input: &str) -> String {
    STRIP_COLOR_REGEX.replace_all(input, "").into_owned()
}

fn is_valid_hex(ch: char) -> bool {
    ch.is_numeric() || ('a'..='f').contains(&ch) || ('A'..='F').contains(&ch)
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColorCode {
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
    Obfuscated,
    Bold,
    Strikethrough,
    Underline,
    Italic,
    Reset,
}

impl ColorCode {
    fn parse(code: char) -> Option<ColorCode> {
        Some(match code.to_ascii_lowercase() {
            '0' => ColorCode::Black,
            '1' => ColorCode::DarkBlue,
            '2' => ColorCode::DarkGreen,
            '3' => ColorCode::DarkAqua,
            '4' => ColorCode::DarkRed,
            '5' => ColorCode::DarkPurple,
            '6' => ColorCode::Gold,
            '7' => ColorCode::Gray,
            '8' => ColorCode::DarkGray,
            '9' => ColorCode::Blue,
            'a' => ColorCode::Green,
            'b' => ColorCode::Aqua,
            'c' => ColorCode::Red,
            'd' => ColorCode::LightPurple,
            'e' => ColorCode::Yellow,
            'f' => ColorCode::White,
            'k' => ColorCode::Obfuscated,
            'l' => ColorCode::Bold,
            'm' => ColorCode::Strikethrough,
            'n' => ColorCode::Underline,
            'o' => ColorCode::Italic,
            'r' => ColorCode::Reset,
            _ => return None,
        })
    }

    fn is_formatting(self) -> bool {
        use ColorCode::*;
        matches!(
            self,
            Obfuscated | Bold | Strikethrough | Underline | Italic | Reset
        )
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum TextColor {
    Hex(String),
    ColorCode(ColorCode),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClickAction {
    OpenUrl,
    RunCommand,
    SuggestCommand,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    action: ClickAction,
    value: String,
}

impl ClickEvent {
    pub fn new(action: ClickAction, value: String) -> ClickEvent {
        ClickEvent { action, value }
    }

    pub fn action(&self) -> ClickAction {
        self.action
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum HoverAction {
    ShowText,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HoverEvent {
    action: HoverAction,
    value: Vec<TextComponent>,
}

impl HoverEvent {
    pub fn show_text(value: Vec<TextComponent>) -> HoverEvent {
        HoverEvent {
            action: HoverAction::ShowText,
            value,
        }
    }

    pub fn value(&self) -> &[TextComponent] {
        &self.value
    }
}

/// This is only used for `TextComponent` serialize
#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(field: &bool) -> bool {
    !*field
}

#[derive(Serialize, Default, Debug, Clone, PartialEq)]
pub struct TextComponent {
    pub text: String,
    #[serde(skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub underlined: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub obfuscated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<TextColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "clickEvent")]
    pub click_event: Option<ClickEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "hoverEvent")]
    pub hover_event: Option<HoverEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<TextComponent>,
}

impl TextComponent {
    /// Parses `&`-coded markup into a run of components. An `&` followed by
    /// anything that is not a recognized code is kept as literal text.
    /// `#rrggbb` sequences become hex-colored runs.
    pub fn from_legacy_text(message: &str) -> Vec<TextComponent> {
        let mut components = Vec::new();

        let mut cur_component: TextComponent = Default::default();

        let mut chars = message.chars();
        'main_loop: while let Some(c) = chars.next() {
            if c == '&' {
                if let Some(code) = chars.next() {
                    if let Some(color) = ColorCode::parse(code) {
                        let make_new = !cur_component.text.is_empty();
                        if color.is_formatting() && make_new {
                            components.push(cur_component.clone());
                            cur_component.text.clear();
                        }
                        match color {
                            ColorCode::Bold => cur_component.bold = true,
                            ColorCode::Italic => cur_component.italic = true,
                            ColorCode::Underline => cur_component.underlined = true,
                            ColorCode::Strikethrough => cur_component.strikethrough = true,
                            ColorCode::Obfuscated => cur_component.obfuscated = true,
                            _ => {
                                components.push(cur_component);
                                cur_component = Default::default();
                                cur_component.color = Some(TextColor::ColorCode(color));
                            }
                        }
                        continue;
                    }
                    cur_component.text.push(c);
                    cur_component.text.push(code);
                    continue;
                }
            }
            if c == '#' {
                let mut hex = String::from(c);
                for _ in 0..6 {
                    if let Some(c) = chars.next() {
                        hex.push(c);
                        if !is_valid_hex(c) {
                            cur_component.text += &hex;
                            continue 'main_loop;
                        }
                    } else {
                        cur_component.text += &hex;
                        continue 'main_loop;
                    }
                }
                components.push(cur_component);
                cur_component = Default::default();
                cur_component.color = Some(TextColor::Hex(hex));
                continue;
            }
            cur_component.text.push(c);
        }
        components.push(cur_component);

        components
    }

    pub fn encode_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }

    /// Concatenates the visible text of this component and its children,
    /// ignoring all formatting.
    pub fn plain_text(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.extra {
            out += &child.plain_text();
        }
        out
    }
}

impl<S> From<S> for TextComponent
where
    S: Into<String>,
{
    fn from(value: S) -> Self {
        let mut tc: TextComponent = Default::default();
        tc.text = value.into();
        tc
    }
}
