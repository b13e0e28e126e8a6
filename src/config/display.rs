//! Display configuration options for iaseek
//!
//! The `[display]` table: border shape, pane titles and the theme colours used by the tables,
//! panels and overlays.

use crate::utils::parse_color;

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Display {
    border_shape: BorderShape,
    titles: bool,
    zebra: bool,
    theme: Theme,
}

impl Default for Display {
    fn default() -> Self {
        Display {
            border_shape: BorderShape::Rounded,
            titles: true,
            zebra: false,
            theme: Theme::default(),
        }
    }
}

impl Display {
    #[inline]
    pub fn border_type(&self) -> BorderType {
        self.border_shape.as_border_type()
    }

    #[inline]
    pub fn titles(&self) -> bool {
        self.titles
    }

    #[inline]
    pub fn zebra(&self) -> bool {
        self.zebra
    }

    #[inline]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }
}

/// Border shape options
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BorderShape {
    Square,
    Rounded,
    Double,
    Thick,
}

impl BorderShape {
    pub fn as_border_type(&self) -> BorderType {
        match self {
            BorderShape::Square => BorderType::Plain,
            BorderShape::Rounded => BorderType::Rounded,
            BorderShape::Double => BorderType::Double,
            BorderShape::Thick => BorderType::Thick,
        }
    }
}

/// Theme colours.
///
/// ```toml
/// [display.theme]
/// accent = "cyan"
/// selection = "#303030"
/// ```
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Theme {
    #[serde(deserialize_with = "deserialize_color_field")]
    accent: Color,
    #[serde(deserialize_with = "deserialize_color_field")]
    selection: Color,
    #[serde(deserialize_with = "deserialize_color_field")]
    index: Color,
    #[serde(deserialize_with = "deserialize_color_field")]
    title: Color,
    #[serde(deserialize_with = "deserialize_color_field")]
    size: Color,
    #[serde(deserialize_with = "deserialize_color_field")]
    digest: Color,
    #[serde(deserialize_with = "deserialize_color_field")]
    warning: Color,
    #[serde(deserialize_with = "deserialize_color_field")]
    border: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            accent: Color::Cyan,
            selection: Color::Indexed(236),
            index: Color::Magenta,
            title: Color::Blue,
            size: Color::Green,
            digest: Color::DarkGray,
            warning: Color::Yellow,
            border: Color::Indexed(238),
        }
    }
}

impl Theme {
    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn selection_style(&self) -> Style {
        Style::default().bg(self.selection)
    }

    pub fn index_style(&self) -> Style {
        Style::default().fg(self.index)
    }

    pub fn title_style(&self) -> Style {
        Style::default().fg(self.title)
    }

    pub fn size_style(&self) -> Style {
        Style::default().fg(self.size)
    }

    pub fn digest_style(&self) -> Style {
        Style::default().fg(self.digest)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }
}

fn deserialize_color_field<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(parse_color(&s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_colours_parse_from_toml() -> Result<(), Box<dyn std::error::Error>> {
        let display: Display = toml::from_str(
            r##"
            border_shape = "double"
            [theme]
            accent = "#ff0000"
            warning = "red"
            "##,
        )?;
        assert_eq!(display.border_type(), BorderType::Double);
        assert_eq!(display.theme().accent_style().fg, Some(Color::Rgb(255, 0, 0)));
        assert_eq!(display.theme().warning_style().fg, Some(Color::Red));
        assert_eq!(display.theme().size_style().fg, Some(Color::Green));
        Ok(())
    }
}
