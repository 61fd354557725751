// src/theme.rs
use crate::color::Color;

/// The two color presets. Picked once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    Dark,
    #[default]
    Light,
}

impl Palette {
    pub fn from_dark_flag(dark: bool) -> Self {
        if dark { Palette::Dark } else { Palette::Light }
    }

    /// Shared color for nodes and links.
    pub fn ink(self) -> Color {
        match self {
            Palette::Dark => Color::from((255, 255, 255)),
            Palette::Light => Color::from((255, 215, 0)),
        }
    }
}

/// Whether an element's class list / `data-theme` value marks a dark page.
pub fn is_dark(class_list: &str, data_theme: Option<&str>, dark_class: &str) -> bool {
    class_list.split_ascii_whitespace().any(|class| class == dark_class)
        || data_theme.is_some_and(|theme| theme.eq_ignore_ascii_case("dark"))
}

/// `<body>` is consulted first, then the root element; either one marking
/// the page dark is enough.
pub fn page_is_dark<'a>(
    elements: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
    dark_class: &str,
) -> bool {
    elements
        .into_iter()
        .any(|(class_list, data_theme)| is_dark(class_list, data_theme, dark_class))
}
