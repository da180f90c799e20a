//! Light and dark color palettes for the page.
//!
//! Defaults are fixed; an optional JSON document of the form
//! `{"light": {...}, "dark": {...}}` overrides individual colors (custom
//! values win, missing keys keep the defaults). The theme is handed to the
//! renderer as part of [`crate::RenderContext`].

use crate::error::ThemeError;

/// The five colors the page uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub background: String,
    pub card: String,
    pub primary: String,
    pub secondary: String,
    pub text: String,
}

impl Palette {
    pub fn light() -> Self {
        Palette {
            background: "#F5F7FA".to_string(),
            card: "#FFFFFF".to_string(),
            primary: "#4A90E2".to_string(),
            secondary: "#50C878".to_string(),
            text: "#2D3748".to_string(),
        }
    }

    pub fn dark() -> Self {
        Palette {
            background: "#1E293B".to_string(),
            card: "#273445".to_string(),
            primary: "#60A5FA".to_string(),
            secondary: "#81E6D9".to_string(),
            text: "#E2E8F0".to_string(),
        }
    }

    /// Merge `overrides` over this palette. Unknown keys are ignored; a
    /// present but non-object palette is an error.
    fn merged(mut self, mode: &str, overrides: Option<&serde_json::Value>) -> Result<Self, ThemeError> {
        let Some(value) = overrides else {
            return Ok(self);
        };
        let map = value.as_object().ok_or_else(|| ThemeError::PaletteNotAnObject {
            mode: mode.to_string(),
        })?;

        for (key, slot) in [
            ("background", &mut self.background),
            ("card", &mut self.card),
            ("primary", &mut self.primary),
            ("secondary", &mut self.secondary),
            ("text", &mut self.text),
        ] {
            if let Some(value) = map.get(key) {
                let color = value.as_str().ok_or_else(|| ThemeError::NonStringColor {
                    mode: mode.to_string(),
                    key: key.to_string(),
                })?;
                *slot = color.to_string();
            }
        }
        Ok(self)
    }

    fn css_declarations(&self) -> String {
        format!(
            "--background: {}; --card: {}; --primary: {}; --secondary: {}; --text: {};",
            css_value(&self.background),
            css_value(&self.card),
            css_value(&self.primary),
            css_value(&self.secondary),
            css_value(&self.text),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub light: Palette,
    pub dark: Palette,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            light: Palette::light(),
            dark: Palette::dark(),
        }
    }
}

impl Theme {
    /// Defaults with `overrides` merged in.
    pub fn from_overrides(overrides: &serde_json::Value) -> Result<Self, ThemeError> {
        if !overrides.is_object() {
            return Err(ThemeError::NotAnObject);
        }
        Ok(Theme {
            light: Palette::light().merged("light", overrides.get("light"))?,
            dark: Palette::dark().merged("dark", overrides.get("dark"))?,
        })
    }

    pub fn from_json_str(source: &str) -> Result<Self, ThemeError> {
        let value: serde_json::Value = serde_json::from_str(source)?;
        Self::from_overrides(&value)
    }

    /// `:root` custom properties, with the dark palette behind
    /// `prefers-color-scheme`.
    pub fn css_variables(&self) -> String {
        format!(
            ":root {{ {} }}\n@media (prefers-color-scheme: dark) {{ :root {{ {} }} }}\n",
            self.light.css_declarations(),
            self.dark.css_declarations(),
        )
    }
}

/// Strip characters that could close the declaration or the style block.
fn css_value(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_merge_per_key() {
        let theme = Theme::from_json_str(
            r##"{"light": {"primary": "#112233", "unknown": "x"}, "dark": {"text": "#fff"}}"##,
        )
        .unwrap();

        assert_eq!(theme.light.primary, "#112233");
        assert_eq!(theme.light.background, Palette::light().background);
        assert_eq!(theme.dark.text, "#fff");
        assert_eq!(theme.dark.primary, Palette::dark().primary);
    }

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(Theme::from_json_str("{}").unwrap(), Theme::default());
    }

    #[test]
    fn non_string_color_is_an_error() {
        let err = Theme::from_json_str(r#"{"dark": {"card": 7}}"#).unwrap_err();
        assert_eq!(err.to_string(), "theme color 'dark.card' must be a string");
    }

    #[test]
    fn non_object_root_is_an_error() {
        assert!(matches!(
            Theme::from_json_str("[1, 2]"),
            Err(ThemeError::NotAnObject)
        ));
        assert!(matches!(
            Theme::from_json_str("{not json"),
            Err(ThemeError::Json(_))
        ));
    }

    #[test]
    fn non_object_palette_is_an_error() {
        let err = Theme::from_json_str(r#"{"light": "oops", "dark": 5}"#).unwrap_err();
        assert!(matches!(
            &err,
            ThemeError::PaletteNotAnObject { mode } if mode == "light"
        ));
        assert_eq!(err.to_string(), "theme palette 'light' must be a JSON object");

        assert!(matches!(
            Theme::from_json_str(r#"{"dark": [1]}"#),
            Err(ThemeError::PaletteNotAnObject { mode }) if mode == "dark"
        ));
    }

    #[test]
    fn css_carries_both_palettes() {
        let css = Theme::default().css_variables();
        assert!(css.contains("--primary: #4A90E2;"));
        assert!(css.contains("@media (prefers-color-scheme: dark)"));
        assert!(css.contains("--primary: #60A5FA;"));
    }

    #[test]
    fn css_values_cannot_break_out() {
        let theme =
            Theme::from_json_str(r#"{"light": {"text": "red;}</style><script>"}}"#).unwrap();
        let css = theme.css_variables();
        assert!(!css.contains("</style>"));
        assert!(css.contains("--text: red/stylescript;"));
    }
}
