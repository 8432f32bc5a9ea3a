//! Brand palette.
//!
//! The `branding` content document holds two colors, `primaryColor` and
//! `secondaryColor`. The site's stylesheet consumes them as bare HSL triplets
//! (`345 90% 55%`) in the `--brand-pink` and `--brand-purple` custom
//! properties, so hex input is converted on the way out.

use core::fmt;
use std::fmt::Write as _;

use crate::content::SiteContent;

/// Reserved section holding the brand palette.
pub const BRANDING_SECTION: &str = "branding";

/// Key of the primary color in the branding document.
pub const PRIMARY_COLOR_KEY: &str = "primaryColor";

/// Key of the secondary color in the branding document.
pub const SECONDARY_COLOR_KEY: &str = "secondaryColor";

/// A brand color in the form the stylesheet expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandColor(String);

impl BrandColor {
    /// Primary color used when the branding document sets none.
    pub const DEFAULT_PRIMARY: &'static str = "345 90% 55%";

    /// Secondary color used when the branding document sets none.
    pub const DEFAULT_SECONDARY: &'static str = "280 90% 55%";

    const MAX_LENGTH: usize = 64;

    /// Interpret a stored color value.
    ///
    /// `#rrggbb` is converted to an `H S% L%` triplet. Other values are kept
    /// verbatim when they only use characters that can appear in a CSS color
    /// value. Returns `None` for blank input, malformed hex, or anything that
    /// could break out of a declaration.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.len() > Self::MAX_LENGTH {
            return None;
        }
        if let Some(hex) = value.strip_prefix('#') {
            return hex_to_hsl(hex).map(Self);
        }
        value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || " %.,()/-".contains(c))
            .then(|| Self(value.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BrandColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convert six hex digits to a rounded `H S% L%` triplet.
#[allow(clippy::float_cmp)]
fn hex_to_hsl(hex: &str) -> Option<String> {
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .map(|v| f64::from(v) / 255.0)
    };
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = f64::midpoint(max, min);
    let (mut h, mut s) = (0.0, 0.0);

    if max != min {
        let d = max - min;
        s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        h /= 6.0;
    }

    Some(format!(
        "{} {}% {}%",
        (h * 360.0).round(),
        (s * 100.0).round(),
        (l * 100.0).round()
    ))
}

/// The two brand colors, as stored in the `branding` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandPalette {
    pub primary: Option<BrandColor>,
    pub secondary: Option<BrandColor>,
}

impl BrandPalette {
    /// Read the palette from a content snapshot.
    #[must_use]
    pub fn from_content(content: &SiteContent) -> Self {
        let color = |key| BrandColor::parse(&content.text(BRANDING_SECTION, key, ""));
        Self {
            primary: color(PRIMARY_COLOR_KEY),
            secondary: color(SECONDARY_COLOR_KEY),
        }
    }

    /// Primary color, or the stylesheet default.
    #[must_use]
    pub fn primary_or_default(&self) -> &str {
        self.primary
            .as_ref()
            .map_or(BrandColor::DEFAULT_PRIMARY, BrandColor::as_str)
    }

    /// Secondary color, or the stylesheet default.
    #[must_use]
    pub fn secondary_or_default(&self) -> &str {
        self.secondary
            .as_ref()
            .map_or(BrandColor::DEFAULT_SECONDARY, BrandColor::as_str)
    }

    /// A `:root` rule overriding the custom properties that are set.
    ///
    /// Returns an empty string when neither color is set, leaving the
    /// stylesheet defaults in place.
    #[must_use]
    pub fn to_css(&self) -> String {
        if self.primary.is_none() && self.secondary.is_none() {
            return String::new();
        }
        let mut css = String::from(":root {\n");
        if let Some(primary) = &self.primary {
            let _ = writeln!(css, "  --brand-pink: {primary};");
        }
        if let Some(secondary) = &self.secondary {
            let _ = writeln!(css, "  --brand-purple: {secondary};");
        }
        css.push_str("}\n");
        css
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::{ContentDocument, ContentDocumentId, SectionName};

    fn branding(content: serde_json::Value) -> SiteContent {
        let serde_json::Value::Object(content) = content else {
            panic!("object expected");
        };
        SiteContent::from_documents([ContentDocument {
            id: ContentDocumentId::new(1),
            section: SectionName::parse(BRANDING_SECTION).unwrap(),
            content,
            updated_at: Utc::now(),
        }])
    }

    #[test]
    fn test_hex_to_hsl() {
        assert_eq!(BrandColor::parse("#ec4899").unwrap().as_str(), "330 81% 60%");
        assert_eq!(BrandColor::parse("#000000").unwrap().as_str(), "0 0% 0%");
        assert_eq!(BrandColor::parse("#FFFFFF").unwrap().as_str(), "0 0% 100%");
        assert_eq!(BrandColor::parse("#ff0000").unwrap().as_str(), "0 100% 50%");
        assert_eq!(BrandColor::parse("#00ff00").unwrap().as_str(), "120 100% 50%");
        assert_eq!(BrandColor::parse("#0000ff").unwrap().as_str(), "240 100% 50%");
    }

    #[test]
    fn test_invalid_hex_is_ignored() {
        assert_eq!(BrandColor::parse("#fff"), None);
        assert_eq!(BrandColor::parse("#gggggg"), None);
        assert_eq!(BrandColor::parse("#ec48991"), None);
    }

    #[test]
    fn test_hsl_passthrough() {
        assert_eq!(
            BrandColor::parse(" 345 90% 55% ").unwrap().as_str(),
            "345 90% 55%"
        );
    }

    #[test]
    fn test_unsafe_values_rejected() {
        assert_eq!(BrandColor::parse(""), None);
        assert_eq!(BrandColor::parse("red; } body { display:none"), None);
        assert_eq!(BrandColor::parse("</style>"), None);
    }

    #[test]
    fn test_palette_from_content() {
        let content = branding(json!({"primaryColor": "#ec4899", "secondaryColor": "bogus!"}));
        let palette = BrandPalette::from_content(&content);
        assert_eq!(palette.primary.as_ref().unwrap().as_str(), "330 81% 60%");
        assert_eq!(palette.secondary, None);
        assert_eq!(palette.secondary_or_default(), BrandColor::DEFAULT_SECONDARY);
        assert_eq!(palette.to_css(), ":root {\n  --brand-pink: 330 81% 60%;\n}\n");
    }

    #[test]
    fn test_empty_palette_renders_nothing() {
        let palette = BrandPalette::from_content(&SiteContent::default());
        assert_eq!(palette, BrandPalette::default());
        assert!(palette.to_css().is_empty());
        assert_eq!(palette.primary_or_default(), BrandColor::DEFAULT_PRIMARY);
    }
}
