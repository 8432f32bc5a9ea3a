//! Typed landing page sections.
//!
//! Content documents are free-form JSON objects. The page renders them
//! through per-section schemas: stored keys are laid over the schema's
//! fallback copy one at a time, and a key only takes effect when its value
//! has the same JSON kind as the default and deserializes cleanly. A
//! half-edited document therefore never blanks out the page.
//!
//! The same schemas validate edits before they are saved, see
//! [`check_section`].

mod copy;

pub use copy::*;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::content::{ContentDocument, SectionName, SiteContent};

/// A problem found when checking a content document against its schema.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaIssue {
    /// The key is not part of the schema and will be ignored when rendering.
    #[error("unknown key `{key}` will be ignored")]
    UnknownKey { key: String },
    /// The value has the wrong JSON kind.
    #[error("`{key}` should be {expected}, found {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    /// The value has the right kind but the wrong shape, e.g. a list item
    /// that is not an object.
    #[error("`{key}` is invalid: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl SchemaIssue {
    /// Whether the issue should stop the document from being saved.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        !matches!(self, Self::UnknownKey { .. })
    }
}

/// A section with a fixed set of keys and fallback copy.
pub trait SectionSchema: Default + Serialize + DeserializeOwned {
    /// The content document section this schema reads.
    const SECTION: &'static str;

    /// Read the section from a snapshot, falling back to defaults.
    #[must_use]
    fn from_content(content: &SiteContent) -> Self {
        content
            .section(Self::SECTION)
            .map_or_else(Self::default, Self::overlay)
    }

    /// Lay the stored keys over the defaults, skipping any that do not fit.
    #[must_use]
    fn overlay(stored: &Map<String, Value>) -> Self {
        let mut merged = Self::default().to_content();
        let keys: Vec<String> = merged.keys().cloned().collect();

        for key in keys {
            let Some(value) = stored.get(&key).filter(|v| !v.is_null()) else {
                continue;
            };
            let Some(previous) = merged.get(&key).cloned() else {
                continue;
            };
            if kind_of(&previous) != kind_of(value) {
                continue;
            }
            merged.insert(key.clone(), value.clone());
            if serde_json::from_value::<Self>(Value::Object(merged.clone())).is_err() {
                merged.insert(key, previous);
            }
        }

        serde_json::from_value(Value::Object(merged)).unwrap_or_default()
    }

    /// Check a document against the schema without saving anything.
    #[must_use]
    fn check(stored: &Map<String, Value>) -> Vec<SchemaIssue> {
        let defaults = Self::default().to_content();
        let mut issues = Vec::new();

        for (key, value) in stored {
            let Some(default) = defaults.get(key) else {
                issues.push(SchemaIssue::UnknownKey { key: key.clone() });
                continue;
            };
            if value.is_null() {
                continue;
            }
            if kind_of(default) != kind_of(value) {
                issues.push(SchemaIssue::WrongType {
                    key: key.clone(),
                    expected: kind_of(default),
                    found: kind_of(value),
                });
                continue;
            }
            let mut probe = defaults.clone();
            probe.insert(key.clone(), value.clone());
            if let Err(e) = serde_json::from_value::<Self>(Value::Object(probe)) {
                issues.push(SchemaIssue::InvalidValue {
                    key: key.clone(),
                    reason: e.to_string(),
                });
            }
        }

        issues
    }

    /// The section as a JSON object, in the stored key format.
    #[must_use]
    fn to_content(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

macro_rules! known_sections {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        /// A content document, typed by its section name.
        ///
        /// Sections without a schema are kept as [`SectionContent::Custom`].
        #[derive(Debug, Clone, PartialEq)]
        pub enum SectionContent {
            $($variant($ty),)+
            Custom {
                section: SectionName,
                content: Map<String, Value>,
            },
        }

        /// Names of every section that has a schema, in page order.
        pub const KNOWN_SECTIONS: &[&str] = &[$(<$ty as SectionSchema>::SECTION),+];

        impl SectionContent {
            /// Type a stored document by its section name.
            #[must_use]
            pub fn from_document(document: &ContentDocument) -> Self {
                match document.section.as_str() {
                    $(<$ty as SectionSchema>::SECTION => {
                        Self::$variant(<$ty as SectionSchema>::overlay(&document.content))
                    })+
                    _ => Self::Custom {
                        section: document.section.clone(),
                        content: document.content.clone(),
                    },
                }
            }

            /// Every known section with its fallback copy.
            #[must_use]
            pub fn defaults() -> Vec<Self> {
                vec![$(Self::$variant(<$ty>::default())),+]
            }

            /// The section name this content belongs to.
            #[must_use]
            pub fn section(&self) -> &str {
                match self {
                    $(Self::$variant(_) => <$ty as SectionSchema>::SECTION,)+
                    Self::Custom { section, .. } => section.as_str(),
                }
            }

            /// The content as a JSON object.
            #[must_use]
            pub fn to_content(&self) -> Map<String, Value> {
                match self {
                    $(Self::$variant(inner) => inner.to_content(),)+
                    Self::Custom { content, .. } => content.clone(),
                }
            }

            #[must_use]
            pub const fn is_custom(&self) -> bool {
                matches!(self, Self::Custom { .. })
            }
        }

        /// Check `content` against the schema for `section`.
        ///
        /// Sections without a schema accept any object and report nothing.
        #[must_use]
        pub fn check_section(section: &str, content: &Map<String, Value>) -> Vec<SchemaIssue> {
            match section {
                $(<$ty as SectionSchema>::SECTION => <$ty as SectionSchema>::check(content),)+
                _ => Vec::new(),
            }
        }
    };
}

known_sections! {
    Hero(HeroContent),
    Problem(ProblemContent),
    Features(FeaturesContent),
    Demo(DemoContent),
    Pricing(PricingContent),
    Audience(AudienceContent),
    Founding(FoundingContent),
    Footer(FooterContent),
    Branding(BrandingContent),
}

/// Every section the landing page renders, read from one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LandingPage {
    pub hero: HeroContent,
    pub problem: ProblemContent,
    pub features: FeaturesContent,
    pub demo: DemoContent,
    pub pricing: PricingContent,
    pub audience: AudienceContent,
    pub founding: FoundingContent,
    pub footer: FooterContent,
}

impl LandingPage {
    #[must_use]
    pub fn from_content(content: &SiteContent) -> Self {
        Self {
            hero: HeroContent::from_content(content),
            problem: ProblemContent::from_content(content),
            features: FeaturesContent::from_content(content),
            demo: DemoContent::from_content(content),
            pricing: PricingContent::from_content(content),
            audience: AudienceContent::from_content(content),
            founding: FoundingContent::from_content(content),
            footer: FooterContent::from_content(content),
        }
    }
}
