use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariantId(String);

impl VariantId {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyVariantId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VariantId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VariantId> for String {
    fn from(value: VariantId) -> Self {
        value.0
    }
}

impl Display for VariantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoration color of a variant: swatch fill, selection ring, glow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccentColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl AccentColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb`. Surrounding whitespace is ignored.
    pub fn from_hex(hex: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidAccentColor(hex.to_string());
        let trimmed = hex.trim();
        let digits = trimmed.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Relative luminance in `0.0..=1.0`, used to pick a readable check mark.
    pub fn luminance(self) -> f32 {
        (0.2126 * f32::from(self.r) + 0.7152 * f32::from(self.g) + 0.0722 * f32::from(self.b))
            / 255.0
    }

    pub fn is_light(self) -> bool {
        self.luminance() > 0.6
    }
}

impl TryFrom<String> for AccentColor {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<AccentColor> for String {
    fn from(value: AccentColor) -> Self {
        value.to_hex()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

const FALLBACK_IMAGE_REF: &str = "builtin:placeholder";

impl ImageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The single reference substituted for any image that failed to load.
    pub fn fallback() -> Self {
        Self(FALLBACK_IMAGE_REF.to_string())
    }

    pub fn is_fallback(&self) -> bool {
        self.0 == FALLBACK_IMAGE_REF
    }

    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ImageRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    #[serde(rename = "name")]
    pub display_name: String,
    pub accent: AccentColor,
    pub image: ImageRef,
}

impl Variant {
    pub fn new(
        id: &str,
        display_name: &str,
        accent: &str,
        image: &str,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: VariantId::new(id)?,
            display_name: display_name.to_string(),
            accent: AccentColor::from_hex(accent)?,
            image: ImageRef::new(image),
        })
    }
}

/// The fixed universe of selectable variants. Construction is the only
/// place invariants are checked; a `Catalog` is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    variants: Vec<Variant>,
}

impl Catalog {
    pub fn new(variants: Vec<Variant>) -> Result<Self, DomainError> {
        if variants.is_empty() {
            return Err(DomainError::EmptyCatalog);
        }

        let mut seen = HashSet::with_capacity(variants.len());
        for variant in &variants {
            if !seen.insert(variant.id.as_str()) {
                return Err(DomainError::DuplicateVariantId(variant.id.to_string()));
            }
            if variant.image.as_str().trim().is_empty() {
                return Err(DomainError::EmptyImageRef(variant.id.to_string()));
            }
        }

        Ok(Self { variants })
    }

    pub fn first(&self) -> &Variant {
        &self.variants[0]
    }

    pub fn get(&self, id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|variant| &variant.id == id)
    }

    pub fn contains(&self, id: &VariantId) -> bool {
        self.get(id).is_some()
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn images(&self) -> Vec<ImageRef> {
        self.variants
            .iter()
            .map(|variant| variant.image.clone())
            .collect()
    }
}
