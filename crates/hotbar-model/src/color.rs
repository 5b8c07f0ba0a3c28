//! Palette colors
//!
//! Provides [`ColorId`] for naming colors and [`Palette`] for resolving them
//! to [`Rgb`] values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Swatch used when a color is not in the palette
pub const FALLBACK_RGB: Rgb = Rgb::new(255, 0, 255);

/// Opaque palette color identifier
///
/// Equality is by value; the identifier carries no color data itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorId(String);

impl ColorId {
    /// Create identifier from a name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get identifier as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ColorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColorId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ColorId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl FromStr for ColorId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.trim()))
    }
}

/// 8-bit RGB triple, serialized as `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Create color from components
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    /// Components as array
    #[inline]
    #[must_use]
    pub const fn to_array(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }

    /// Uppercase `#RRGGBB` form
    #[must_use]
    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

const DYES: [(&str, Rgb); 16] = [
    ("white", Rgb::new(249, 255, 254)),
    ("light_gray", Rgb::new(157, 157, 151)),
    ("gray", Rgb::new(71, 79, 82)),
    ("black", Rgb::new(29, 29, 33)),
    ("brown", Rgb::new(131, 84, 50)),
    ("red", Rgb::new(176, 46, 38)),
    ("orange", Rgb::new(249, 128, 29)),
    ("yellow", Rgb::new(254, 216, 61)),
    ("lime", Rgb::new(128, 199, 31)),
    ("green", Rgb::new(94, 124, 22)),
    ("cyan", Rgb::new(22, 156, 156)),
    ("light_blue", Rgb::new(58, 179, 218)),
    ("blue", Rgb::new(60, 68, 170)),
    ("purple", Rgb::new(137, 50, 184)),
    ("magenta", Rgb::new(199, 78, 189)),
    ("pink", Rgb::new(243, 139, 170)),
];

/// Ordered color table
///
/// Iteration order is insertion order; it defines the "all colors" pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    colors: IndexMap<ColorId, Rgb>,
}

impl Palette {
    /// Create empty palette
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            colors: IndexMap::new(),
        }
    }

    /// The 16 dye colors
    #[must_use]
    pub fn dyes() -> Self {
        DYES.iter()
            .fold(Self::new(), |palette, (name, rgb)| palette.with_color(*name, *rgb))
    }

    /// Add or replace a color
    #[inline]
    #[must_use]
    pub fn with_color(mut self, id: impl Into<ColorId>, rgb: Rgb) -> Self {
        self.colors.insert(id.into(), rgb);
        self
    }

    /// Resolve color to RGB
    #[inline]
    #[must_use]
    pub fn get(&self, id: &ColorId) -> Option<Rgb> {
        self.colors.get(id).copied()
    }

    /// Check if palette has color
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &ColorId) -> bool {
        self.colors.contains_key(id)
    }

    /// Color identifiers in palette order
    pub fn ids(&self) -> impl Iterator<Item = &ColorId> {
        self.colors.keys()
    }

    /// `(id, rgb)` pairs in palette order
    pub fn iter(&self) -> impl Iterator<Item = (&ColorId, Rgb)> {
        self.colors.iter().map(|(id, rgb)| (id, *rgb))
    }

    /// Number of colors
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Check if palette is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for Palette {
    /// The dye palette
    fn default() -> Self {
        Self::dyes()
    }
}
