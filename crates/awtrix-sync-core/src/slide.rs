//! Display content: slides and slide sets.
//!
//! A [`SlideSet`] is what a producer hands to the display for one unit. Order
//! is display order. An empty set is meaningful: the device treats it as
//! "remove this unit".

use crate::error::{Result, SyncError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// RGB color, serialized as `"#RRGGBB"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const YELLOW: Color = Color::rgb(0xFF, 0xFF, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SyncError::InvalidColor(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| SyncError::InvalidColor(s.to_string()))
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Slide
// ---------------------------------------------------------------------------

/// One page of a widget as the device expects it on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub text: String,
    /// Seconds the slide stays on screen.
    pub duration: NonZeroU32,
    pub color: Color,
    #[serde(default)]
    pub no_scroll: bool,
}

impl Slide {
    pub fn new(text: impl Into<String>, duration_secs: u32, color: Color) -> Result<Self> {
        let duration = NonZeroU32::new(duration_secs)
            .ok_or_else(|| SyncError::InvalidSlide("duration must be positive".to_string()))?;
        Ok(Self {
            text: text.into(),
            duration,
            color,
            no_scroll: false,
        })
    }

    pub fn no_scroll(mut self, no_scroll: bool) -> Self {
        self.no_scroll = no_scroll;
        self
    }
}

// ---------------------------------------------------------------------------
// SlideSet
// ---------------------------------------------------------------------------

/// Ordered slides for one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideSet(Vec<Slide>);

impl SlideSet {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self(slides)
    }

    /// The "remove this unit" payload.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, slide: Slide) {
        self.0.push(slide);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slide> {
        self.0.iter()
    }
}

impl From<Vec<Slide>> for SlideSet {
    fn from(slides: Vec<Slide>) -> Self {
        Self(slides)
    }
}

impl FromIterator<Slide> for SlideSet {
    fn from_iter<I: IntoIterator<Item = Slide>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SlideSet {
    type Item = &'a Slide;
    type IntoIter = std::slice::Iter<'a, Slide>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
