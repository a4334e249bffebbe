use std::fmt;
use std::num::NonZeroU32;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identity of one directory view.
///
/// Two views showing the same directory still have distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(NonZeroU32);

impl ViewId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// The property columns shown for every listed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnProperty {
    Name,
    DateModified,
    Type,
    Size,
}

impl ColumnProperty {
    pub const ALL: [ColumnProperty; 4] = [
        ColumnProperty::Name,
        ColumnProperty::DateModified,
        ColumnProperty::Type,
        ColumnProperty::Size,
    ];

    /// Position of the column in a row.
    pub fn index(self) -> usize {
        match self {
            ColumnProperty::Name => 0,
            ColumnProperty::DateModified => 1,
            ColumnProperty::Type => 2,
            ColumnProperty::Size => 3,
        }
    }

    pub fn default_width(self) -> f64 {
        match self {
            ColumnProperty::Name => 200.0,
            ColumnProperty::DateModified => 130.0,
            ColumnProperty::Type => 80.0,
            ColumnProperty::Size => 80.0,
        }
    }
}

/// Pixel widths for each property column.
///
/// Owned by a view and copied into every entry it lists, so rows rendered
/// after a refresh line up with the ones already on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnWidths(IndexMap<ColumnProperty, f64>);

impl ColumnWidths {
    pub fn get(&self, property: ColumnProperty) -> f64 {
        self.0
            .get(&property)
            .copied()
            .unwrap_or_else(|| property.default_width())
    }

    pub fn set(&mut self, property: ColumnProperty, width: f64) {
        self.0.insert(property, width.max(0.0));
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColumnProperty, f64)> + '_ {
        ColumnProperty::ALL.into_iter().map(|p| (p, self.get(p)))
    }
}

impl Default for ColumnWidths {
    fn default() -> Self {
        Self(
            ColumnProperty::ALL
                .into_iter()
                .map(|p| (p, p.default_width()))
                .collect(),
        )
    }
}

impl FromIterator<(ColumnProperty, f64)> for ColumnWidths {
    fn from_iter<I: IntoIterator<Item = (ColumnProperty, f64)>>(iter: I) -> Self {
        let mut widths = Self::default();
        for (property, width) in iter {
            widths.set(property, width);
        }
        widths
    }
}
