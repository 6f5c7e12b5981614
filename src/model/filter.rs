use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::entity::Id;

/// A set-valued filter dimension of the product list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Brand,
    Supercategory,
    Category,
    Subcategory,
}

impl Dimension {
    /// Display and query order
    pub const ALL: [Dimension; 4] = [
        Dimension::Brand,
        Dimension::Supercategory,
        Dimension::Category,
        Dimension::Subcategory,
    ];

    /// The product field this dimension filters on
    pub fn field(self) -> &'static str {
        match self {
            Dimension::Brand => "brandId",
            Dimension::Supercategory => "supercategoryId",
            Dimension::Category => "categoryId",
            Dimension::Subcategory => "subcategoryId",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Brand => "Brand",
            Dimension::Supercategory => "Supercategory",
            Dimension::Category => "Category",
            Dimension::Subcategory => "Subcategory",
        }
    }

    /// Dimensions cleared when this one is replaced
    pub fn dependents(self) -> &'static [Dimension] {
        match self {
            Dimension::Supercategory => &[Dimension::Category, Dimension::Subcategory],
            Dimension::Category => &[Dimension::Subcategory],
            Dimension::Brand | Dimension::Subcategory => &[],
        }
    }
}

/// Current filter choices of the product list.
///
/// An empty set or an empty search text means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub brand_ids: BTreeSet<Id>,
    pub supercategory_ids: BTreeSet<Id>,
    pub category_ids: BTreeSet<Id>,
    pub subcategory_ids: BTreeSet<Id>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub search_text: String,
}

impl FilterSelection {
    pub fn values(&self, dimension: Dimension) -> &BTreeSet<Id> {
        match dimension {
            Dimension::Brand => &self.brand_ids,
            Dimension::Supercategory => &self.supercategory_ids,
            Dimension::Category => &self.category_ids,
            Dimension::Subcategory => &self.subcategory_ids,
        }
    }

    pub fn values_mut(&mut self, dimension: Dimension) -> &mut BTreeSet<Id> {
        match dimension {
            Dimension::Brand => &mut self.brand_ids,
            Dimension::Supercategory => &mut self.supercategory_ids,
            Dimension::Category => &mut self.category_ids,
            Dimension::Subcategory => &mut self.subcategory_ids,
        }
    }

    pub fn has_price_range(&self) -> bool {
        self.price_min.is_some() || self.price_max.is_some()
    }
}

/// Zero-based page cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
}

pub const DEFAULT_PAGE_SIZE: usize = 10;

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Number of pages needed for `total` items (at least 1)
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size.max(1)).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("invalid sort order \"{}\" (expected asc or desc)", other)),
        }
    }
}

/// Single-column sort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        SortSpec {
            field: field.into(),
            direction,
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec::new("name", SortDirection::Asc)
    }
}
