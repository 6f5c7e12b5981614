use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Record identifier. The dataset stores ids as JSON numbers, but numeric
/// strings are accepted too.
pub type Id = u64;

/// Deserialize an [`Id`] from either a JSON number or a numeric string.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<Id, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id \"{}\"", s))),
    }
}

/// A collection exposed by the Collection API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Products,
    Brands,
    Categories,
    Subcategories,
    Supercategories,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Products,
        Resource::Brands,
        Resource::Categories,
        Resource::Subcategories,
        Resource::Supercategories,
    ];

    /// URL path segment / dataset key
    pub fn path(self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::Brands => "brands",
            Resource::Categories => "categories",
            Resource::Subcategories => "subcategories",
            Resource::Supercategories => "supercategories",
        }
    }

    /// Human-readable label for tabs and headings
    pub fn label(self) -> &'static str {
        match self {
            Resource::Products => "Products",
            Resource::Brands => "Brands",
            Resource::Categories => "Categories",
            Resource::Subcategories => "Subcategories",
            Resource::Supercategories => "Supercategories",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A related entity that can be inlined into a response with `_expand`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    Brand,
    Category,
    Subcategory,
    Supercategory,
}

impl Relation {
    /// Every relation a product carries, in expansion order
    pub const PRODUCT: [Relation; 4] = [
        Relation::Brand,
        Relation::Category,
        Relation::Subcategory,
        Relation::Supercategory,
    ];

    /// The `_expand` value (singular resource name)
    pub fn name(self) -> &'static str {
        match self {
            Relation::Brand => "brand",
            Relation::Category => "category",
            Relation::Subcategory => "subcategory",
            Relation::Supercategory => "supercategory",
        }
    }

    /// Foreign key field on the referencing record
    pub fn foreign_key(self) -> &'static str {
        match self {
            Relation::Brand => "brandId",
            Relation::Category => "categoryId",
            Relation::Subcategory => "subcategoryId",
            Relation::Supercategory => "supercategoryId",
        }
    }

    /// The collection the foreign key points into
    pub fn target(self) -> Resource {
        match self {
            Relation::Brand => Resource::Brands,
            Relation::Category => Resource::Categories,
            Relation::Subcategory => Resource::Subcategories,
            Relation::Supercategory => Resource::Supercategories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supercategory {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: Id,
    pub name: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub supercategory_id: Id,
    /// Present when requested with `_expand=supercategory`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supercategory: Option<Supercategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: Id,
    pub name: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub category_id: Id,
    /// Present when requested with `_expand=category`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// A product as returned by the Collection API, optionally with its
/// related records inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub stock: u64,
    #[serde(default)]
    pub img_url: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub brand_id: Id,
    #[serde(deserialize_with = "deserialize_id")]
    pub supercategory_id: Id,
    #[serde(deserialize_with = "deserialize_id")]
    pub category_id: Id,
    #[serde(deserialize_with = "deserialize_id")]
    pub subcategory_id: Id,

    // --- Expanded relations ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<Brand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<Subcategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supercategory: Option<Supercategory>,
}

impl Product {
    /// Name of the expanded brand, or the raw id when it was not expanded
    pub fn brand_label(&self) -> String {
        self.brand
            .as_ref()
            .map(|b| b.name.clone())
            .unwrap_or_else(|| self.brand_id.to_string())
    }

    pub fn category_label(&self) -> String {
        self.category
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| self.category_id.to_string())
    }

    pub fn subcategory_label(&self) -> String {
        self.subcategory
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| self.subcategory_id.to_string())
    }

    pub fn supercategory_label(&self) -> String {
        self.supercategory
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| self.supercategory_id.to_string())
    }
}

/// Request body for creating or replacing a product (no id, no expansions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub description: String,
    pub price: f64,
    pub stock: u64,
    pub img_url: String,
    pub brand_id: Id,
    pub supercategory_id: Id,
    pub category_id: Id,
    pub subcategory_id: Id,
}
