//! Translation of list state into Collection API query parameters.
//!
//! [`build_query`] is a pure function: the same selection, pagination and sort
//! always produce the same [`QueryEnvelope`], and the envelope always renders
//! to the same parameter list.

use crate::model::{
    Dimension, FilterSelection, Pagination, Relation, Resource, SortDirection, SortSpec,
};

/// Case-insensitive substring filter (`<field>_like=<term>`)
#[derive(Debug, Clone, PartialEq)]
pub struct TextFilter {
    pub field: String,
    pub term: String,
}

/// Set membership, OR'd across values (`<field>=<v1>&<field>=<v2>`)
#[derive(Debug, Clone, PartialEq)]
pub struct SetFilter {
    pub field: String,
    pub values: Vec<String>,
}

/// Inclusive numeric range (`<field>_gte` / `<field>_lte`)
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    pub field: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// One-based page request (`_page` / `_limit`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

/// The flattened request sent to a collection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryEnvelope {
    pub expand: Vec<Relation>,
    pub text: Vec<TextFilter>,
    pub page: Option<PageRequest>,
    pub sort: Option<SortSpec>,
    pub sets: Vec<SetFilter>,
    pub ranges: Vec<RangeFilter>,
}

impl QueryEnvelope {
    /// No filters, no paging: the whole collection
    pub fn all() -> Self {
        QueryEnvelope::default()
    }

    /// Add expansion directives
    pub fn with_expand(mut self, relations: &[Relation]) -> Self {
        self.expand.extend_from_slice(relations);
        self
    }

    /// Add a single-value equality filter
    pub fn with_eq(mut self, field: &str, value: impl ToString) -> Self {
        self.sets.push(SetFilter {
            field: field.to_string(),
            values: vec![value.to_string()],
        });
        self
    }

    /// Render as ordered `(key, value)` pairs, unencoded
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for relation in &self.expand {
            pairs.push(("_expand".to_string(), relation.name().to_string()));
        }
        for text in &self.text {
            pairs.push((format!("{}_like", text.field), text.term.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("_page".to_string(), page.page.to_string()));
            pairs.push(("_limit".to_string(), page.limit.to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("_sort".to_string(), sort.field.clone()));
            pairs.push(("_order".to_string(), sort.direction.as_str().to_string()));
        }
        for set in &self.sets {
            for value in &set.values {
                pairs.push((set.field.clone(), value.clone()));
            }
        }
        for range in &self.ranges {
            if let Some(min) = range.min {
                pairs.push((format!("{}_gte", range.field), format_number(min)));
            }
            if let Some(max) = range.max {
                pairs.push((format!("{}_lte", range.field), format_number(max)));
            }
        }
        pairs
    }

    /// Render as a percent-encoded query string (without the leading `?`)
    pub fn to_query_string(&self) -> String {
        self.to_pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Format a number without a trailing `.0` when it is integral
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

/// What a list view queries: its collection, the relations to inline and the
/// field free-text search applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSpec {
    pub resource: Resource,
    pub expand: Vec<Relation>,
    pub search_field: &'static str,
}

impl ListSpec {
    /// Products with brand, category, subcategory and supercategory inlined
    pub fn products() -> Self {
        ListSpec {
            resource: Resource::Products,
            expand: Relation::PRODUCT.to_vec(),
            search_field: "name",
        }
    }

    /// The list spec each collection's tab uses
    pub fn for_resource(resource: Resource) -> Self {
        let expand = match resource {
            Resource::Products => return ListSpec::products(),
            Resource::Categories => vec![Relation::Supercategory],
            Resource::Subcategories => vec![Relation::Category],
            Resource::Brands | Resource::Supercategories => Vec::new(),
        };
        ListSpec {
            resource,
            expand,
            search_field: "name",
        }
    }
}

/// Build the product list query.
pub fn build_query(
    selection: &FilterSelection,
    pagination: Pagination,
    sort: Option<&SortSpec>,
) -> QueryEnvelope {
    build_list_query(&ListSpec::products(), selection, pagination, sort)
}

/// Build a secondary list query (brands, categories, ...) where search text is
/// the only filter.
pub fn build_resource_query(
    spec: &ListSpec,
    search: &str,
    pagination: Pagination,
    sort: Option<&SortSpec>,
) -> QueryEnvelope {
    let selection = FilterSelection {
        search_text: search.to_string(),
        ..Default::default()
    };
    build_list_query(spec, &selection, pagination, sort)
}

/// Build the query for any list view.
///
/// - non-empty search text → `<search_field>_like`
/// - each non-empty dimension → repeated equality filter
/// - price bounds → `price_gte` / `price_lte`
/// - page index is zero-based, `_page` is one-based
/// - no sort means name ascending
pub fn build_list_query(
    spec: &ListSpec,
    selection: &FilterSelection,
    pagination: Pagination,
    sort: Option<&SortSpec>,
) -> QueryEnvelope {
    let mut envelope = QueryEnvelope {
        expand: spec.expand.clone(),
        ..Default::default()
    };

    if !selection.search_text.is_empty() {
        envelope.text.push(TextFilter {
            field: spec.search_field.to_string(),
            term: selection.search_text.clone(),
        });
    }

    envelope.page = Some(PageRequest {
        page: pagination.page_index + 1,
        limit: pagination.page_size,
    });

    envelope.sort = Some(
        sort.cloned()
            .unwrap_or_else(|| SortSpec::new("name", SortDirection::Asc)),
    );

    for dimension in Dimension::ALL {
        let values = selection.values(dimension);
        if !values.is_empty() {
            envelope.sets.push(SetFilter {
                field: dimension.field().to_string(),
                values: values.iter().map(|id| id.to_string()).collect(),
            });
        }
    }

    if selection.has_price_range() {
        envelope.ranges.push(RangeFilter {
            field: "price".to_string(),
            min: selection.price_min,
            max: selection.price_max,
        });
    }

    envelope
}
