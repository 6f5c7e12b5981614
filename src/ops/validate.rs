//! Product form model and its validation rules.
//!
//! Validation runs synchronously on the draft before anything is sent to the
//! Collection API, and reports every failing field at once.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Id, NewProduct, Product};

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d{1,2})?$").expect("invalid price regex"));

static STOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("invalid stock regex"));

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("invalid url regex"));

/// Every input of the product form, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Sku,
    Description,
    Price,
    Stock,
    ImgUrl,
    Brand,
    Supercategory,
    Category,
    Subcategory,
}

impl FormField {
    pub const ALL: [FormField; 10] = [
        FormField::Name,
        FormField::Sku,
        FormField::Description,
        FormField::Price,
        FormField::Stock,
        FormField::ImgUrl,
        FormField::Brand,
        FormField::Supercategory,
        FormField::Category,
        FormField::Subcategory,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Name",
            FormField::Sku => "SKU",
            FormField::Description => "Description",
            FormField::Price => "Price",
            FormField::Stock => "Stock",
            FormField::ImgUrl => "Image URL",
            FormField::Brand => "Brand",
            FormField::Supercategory => "Supercategory",
            FormField::Category => "Category",
            FormField::Subcategory => "Subcategory",
        }
    }

    /// Free-text inputs; the rest are selects
    pub fn is_text(self) -> bool {
        !self.is_select()
    }

    pub fn is_select(self) -> bool {
        matches!(
            self,
            FormField::Brand | FormField::Supercategory | FormField::Category | FormField::Subcategory
        )
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A validation failure attached to one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

impl FieldError {
    fn new(field: FormField, message: impl Into<String>) -> Self {
        FieldError {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Raw, unvalidated form input. Numbers stay as typed until [`validate`]
/// parses them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub sku: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub img_url: String,
    pub brand_id: Option<Id>,
    pub supercategory_id: Option<Id>,
    pub category_id: Option<Id>,
    pub subcategory_id: Option<Id>,
}

impl ProductDraft {
    /// Prefill from an existing product (edit mode)
    pub fn from_product(product: &Product) -> Self {
        ProductDraft {
            name: product.name.clone(),
            sku: product.sku.clone(),
            description: product.description.clone(),
            price: crate::ops::query::format_number(product.price),
            stock: product.stock.to_string(),
            img_url: product.img_url.clone(),
            brand_id: Some(product.brand_id),
            supercategory_id: Some(product.supercategory_id),
            category_id: Some(product.category_id),
            subcategory_id: Some(product.subcategory_id),
        }
    }

    pub fn text(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Name => Some(&self.name),
            FormField::Sku => Some(&self.sku),
            FormField::Description => Some(&self.description),
            FormField::Price => Some(&self.price),
            FormField::Stock => Some(&self.stock),
            FormField::ImgUrl => Some(&self.img_url),
            _ => None,
        }
    }

    pub fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Name => Some(&mut self.name),
            FormField::Sku => Some(&mut self.sku),
            FormField::Description => Some(&mut self.description),
            FormField::Price => Some(&mut self.price),
            FormField::Stock => Some(&mut self.stock),
            FormField::ImgUrl => Some(&mut self.img_url),
            _ => None,
        }
    }

    pub fn selected(&self, field: FormField) -> Option<Id> {
        match field {
            FormField::Brand => self.brand_id,
            FormField::Supercategory => self.supercategory_id,
            FormField::Category => self.category_id,
            FormField::Subcategory => self.subcategory_id,
            _ => None,
        }
    }

    /// Set a select field. Changing the supercategory clears category and
    /// subcategory; changing the category clears the subcategory. Selecting
    /// the value already chosen changes nothing.
    pub fn select(&mut self, field: FormField, id: Option<Id>) {
        match field {
            FormField::Brand => self.brand_id = id,
            FormField::Supercategory => {
                if self.supercategory_id != id {
                    self.supercategory_id = id;
                    self.category_id = None;
                    self.subcategory_id = None;
                }
            }
            FormField::Category => {
                if self.category_id != id {
                    self.category_id = id;
                    self.subcategory_id = None;
                }
            }
            FormField::Subcategory => self.subcategory_id = id,
            _ => {}
        }
    }
}

/// Check every rule and return the request body, or all field errors in
/// form order.
pub fn validate(draft: &ProductDraft) -> Result<NewProduct, Vec<FieldError>> {
    let mut errors = Vec::new();

    require_text(&mut errors, FormField::Name, &draft.name, "Name is required");
    require_text(&mut errors, FormField::Sku, &draft.sku, "SKU is required");
    require_text(
        &mut errors,
        FormField::Description,
        &draft.description,
        "Description is required",
    );

    let price = parse_price(&draft.price).unwrap_or_else(|e| {
        errors.push(e);
        0.0
    });
    let stock = parse_stock(&draft.stock).unwrap_or_else(|e| {
        errors.push(e);
        0
    });

    if !draft.img_url.is_empty() && !URL_RE.is_match(&draft.img_url) {
        errors.push(FieldError::new(
            FormField::ImgUrl,
            "Must be a URL starting with http:// or https://",
        ));
    }

    let brand_id = require_select(&mut errors, FormField::Brand, draft.brand_id);
    let supercategory_id =
        require_select(&mut errors, FormField::Supercategory, draft.supercategory_id);
    let category_id = require_select(&mut errors, FormField::Category, draft.category_id);
    let subcategory_id = require_select(&mut errors, FormField::Subcategory, draft.subcategory_id);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewProduct {
        name: draft.name.clone(),
        sku: draft.sku.clone(),
        description: draft.description.clone(),
        price,
        stock,
        img_url: draft.img_url.clone(),
        brand_id: brand_id.unwrap_or_default(),
        supercategory_id: supercategory_id.unwrap_or_default(),
        category_id: category_id.unwrap_or_default(),
        subcategory_id: subcategory_id.unwrap_or_default(),
    })
}

fn require_text(errors: &mut Vec<FieldError>, field: FormField, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, message));
    }
}

fn require_select(errors: &mut Vec<FieldError>, field: FormField, value: Option<Id>) -> Option<Id> {
    if value.is_none() {
        errors.push(FieldError::new(field, format!("{} is required", field.label())));
    }
    value
}

fn parse_price(raw: &str) -> Result<f64, FieldError> {
    if raw.is_empty() {
        return Err(FieldError::new(FormField::Price, "Price is required"));
    }
    if !PRICE_RE.is_match(raw) {
        return Err(FieldError::new(
            FormField::Price,
            "Must be a number with at most two decimals",
        ));
    }
    let price: f64 = raw
        .parse()
        .map_err(|_| FieldError::new(FormField::Price, "Must be a number"))?;
    if price <= 0.0 {
        return Err(FieldError::new(FormField::Price, "Price must be greater than 0"));
    }
    Ok(price)
}

fn parse_stock(raw: &str) -> Result<u64, FieldError> {
    if raw.is_empty() {
        return Err(FieldError::new(FormField::Stock, "Stock is required"));
    }
    if !STOCK_RE.is_match(raw) {
        return Err(FieldError::new(FormField::Stock, "Must be a whole number"));
    }
    raw.parse()
        .map_err(|_| FieldError::new(FormField::Stock, "Stock is too large"))
}
