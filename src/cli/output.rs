use serde::Serialize;
use serde_json::Value;

use crate::model::{Category, Id, Pagination, Product, Subcategory};
use crate::ops::query::format_number;
use crate::ops::validate::FieldError;
use crate::util::text::{display_width, fit_left, fit_right};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

/// One page of any collection
#[derive(Serialize)]
pub struct ListJson {
    pub resource: String,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total: usize,
    pub items: Vec<Value>,
}

/// Output of `--print-query`
#[derive(Serialize)]
pub struct QueryJson {
    pub resource: String,
    pub params: Vec<(String, String)>,
    pub query: String,
}

#[derive(Serialize)]
pub struct FieldErrorJson {
    pub field: String,
    pub message: String,
}

impl From<&FieldError> for FieldErrorJson {
    fn from(e: &FieldError) -> Self {
        FieldErrorJson {
            field: e.field.label().to_string(),
            message: e.message.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// Lay out rows under a header. Columns size to their widest cell, capped at
/// `max_width`; `numeric` columns are right-aligned.
pub fn format_table(
    headers: &[&str],
    rows: &[Vec<String>],
    numeric: &[bool],
    max_width: usize,
) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(display_width(cell)).min(max_width);
            }
        }
    }

    let render = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let width = widths.get(i).copied().unwrap_or(0);
                if numeric.get(i).copied().unwrap_or(false) {
                    fit_right(cell, width)
                } else {
                    fit_left(cell, width)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render(headers.to_vec()));
    for row in rows {
        lines.push(render(row.iter().map(String::as_str).collect()));
    }
    lines
}

const NAME_WIDTH: usize = 32;

pub fn format_product_table(products: &[Product]) -> Vec<String> {
    let rows: Vec<Vec<String>> = products
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.name.clone(),
                p.sku.clone(),
                format_price(p.price),
                p.stock.to_string(),
                p.brand_label(),
                p.category_label(),
            ]
        })
        .collect();
    format_table(
        &["ID", "NAME", "SKU", "PRICE", "STOCK", "BRAND", "CATEGORY"],
        &rows,
        &[true, false, false, true, true, false, false],
        NAME_WIDTH,
    )
}

/// `(id, name)` rows for brands and supercategories
pub fn format_name_table(rows: &[(Id, String)]) -> Vec<String> {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|(id, name)| vec![id.to_string(), name.clone()])
        .collect();
    format_table(&["ID", "NAME"], &rows, &[true, false], NAME_WIDTH)
}

pub fn format_category_table(categories: &[Category]) -> Vec<String> {
    let rows: Vec<Vec<String>> = categories
        .iter()
        .map(|c| {
            let parent = c
                .supercategory
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_else(|| c.supercategory_id.to_string());
            vec![c.id.to_string(), c.name.clone(), parent]
        })
        .collect();
    format_table(
        &["ID", "NAME", "SUPERCATEGORY"],
        &rows,
        &[true, false, false],
        NAME_WIDTH,
    )
}

pub fn format_subcategory_table(subcategories: &[Subcategory]) -> Vec<String> {
    let rows: Vec<Vec<String>> = subcategories
        .iter()
        .map(|s| {
            let parent = s
                .category
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| s.category_id.to_string());
            vec![s.id.to_string(), s.name.clone(), parent]
        })
        .collect();
    format_table(
        &["ID", "NAME", "CATEGORY"],
        &rows,
        &[true, false, false],
        NAME_WIDTH,
    )
}

/// `page 2/5 (47 total)`
pub fn format_page_footer(pagination: Pagination, total: usize) -> String {
    format!(
        "page {}/{} ({} total)",
        pagination.page_index + 1,
        pagination.page_count(total).max(1),
        total
    )
}

pub fn format_product_detail(product: &Product) -> Vec<String> {
    let mut lines = vec![format!("#{} {}", product.id, product.name)];
    lines.push(format!("sku: {}", product.sku));
    lines.push(format!("price: {}", format_price(product.price)));
    lines.push(format!("stock: {}", product.stock));
    lines.push(format!("brand: {}", product.brand_label()));
    lines.push(format!(
        "category: {} > {} > {}",
        product.supercategory_label(),
        product.category_label(),
        product.subcategory_label()
    ));
    if !product.img_url.is_empty() {
        lines.push(format!("image: {}", product.img_url));
    }
    if !product.description.is_empty() {
        lines.push("description:".to_string());
        for line in product.description.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

pub fn format_field_errors(errors: &[FieldError]) -> Vec<String> {
    errors.iter().map(|e| format!("  {}", e)).collect()
}

/// `$1299.99`, `$300`
pub fn format_price(price: f64) -> String {
    format!("${}", format_number(price))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Brand;
    use crate::ops::validate::FormField;

    fn product() -> Product {
        Product {
            id: 12,
            name: "Laptop Pro".into(),
            sku: "LP-1".into(),
            description: "Fast.\nLight.".into(),
            price: 1299.99,
            stock: 4,
            img_url: String::new(),
            brand_id: 1,
            supercategory_id: 1,
            category_id: 10,
            subcategory_id: 100,
            brand: Some(Brand {
                id: 1,
                name: "Acme".into(),
            }),
            category: None,
            subcategory: None,
            supercategory: None,
        }
    }

    #[test]
    fn product_table_aligns_columns() {
        let lines = format_product_table(&[product()]);
        insta::assert_snapshot!(lines.join("\n"), @r"
        ID  NAME        SKU      PRICE  STOCK  BRAND  CATEGORY
        12  Laptop Pro  LP-1  $1299.99      4  Acme   10
        ");
    }

    #[test]
    fn detail_lists_relations_and_description() {
        let lines = format_product_detail(&product());
        insta::assert_snapshot!(lines.join("\n"), @r"
        #12 Laptop Pro
        sku: LP-1
        price: $1299.99
        stock: 4
        brand: Acme
        category: 1 > 10 > 100
        description:
          Fast.
          Light.
        ");
    }

    #[test]
    fn long_cells_are_truncated() {
        let rows = vec![vec!["1".to_string(), "x".repeat(50)]];
        let lines = format_table(&["ID", "NAME"], &rows, &[true, false], 10);
        assert_eq!(display_width(&lines[1]), 2 + 2 + 10);
    }

    #[test]
    fn footer_never_shows_zero_pages() {
        let p = Pagination {
            page_index: 0,
            page_size: 10,
        };
        assert_eq!(format_page_footer(p, 0), "page 1/1 (0 total)");
        assert_eq!(format_page_footer(p, 47), "page 1/5 (47 total)");
    }

    #[test]
    fn field_errors_are_indented() {
        let errors = vec![FieldError {
            field: FormField::Price,
            message: "Must be greater than 0".into(),
        }];
        assert_eq!(format_field_errors(&errors), vec!["  Price: Must be greater than 0"]);
    }
}
