use std::collections::BTreeSet;

use super::entity::{Brand, Category, Id, Subcategory, Supercategory};
use super::filter::{Dimension, FilterSelection};

/// The reference data behind the filter selectors: brands plus the
/// Supercategory → Category → Subcategory tree.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    pub brands: Vec<Brand>,
    pub supercategories: Vec<Supercategory>,
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
}

impl Taxonomy {
    /// Categories whose parent is in `supercategory_ids`.
    /// Empty when no supercategory is selected.
    pub fn categories_under(&self, supercategory_ids: &BTreeSet<Id>) -> Vec<&Category> {
        self.categories
            .iter()
            .filter(|c| supercategory_ids.contains(&c.supercategory_id))
            .collect()
    }

    /// Subcategories whose parent is in `category_ids`.
    /// Empty when no category is selected.
    pub fn subcategories_under(&self, category_ids: &BTreeSet<Id>) -> Vec<&Subcategory> {
        self.subcategories
            .iter()
            .filter(|s| category_ids.contains(&s.category_id))
            .collect()
    }

    /// Selectable (id, name) options for a dimension given the current selection.
    pub fn options(&self, dimension: Dimension, selection: &FilterSelection) -> Vec<(Id, String)> {
        match dimension {
            Dimension::Brand => self.brands.iter().map(|b| (b.id, b.name.clone())).collect(),
            Dimension::Supercategory => self
                .supercategories
                .iter()
                .map(|s| (s.id, s.name.clone()))
                .collect(),
            Dimension::Category => self
                .categories_under(&selection.supercategory_ids)
                .into_iter()
                .map(|c| (c.id, c.name.clone()))
                .collect(),
            Dimension::Subcategory => self
                .subcategories_under(&selection.category_ids)
                .into_iter()
                .map(|s| (s.id, s.name.clone()))
                .collect(),
        }
    }

    /// Display name for a filter value, falling back to the raw id
    pub fn label(&self, dimension: Dimension, id: Id) -> String {
        let name = match dimension {
            Dimension::Brand => self.brands.iter().find(|b| b.id == id).map(|b| &b.name),
            Dimension::Supercategory => self
                .supercategories
                .iter()
                .find(|s| s.id == id)
                .map(|s| &s.name),
            Dimension::Category => self.categories.iter().find(|c| c.id == id).map(|c| &c.name),
            Dimension::Subcategory => self
                .subcategories
                .iter()
                .find(|s| s.id == id)
                .map(|s| &s.name),
        };
        name.cloned().unwrap_or_else(|| id.to_string())
    }

    pub fn parent_of_category(&self, category_id: Id) -> Option<Id> {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.supercategory_id)
    }

    pub fn parent_of_subcategory(&self, subcategory_id: Id) -> Option<Id> {
        self.subcategories
            .iter()
            .find(|s| s.id == subcategory_id)
            .map(|s| s.category_id)
    }

    /// Whether every selected category sits under a selected supercategory and
    /// every selected subcategory under a selected category.
    pub fn is_consistent(&self, selection: &FilterSelection) -> bool {
        let categories_ok = selection.category_ids.iter().all(|id| {
            self.parent_of_category(*id)
                .is_some_and(|p| selection.supercategory_ids.contains(&p))
        });
        let subcategories_ok = selection.subcategory_ids.iter().all(|id| {
            self.parent_of_subcategory(*id)
                .is_some_and(|p| selection.category_ids.contains(&p))
        });
        categories_ok && subcategories_ok
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Electronics(1) > Phones(10) > Smartphones(100)
    /// Electronics(1) > Laptops(11) > Ultrabooks(110)
    /// Furniture(2) > Chairs(20) > Office chairs(200)
    pub(crate) fn sample_taxonomy() -> Taxonomy {
        Taxonomy {
            brands: vec![
                Brand {
                    id: 1,
                    name: "Acme".into(),
                },
                Brand {
                    id: 2,
                    name: "Globex".into(),
                },
            ],
            supercategories: vec![
                Supercategory {
                    id: 1,
                    name: "Electronics".into(),
                },
                Supercategory {
                    id: 2,
                    name: "Furniture".into(),
                },
            ],
            categories: vec![
                Category {
                    id: 10,
                    name: "Phones".into(),
                    supercategory_id: 1,
                    supercategory: None,
                },
                Category {
                    id: 11,
                    name: "Laptops".into(),
                    supercategory_id: 1,
                    supercategory: None,
                },
                Category {
                    id: 20,
                    name: "Chairs".into(),
                    supercategory_id: 2,
                    supercategory: None,
                },
            ],
            subcategories: vec![
                Subcategory {
                    id: 100,
                    name: "Smartphones".into(),
                    category_id: 10,
                    category: None,
                },
                Subcategory {
                    id: 110,
                    name: "Ultrabooks".into(),
                    category_id: 11,
                    category: None,
                },
                Subcategory {
                    id: 200,
                    name: "Office chairs".into(),
                    category_id: 20,
                    category: None,
                },
            ],
        }
    }

    #[test]
    fn category_options_follow_selected_supercategories() {
        let tax = sample_taxonomy();
        let mut sel = FilterSelection::default();
        assert!(tax.options(Dimension::Category, &sel).is_empty());

        sel.supercategory_ids.insert(1);
        let names: Vec<String> = tax
            .options(Dimension::Category, &sel)
            .into_iter()
            .map(|(_, n)| n)
            .collect();
        assert_eq!(names, vec!["Phones", "Laptops"]);
    }

    #[test]
    fn subcategory_options_need_a_category() {
        let tax = sample_taxonomy();
        let mut sel = FilterSelection::default();
        sel.supercategory_ids.insert(2);
        assert!(tax.options(Dimension::Subcategory, &sel).is_empty());
        sel.category_ids.insert(20);
        assert_eq!(
            tax.options(Dimension::Subcategory, &sel),
            vec![(200, "Office chairs".to_string())]
        );
    }

    #[test]
    fn label_falls_back_to_id() {
        let tax = sample_taxonomy();
        assert_eq!(tax.label(Dimension::Brand, 2), "Globex");
        assert_eq!(tax.label(Dimension::Brand, 99), "99");
    }

    #[test]
    fn consistency_check() {
        let tax = sample_taxonomy();
        let mut sel = FilterSelection::default();
        sel.supercategory_ids.insert(1);
        sel.category_ids.insert(10);
        sel.subcategory_ids.insert(100);
        assert!(tax.is_consistent(&sel));

        sel.category_ids.insert(20); // Chairs belongs to Furniture
        assert!(!tax.is_consistent(&sel));
    }
}
