use crate::model::{Dimension, FilterSelection, Id, Pagination, SortDirection, SortSpec};
use crate::ops::price::PricePreset;

/// Filter, pagination and sort state of a list view.
///
/// All mutation goes through the transition methods below, which keep the
/// category hierarchy consistent by clearing dependent dimensions whenever a
/// parent dimension is replaced. Transitions never fail.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    selection: FilterSelection,
    pagination: Pagination,
    sort: SortSpec,
    initial_pagination: Pagination,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState::new(Pagination::default().page_size)
    }
}

impl FilterState {
    /// Fresh state: no filters, first page, sorted by name ascending
    pub fn new(page_size: usize) -> Self {
        let pagination = Pagination {
            page_index: 0,
            page_size: page_size.max(1),
        };
        FilterState {
            selection: FilterSelection::default(),
            pagination,
            sort: SortSpec::default(),
            initial_pagination: pagination,
        }
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Replace the free-text search verbatim (no trimming)
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.selection.search_text = text.into();
    }

    /// Replace the whole value set of one dimension, clearing its dependents.
    pub fn set_filter_values(&mut self, dimension: Dimension, values: impl IntoIterator<Item = Id>) {
        *self.selection.values_mut(dimension) = values.into_iter().collect();
        for dependent in dimension.dependents() {
            self.selection.values_mut(*dependent).clear();
        }
    }

    /// Remove a single value. Dependents are left alone.
    pub fn remove_filter_value(&mut self, dimension: Dimension, value: Id) {
        self.selection.values_mut(dimension).remove(&value);
    }

    /// Add or remove one value, going through [`Self::set_filter_values`] so
    /// the cascade applies exactly as for a full replacement.
    pub fn toggle_filter_value(&mut self, dimension: Dimension, value: Id) {
        let mut values = self.selection.values(dimension).clone();
        if !values.remove(&value) {
            values.insert(value);
        }
        self.set_filter_values(dimension, values);
    }

    /// Replace both price bounds at once
    pub fn set_price_range(&mut self, min: Option<f64>, max: Option<f64>) {
        self.selection.price_min = min;
        self.selection.price_max = max;
    }

    pub fn clear_price_range(&mut self) {
        self.set_price_range(None, None);
    }

    /// Apply a preset, or clear the range when the preset is already active
    pub fn toggle_price_preset(&mut self, preset: PricePreset) {
        if preset.is_active(&self.selection) {
            self.clear_price_range();
        } else {
            let (min, max) = preset.bounds();
            self.set_price_range(min, max);
        }
    }

    /// Reset every dimension, the price range and the search text.
    /// Pagination and sort are kept.
    pub fn clear_all(&mut self) {
        self.selection = FilterSelection::default();
    }

    pub fn set_page(&mut self, page_index: usize) {
        self.pagination.page_index = page_index;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.pagination.page_size = page_size.max(1);
    }

    pub fn set_sort(&mut self, field: impl Into<String>, direction: SortDirection) {
        self.sort = SortSpec::new(field, direction);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Every active set value as (dimension, id), in dimension order
    pub fn chips(&self) -> Vec<(Dimension, Id)> {
        Dimension::ALL
            .iter()
            .flat_map(|d| self.selection.values(*d).iter().map(move |id| (*d, *id)))
            .collect()
    }

    pub fn has_filters(&self) -> bool {
        self.selection != FilterSelection::default()
    }

    /// True while nothing differs from the state at mount
    pub fn is_pristine(&self) -> bool {
        !self.has_filters()
            && self.pagination == self.initial_pagination
            && self.sort == SortSpec::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::taxonomy::tests::sample_taxonomy;

    fn ids(values: &[Id]) -> Vec<Id> {
        values.to_vec()
    }

    #[test]
    fn defaults() {
        let state = FilterState::default();
        assert_eq!(state.pagination().page_index, 0);
        assert_eq!(state.pagination().page_size, 10);
        assert_eq!(state.sort(), &SortSpec::new("name", SortDirection::Asc));
        assert!(state.is_pristine());
        assert!(state.chips().is_empty());
    }

    #[test]
    fn setting_supercategory_clears_category_and_subcategory() {
        let mut state = FilterState::default();
        state.set_filter_values(Dimension::Supercategory, ids(&[1]));
        state.set_filter_values(Dimension::Category, ids(&[10]));
        state.set_filter_values(Dimension::Subcategory, ids(&[100]));

        state.set_filter_values(Dimension::Supercategory, ids(&[1, 2]));
        assert!(state.selection().category_ids.is_empty());
        assert!(state.selection().subcategory_ids.is_empty());
        assert_eq!(state.selection().supercategory_ids.len(), 2);
    }

    #[test]
    fn setting_category_clears_only_subcategory() {
        let mut state = FilterState::default();
        state.set_filter_values(Dimension::Supercategory, ids(&[1]));
        state.set_filter_values(Dimension::Category, ids(&[10]));
        state.set_filter_values(Dimension::Subcategory, ids(&[100]));

        state.set_filter_values(Dimension::Category, ids(&[11]));
        assert!(state.selection().subcategory_ids.is_empty());
        assert!(state.selection().supercategory_ids.contains(&1));
    }

    #[test]
    fn brand_and_subcategory_do_not_cascade() {
        let mut state = FilterState::default();
        state.set_filter_values(Dimension::Supercategory, ids(&[1]));
        state.set_filter_values(Dimension::Category, ids(&[10]));
        state.set_filter_values(Dimension::Subcategory, ids(&[100]));
        state.set_filter_values(Dimension::Brand, ids(&[2]));
        state.set_filter_values(Dimension::Subcategory, ids(&[]));
        let sel = state.selection();
        assert!(sel.supercategory_ids.contains(&1));
        assert!(sel.category_ids.contains(&10));
        assert!(sel.brand_ids.contains(&2));
    }

    #[test]
    fn cascade_holds_for_every_transition_sequence() {
        // Replay every three-step sequence and check the cascade after each step
        let moves: Vec<(Dimension, Vec<Id>)> = vec![
            (Dimension::Supercategory, vec![1]),
            (Dimension::Supercategory, vec![2]),
            (Dimension::Category, vec![10]),
            (Dimension::Category, vec![20]),
            (Dimension::Subcategory, vec![100]),
            (Dimension::Subcategory, vec![200]),
        ];
        for a in &moves {
            for b in &moves {
                for c in &moves {
                    let mut state = FilterState::default();
                    for (dim, vals) in [a, b, c] {
                        state.set_filter_values(*dim, vals.clone());
                        if *dim == Dimension::Supercategory {
                            assert!(state.selection().category_ids.is_empty());
                            assert!(state.selection().subcategory_ids.is_empty());
                        }
                        if *dim == Dimension::Category {
                            assert!(state.selection().subcategory_ids.is_empty());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn electronics_phones_then_furniture() {
        let tax = sample_taxonomy();
        let mut state = FilterState::default();
        state.set_filter_values(Dimension::Supercategory, ids(&[1])); // Electronics
        state.set_filter_values(Dimension::Category, ids(&[10])); // Phones
        state.set_filter_values(Dimension::Supercategory, ids(&[2])); // Furniture

        let sel = state.selection();
        assert!(sel.category_ids.is_empty());
        assert!(sel.subcategory_ids.is_empty());
        // The category selector now offers Furniture's categories, none selected
        let options = tax.options(Dimension::Category, sel);
        assert_eq!(options, vec![(20, "Chairs".to_string())]);
        assert!(options.iter().all(|(id, _)| !sel.category_ids.contains(id)));
    }

    #[test]
    fn remove_value_does_not_cascade() {
        let mut state = FilterState::default();
        state.set_filter_values(Dimension::Supercategory, ids(&[1, 2]));
        state.set_filter_values(Dimension::Category, ids(&[10]));
        state.remove_filter_value(Dimension::Supercategory, 2);
        assert_eq!(state.selection().supercategory_ids.len(), 1);
        assert!(state.selection().category_ids.contains(&10));
        // Removing a value that is not present is a no-op
        state.remove_filter_value(Dimension::Brand, 5);
        assert!(state.selection().brand_ids.is_empty());
    }

    #[test]
    fn toggle_value_cascades_like_replacement() {
        let mut state = FilterState::default();
        state.toggle_filter_value(Dimension::Supercategory, 1);
        state.toggle_filter_value(Dimension::Category, 10);
        state.toggle_filter_value(Dimension::Supercategory, 2);
        assert_eq!(state.selection().supercategory_ids.len(), 2);
        assert!(state.selection().category_ids.is_empty());
        state.toggle_filter_value(Dimension::Supercategory, 2);
        assert_eq!(state.selection().supercategory_ids.len(), 1);
    }

    #[test]
    fn price_preset_toggles() {
        let mut state = FilterState::default();
        state.toggle_price_preset(PricePreset::From300To500);
        assert_eq!(state.selection().price_min, Some(300.0));
        assert_eq!(state.selection().price_max, Some(500.0));

        state.toggle_price_preset(PricePreset::From300To500);
        assert_eq!(state.selection().price_min, None);
        assert_eq!(state.selection().price_max, None);

        state.toggle_price_preset(PricePreset::Under300);
        state.toggle_price_preset(PricePreset::Over1000);
        assert_eq!(state.selection().price_min, Some(1000.0));
        assert_eq!(state.selection().price_max, None);
    }

    #[test]
    fn set_and_clear_price_range() {
        let mut state = FilterState::default();
        state.set_price_range(None, Some(50.0));
        assert!(state.selection().has_price_range());
        state.clear_price_range();
        assert!(!state.selection().has_price_range());
    }

    #[test]
    fn search_text_is_verbatim() {
        let mut state = FilterState::default();
        state.set_search_text("  Lap ");
        assert_eq!(state.selection().search_text, "  Lap ");
    }

    #[test]
    fn clear_all_keeps_pagination_and_sort() {
        let mut state = FilterState::default();
        state.set_search_text("lap");
        state.set_filter_values(Dimension::Brand, ids(&[1]));
        state.set_price_range(Some(1.0), Some(2.0));
        state.set_page(3);
        state.set_sort("price", SortDirection::Desc);

        state.clear_all();
        assert_eq!(state.selection(), &FilterSelection::default());
        assert_eq!(state.pagination().page_index, 3);
        assert_eq!(state.sort().field, "price");
        assert!(!state.is_pristine());
    }

    #[test]
    fn page_size_and_sort_do_not_reset_filters() {
        let mut state = FilterState::default();
        state.set_filter_values(Dimension::Brand, ids(&[1]));
        state.set_page_size(25);
        state.set_sort("price", SortDirection::Desc);
        assert!(state.selection().brand_ids.contains(&1));
        assert_eq!(state.pagination().page_size, 25);
    }

    #[test]
    fn page_size_is_never_zero() {
        let mut state = FilterState::new(0);
        assert_eq!(state.pagination().page_size, 1);
        state.set_page_size(0);
        assert_eq!(state.pagination().page_size, 1);
    }

    #[test]
    fn chips_in_dimension_order() {
        let mut state = FilterState::default();
        state.set_filter_values(Dimension::Supercategory, ids(&[2, 1]));
        state.set_filter_values(Dimension::Brand, ids(&[7]));
        assert_eq!(
            state.chips(),
            vec![
                (Dimension::Brand, 7),
                (Dimension::Supercategory, 1),
                (Dimension::Supercategory, 2),
            ]
        );
    }

    #[test]
    fn pristine_tracks_any_change() {
        let mut state = FilterState::default();
        state.set_page(1);
        assert!(!state.is_pristine());
        state.set_page(0);
        assert!(state.is_pristine());
        state.set_search_text("x");
        assert!(!state.is_pristine());
    }
}
