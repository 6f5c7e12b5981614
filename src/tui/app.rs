use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::io::api::{CollectionApi, load_taxonomy};
use crate::list::{Fetcher, InlineFetcher, ListController, ThreadFetcher};
use crate::model::{Config, Dimension, FilterSelection, Id, Product, Resource, Taxonomy};
use crate::ops::dirty::DirtyTracker;
use crate::ops::query::ListSpec;
use crate::ops::validate::{FieldError, FormField, ProductDraft, validate};

use super::input;
use super::render;
use super::theme::Theme;

/// Where the console reads its data from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// A dataset file, queried in-process
    Local(PathBuf),
    /// A Collection API base URL
    Remote(String),
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Local(path) => write!(f, "{}", path.display()),
            DataSource::Remote(url) => f.write_str(url),
        }
    }
}

pub type TabController = ListController<Box<dyn Fetcher>>;

/// Builds a fresh fetcher for every opened tab
pub type FetcherFactory = Box<dyn Fn() -> Box<dyn Fetcher>>;

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing into the active tab's search box
    Search,
    /// Filter picker overlay (products only)
    Filter,
    /// Product form overlay
    Form,
    /// A [`ConfirmIntent`] is waiting for y/n
    Confirm,
}

/// One open collection tab
pub struct Tab {
    pub resource: Resource,
    pub list: TabController,
    /// Selected row on the current page
    pub cursor: usize,
}

impl Tab {
    /// Dirty-tracker surface of this tab
    pub fn surface(&self) -> &'static str {
        self.resource.path()
    }

    /// Dirty-tracker sub-key for typed search and filters
    pub fn filters_key(&self) -> &'static str {
        match self.resource {
            Resource::Products => "productFilters",
            _ => "search",
        }
    }

    /// Anything typed, filtered, paged or re-sorted since the tab opened
    fn has_unsaved_filters(&self) -> bool {
        !self.list.is_pristine()
    }
}

/// Sort fields cycled with `s`
pub fn sort_fields(resource: Resource) -> &'static [&'static str] {
    match resource {
        Resource::Products => &["name", "price", "stock", "sku"],
        _ => &["name", "id"],
    }
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerStage {
    /// The four dimensions plus the price row
    Dimensions,
    Values(Dimension),
    Price,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPicker {
    pub stage: PickerStage,
    pub cursor: usize,
}

/// Rows of the picker's first stage: one per dimension, then price
pub const PICKER_ROWS: usize = Dimension::ALL.len() + 1;

/// The create/edit product form
#[derive(Debug, Clone)]
pub struct ProductForm {
    /// `None` when creating
    pub editing: Option<Id>,
    pub draft: ProductDraft,
    original: ProductDraft,
    /// Index into [`FormField::ALL`]; one past the end is the submit row
    pub focus: usize,
    pub errors: Vec<FieldError>,
}

impl ProductForm {
    pub fn create() -> Self {
        ProductForm {
            editing: None,
            draft: ProductDraft::default(),
            original: ProductDraft::default(),
            focus: 0,
            errors: Vec::new(),
        }
    }

    pub fn edit(product: &Product) -> Self {
        let draft = ProductDraft::from_product(product);
        ProductForm {
            editing: Some(product.id),
            original: draft.clone(),
            draft,
            focus: 0,
            errors: Vec::new(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.original
    }

    pub fn focused_field(&self) -> Option<FormField> {
        FormField::ALL.get(self.focus).copied()
    }

    pub fn on_submit_row(&self) -> bool {
        self.focus == FormField::ALL.len()
    }

    pub fn error_for(&self, field: FormField) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Choices for a select field. Category and subcategory choices are
    /// limited to children of the selected parent.
    pub fn options(&self, taxonomy: &Taxonomy, field: FormField) -> Vec<(Id, String)> {
        let Some(dimension) = form_dimension(field) else {
            return Vec::new();
        };
        let parents = FilterSelection {
            supercategory_ids: self.draft.supercategory_id.into_iter().collect(),
            category_ids: self.draft.category_id.into_iter().collect(),
            ..Default::default()
        };
        taxonomy.options(dimension, &parents)
    }

    /// Move a select field to the next (`step` > 0) or previous option
    pub fn cycle_option(&mut self, taxonomy: &Taxonomy, field: FormField, step: isize) {
        let options = self.options(taxonomy, field);
        if options.is_empty() {
            return;
        }
        let len = options.len() as isize;
        let next = match self
            .draft
            .selected(field)
            .and_then(|id| options.iter().position(|(o, _)| *o == id))
        {
            Some(i) => (i as isize + step).rem_euclid(len),
            None if step > 0 => 0,
            None => len - 1,
        };
        self.draft.select(field, Some(options[next as usize].0));
    }

    pub fn title(&self) -> String {
        match self.editing {
            Some(id) => format!("Edit product #{}", id),
            None => "New product".to_string(),
        }
    }
}

/// The taxonomy dimension behind a select field
pub fn form_dimension(field: FormField) -> Option<Dimension> {
    match field {
        FormField::Brand => Some(Dimension::Brand),
        FormField::Supercategory => Some(Dimension::Supercategory),
        FormField::Category => Some(Dimension::Category),
        FormField::Subcategory => Some(Dimension::Subcategory),
        _ => None,
    }
}

/// A destructive action waiting for confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmIntent {
    DeleteProduct { id: Id, name: String },
    DiscardForm,
    CloseTab { tab: Resource },
    Quit,
}

impl ConfirmIntent {
    pub fn prompt(&self) -> String {
        match self {
            ConfirmIntent::DeleteProduct { name, .. } => format!("Delete product \"{}\"?", name),
            ConfirmIntent::DiscardForm => "Discard unsaved changes?".to_string(),
            ConfirmIntent::CloseTab { tab } => {
                format!("Close {} and lose its search and filters?", tab.label())
            }
            ConfirmIntent::Quit => "Quit with unsaved changes?".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

/// Transient status-row message
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub kind: MessageKind,
    pub expires: Instant,
}

const MESSAGE_TTL: Duration = Duration::from_secs(4);

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Main application state
pub struct App {
    api: Arc<dyn CollectionApi>,
    new_fetcher: FetcherFactory,
    pub source_label: String,
    pub theme: Theme,
    pub mode: Mode,
    pub should_quit: bool,
    /// Open tabs in display order
    pub tabs: Vec<Tab>,
    pub active: usize,
    pub taxonomy: Taxonomy,
    pub dirty: DirtyTracker,
    pub confirm: Option<ConfirmIntent>,
    pub message: Option<StatusMessage>,
    pub picker: Option<FilterPicker>,
    pub form: Option<ProductForm>,
    /// Set after a caught panic; the recovery screen replaces everything
    pub recovery: Option<String>,
    page_size: usize,
    page_sizes: Vec<usize>,
    debounce: Duration,
}

impl App {
    pub fn new(
        api: Arc<dyn CollectionApi>,
        new_fetcher: FetcherFactory,
        source_label: String,
        config: &Config,
    ) -> Self {
        let mut app = App {
            api,
            new_fetcher,
            source_label,
            theme: Theme::from_config(&config.ui),
            mode: Mode::Navigate,
            should_quit: false,
            tabs: Vec::new(),
            active: 0,
            taxonomy: Taxonomy::default(),
            dirty: DirtyTracker::new(),
            confirm: None,
            message: None,
            picker: None,
            form: None,
            recovery: None,
            page_size: config.ui.page_size.max(1),
            page_sizes: config.ui.page_sizes.clone(),
            debounce: Duration::from_millis(config.ui.search_debounce_ms),
        };
        app.reload_taxonomy();
        app.open_tab(Resource::Products);
        app
    }

    pub fn reload_taxonomy(&mut self) {
        match load_taxonomy(self.api.as_ref()) {
            Ok(taxonomy) => self.taxonomy = taxonomy,
            Err(e) => {
                tracing::warn!(error = %e, "could not load brands and categories");
                self.set_error(format!("could not load brands and categories: {}", e));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tabs
    // -----------------------------------------------------------------------

    pub fn current_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    pub fn current_tab_mut(&mut self) -> Option<&mut Tab> {
        self.tabs.get_mut(self.active)
    }

    pub fn current_resource(&self) -> Option<Resource> {
        self.current_tab().map(|t| t.resource)
    }

    pub fn tab_index(&self, resource: Resource) -> Option<usize> {
        self.tabs.iter().position(|t| t.resource == resource)
    }

    /// Activate the tab for `resource`, opening it first if needed
    pub fn open_tab(&mut self, resource: Resource) {
        if let Some(index) = self.tab_index(resource) {
            self.activate(index);
            return;
        }
        let mut list = ListController::new(
            ListSpec::for_resource(resource),
            (self.new_fetcher)(),
            self.page_size,
        )
        .with_debounce(self.debounce);
        list.mount();
        self.tabs.push(Tab {
            resource,
            list,
            cursor: 0,
        });
        self.active = self.tabs.len() - 1;
    }

    /// Switch to an open tab and refresh its list
    pub fn activate(&mut self, index: usize) {
        if index >= self.tabs.len() {
            return;
        }
        self.active = index;
        self.tabs[index].list.refresh();
    }

    pub fn next_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.activate((self.active + 1) % self.tabs.len());
        }
    }

    pub fn prev_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.activate((self.active + self.tabs.len() - 1) % self.tabs.len());
        }
    }

    /// Close the active tab, asking first when it holds unsaved filters
    pub fn request_close_tab(&mut self) {
        let Some((resource, surface)) = self.current_tab().map(|t| (t.resource, t.surface())) else {
            return;
        };
        if self.tabs.len() == 1 {
            self.set_message("the last tab stays open");
            return;
        }
        if self.dirty.is_dirty(surface) {
            self.ask(ConfirmIntent::CloseTab { tab: resource });
        } else {
            self.close_tab(resource);
        }
    }

    pub fn close_tab(&mut self, resource: Resource) {
        let Some(index) = self.tab_index(resource) else {
            return;
        };
        let tab = self.tabs.remove(index);
        self.dirty.clear_surface(tab.surface());
        if self.tabs.is_empty() {
            self.open_tab(Resource::Products);
        } else {
            self.activate(self.active.min(self.tabs.len() - 1));
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Fire due searches, apply finished fetches and expire the message
    pub fn tick(&mut self, now: Instant) {
        for tab in &mut self.tabs {
            tab.list.tick(now);
            if tab.list.poll() {
                let len = tab.list.items().len();
                tab.cursor = tab.cursor.min(len.saturating_sub(1));
            }
        }
        if self.message.as_ref().is_some_and(|m| now >= m.expires) {
            self.message = None;
        }
    }

    /// Mirror unsaved input into the dirty tracker
    pub fn sync_dirty(&mut self) {
        for tab in &self.tabs {
            self.dirty
                .set_dirty(tab.surface(), tab.filters_key(), tab.has_unsaved_filters());
        }
        let form_dirty = self.form.as_ref().is_some_and(ProductForm::is_dirty);
        self.dirty.set_dirty(
            Resource::Products.path(),
            "productForm",
            form_dirty,
        );
    }

    pub fn request_quit(&mut self) {
        self.sync_dirty();
        if self.dirty.any_dirty() {
            self.ask(ConfirmIntent::Quit);
        } else {
            self.should_quit = true;
        }
    }

    pub fn set_message(&mut self, text: impl Into<String>) {
        self.message = Some(StatusMessage {
            text: text.into(),
            kind: MessageKind::Info,
            expires: Instant::now() + MESSAGE_TTL,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.message = Some(StatusMessage {
            text: text.into(),
            kind: MessageKind::Error,
            expires: Instant::now() + MESSAGE_TTL,
        });
    }

    // -----------------------------------------------------------------------
    // List actions
    // -----------------------------------------------------------------------

    pub fn cycle_sort_field(&mut self) {
        let Some(tab) = self.current_tab_mut() else {
            return;
        };
        let fields = sort_fields(tab.resource);
        let sort = tab.list.filters().sort().clone();
        let next = fields
            .iter()
            .position(|f| *f == sort.field)
            .map_or(0, |i| (i + 1) % fields.len());
        tab.list.set_sort(fields[next], sort.direction);
    }

    pub fn toggle_sort_direction(&mut self) {
        if let Some(tab) = self.current_tab_mut() {
            let sort = tab.list.filters().sort().clone();
            tab.list.set_sort(sort.field, sort.direction.reversed());
        }
    }

    /// Next configured page size, back to the first page
    pub fn cycle_page_size(&mut self) {
        let sizes = self.page_sizes.clone();
        let Some(tab) = self.current_tab_mut() else {
            return;
        };
        if sizes.is_empty() {
            return;
        }
        let current = tab.list.filters().pagination().page_size;
        let next = sizes
            .iter()
            .position(|s| *s == current)
            .map_or(sizes[0], |i| sizes[(i + 1) % sizes.len()]);
        tab.list.update(|f| {
            f.set_page_size(next);
            f.set_page(0);
        });
        tab.cursor = 0;
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if let Some(tab) = self.current_tab_mut() {
            let len = tab.list.items().len();
            if len == 0 {
                tab.cursor = 0;
                return;
            }
            tab.cursor = tab.cursor.saturating_add_signed(delta).min(len - 1);
        }
    }

    pub fn refresh_current(&mut self) {
        let is_products = self.current_resource() == Some(Resource::Products);
        if is_products {
            self.reload_taxonomy();
        }
        if let Some(tab) = self.current_tab_mut() {
            tab.list.refresh();
        }
    }

    /// The product under the cursor on the products tab
    pub fn selected_product(&self) -> Option<Product> {
        let tab = self.current_tab()?;
        if tab.resource != Resource::Products {
            return None;
        }
        let value = tab.list.items().get(tab.cursor)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Picker choices for `dimension` under the products tab's current
    /// selection
    pub fn filter_options(&self, dimension: Dimension) -> Vec<(Id, String)> {
        match self.tab_index(Resource::Products) {
            Some(index) => self
                .taxonomy
                .options(dimension, self.tabs[index].list.filters().selection()),
            None => Vec::new(),
        }
    }

    fn refresh_products(&mut self) {
        if let Some(index) = self.tab_index(Resource::Products) {
            self.tabs[index].list.refresh();
        }
    }

    // -----------------------------------------------------------------------
    // Product form
    // -----------------------------------------------------------------------

    pub fn open_new_form(&mut self) {
        self.form = Some(ProductForm::create());
        self.mode = Mode::Form;
    }

    pub fn open_edit_form(&mut self) {
        match self.selected_product() {
            Some(product) => {
                self.form = Some(ProductForm::edit(&product));
                self.mode = Mode::Form;
            }
            None => self.set_message("no product selected"),
        }
    }

    pub fn request_close_form(&mut self) {
        if self.form.as_ref().is_some_and(ProductForm::is_dirty) {
            self.ask(ConfirmIntent::DiscardForm);
        } else {
            self.close_form();
        }
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.dirty.clear_key(Resource::Products.path(), "productForm");
        self.mode = Mode::Navigate;
    }

    /// Validate and send the form. Field errors keep the form open.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let body = match validate(&form.draft) {
            Ok(product) => product,
            Err(errors) => {
                let count = errors.len();
                form.errors = errors;
                self.set_error(format!("{} field(s) need attention", count));
                return;
            }
        };
        form.errors.clear();
        let editing = form.editing;

        let body = match serde_json::to_value(&body) {
            Ok(v) => v,
            Err(e) => {
                self.set_error(e.to_string());
                return;
            }
        };
        let result = match editing {
            Some(id) => self.api.update(Resource::Products, id, &body),
            None => self.api.create(Resource::Products, &body),
        };
        match result {
            Ok(saved) => {
                tracing::info!(id = %saved["id"], "product saved");
                self.close_form();
                self.set_message(match editing {
                    Some(_) => "Product updated",
                    None => "Product created",
                });
                self.refresh_products();
            }
            Err(e) => {
                tracing::warn!(error = %e, "saving product failed");
                self.set_error(format!("save failed: {}", e));
            }
        }
    }

    pub fn request_delete(&mut self) {
        match self.selected_product() {
            Some(product) => self.ask(ConfirmIntent::DeleteProduct {
                id: product.id,
                name: product.name,
            }),
            None => self.set_message("no product selected"),
        }
    }

    // -----------------------------------------------------------------------
    // Confirmation
    // -----------------------------------------------------------------------

    pub fn ask(&mut self, intent: ConfirmIntent) {
        self.confirm = Some(intent);
        self.mode = Mode::Confirm;
    }

    /// The mode an overlay returns to once the confirmation is gone
    fn resume_mode(&self) -> Mode {
        if self.form.is_some() {
            Mode::Form
        } else if self.picker.is_some() {
            Mode::Filter
        } else {
            Mode::Navigate
        }
    }

    pub fn confirm_yes(&mut self) {
        let Some(intent) = self.confirm.take() else {
            return;
        };
        self.mode = self.resume_mode();
        match intent {
            ConfirmIntent::DeleteProduct { id, name } => {
                match self.api.delete(Resource::Products, id) {
                    Ok(()) => {
                        tracing::info!(id, "product deleted");
                        self.set_message(format!("Deleted \"{}\"", name));
                        self.refresh_products();
                    }
                    Err(e) => self.set_error(format!("delete failed: {}", e)),
                }
            }
            ConfirmIntent::DiscardForm => self.close_form(),
            ConfirmIntent::CloseTab { tab } => self.close_tab(tab),
            ConfirmIntent::Quit => self.should_quit = true,
        }
    }

    pub fn confirm_no(&mut self) {
        self.confirm = None;
        self.mode = self.resume_mode();
    }

    // -----------------------------------------------------------------------
    // Recovery
    // -----------------------------------------------------------------------

    pub fn recover(&mut self, message: String) {
        tracing::error!(%message, "recovered from panic");
        self.recovery = Some(message);
    }

    fn drop_overlays(&mut self) {
        self.recovery = None;
        self.confirm = None;
        self.picker = None;
        self.form = None;
        self.dirty.clear_key(Resource::Products.path(), "productForm");
        self.mode = Mode::Navigate;
    }

    /// `r` on the recovery screen: reload data and stay where we were
    pub fn reload_after_recovery(&mut self) {
        self.drop_overlays();
        self.reload_taxonomy();
        for tab in &mut self.tabs {
            tab.list.refresh();
        }
    }

    /// `h` on the recovery screen: back to the product list
    pub fn go_home(&mut self) {
        self.drop_overlays();
        self.open_tab(Resource::Products);
    }
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// Leaves raw mode and the alternate screen when dropped, including while
/// unwinding.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown error".to_string()
    }
}

/// Run the TUI application
pub fn run(
    api: Arc<dyn CollectionApi>,
    source: DataSource,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let new_fetcher: FetcherFactory = {
        let api = Arc::clone(&api);
        match &source {
            DataSource::Local(_) => Box::new(move || -> Box<dyn Fetcher> {
                Box::new(InlineFetcher::new(Arc::clone(&api)))
            }),
            DataSource::Remote(_) => Box::new(move || -> Box<dyn Fetcher> {
                Box::new(ThreadFetcher::new(Arc::clone(&api)))
            }),
        }
    };
    let mut app = App::new(api, new_fetcher, source.to_string(), config);

    enable_raw_mode()?;
    let guard = TerminalGuard;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Panics inside the loop become the recovery screen; keep them off stderr
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(|info| {
        tracing::error!(%info, "panic in event loop");
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    panic::set_hook(original_hook);
    drop(guard);
    terminal.show_cursor()?;
    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| step(terminal, app)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(payload) => app.recover(panic_message(payload.as_ref())),
        }
        if app.should_quit {
            return Ok(());
        }
    }
}

fn step(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    app.tick(Instant::now());
    terminal.draw(|frame| render::render(frame, app))?;

    if event::poll(Duration::from_millis(50))?
        && let Event::Key(key) = event::read()?
        && key.kind == KeyEventKind::Press
    {
        input::handle_key(app, key, Instant::now());
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::io::local::LocalApi;
    use crate::io::store::Store;
    use crate::model::SortDirection;
    use serde_json::json;

    pub(crate) fn dataset() -> serde_json::Value {
        json!({
            "products": [
                {"id": 1, "name": "Laptop Pro", "sku": "LP-1", "description": "Fast", "price": 1299.99,
                 "stock": 4, "imgUrl": "", "brandId": 1, "supercategoryId": 1, "categoryId": 11, "subcategoryId": 110},
                {"id": 2, "name": "Laptop Air", "sku": "LA-1", "description": "Light", "price": 450,
                 "stock": 9, "imgUrl": "", "brandId": 2, "supercategoryId": 1, "categoryId": 11, "subcategoryId": 110},
                {"id": 3, "name": "Office Chair", "sku": "OC-1", "description": "Comfy", "price": 320,
                 "stock": 12, "imgUrl": "", "brandId": 1, "supercategoryId": 2, "categoryId": 20, "subcategoryId": 200}
            ],
            "brands": [{"id": 1, "name": "Acme"}, {"id": 2, "name": "Globex"}],
            "supercategories": [{"id": 1, "name": "Electronics"}, {"id": 2, "name": "Furniture"}],
            "categories": [
                {"id": 11, "name": "Laptops", "supercategoryId": 1},
                {"id": 12, "name": "Phones", "supercategoryId": 1},
                {"id": 20, "name": "Chairs", "supercategoryId": 2}
            ],
            "subcategories": [
                {"id": 110, "name": "Ultrabooks", "categoryId": 11},
                {"id": 120, "name": "Smartphones", "categoryId": 12},
                {"id": 200, "name": "Office chairs", "categoryId": 20}
            ]
        })
    }

    /// An app over an in-memory dataset whose fetches complete on the next tick
    pub(crate) fn test_app() -> App {
        let api: Arc<dyn CollectionApi> =
            Arc::new(LocalApi::new(Store::from_value(dataset()).unwrap()));
        let fetch_api = Arc::clone(&api);
        let factory: FetcherFactory =
            Box::new(move || -> Box<dyn Fetcher> {
                Box::new(InlineFetcher::new(Arc::clone(&fetch_api)))
            });
        let mut config = Config::default();
        config.ui.search_debounce_ms = 0;
        let mut app = App::new(api, factory, "memory".into(), &config);
        app.tick(Instant::now());
        app
    }

    #[test]
    fn starts_on_loaded_products_tab() {
        let app = test_app();
        assert_eq!(app.tabs.len(), 1);
        assert_eq!(app.current_resource(), Some(Resource::Products));
        assert_eq!(app.tabs[0].list.total(), 3);
        assert_eq!(app.taxonomy.brands.len(), 2);
        assert!(app.message.is_none());
    }

    #[test]
    fn opening_an_open_tab_activates_it() {
        let mut app = test_app();
        app.open_tab(Resource::Brands);
        app.open_tab(Resource::Categories);
        app.open_tab(Resource::Brands);
        assert_eq!(app.tabs.len(), 3);
        assert_eq!(app.current_resource(), Some(Resource::Brands));
    }

    #[test]
    fn closing_a_dirty_tab_asks_first() {
        let mut app = test_app();
        app.open_tab(Resource::Brands);
        app.tabs[1].list.set_search_text("ac", Instant::now());
        app.sync_dirty();
        app.request_close_tab();
        assert_eq!(
            app.confirm,
            Some(ConfirmIntent::CloseTab {
                tab: Resource::Brands
            })
        );
        app.confirm_yes();
        assert_eq!(app.tabs.len(), 1);
        assert!(!app.dirty.is_dirty("brands"));
        assert_eq!(app.mode, Mode::Navigate);
    }

    #[test]
    fn last_tab_cannot_be_closed() {
        let mut app = test_app();
        app.request_close_tab();
        assert_eq!(app.tabs.len(), 1);
        assert!(app.confirm.is_none());
    }

    #[test]
    fn quit_is_immediate_when_clean() {
        let mut app = test_app();
        app.request_quit();
        assert!(app.should_quit);
    }

    #[test]
    fn quit_with_filters_asks() {
        let mut app = test_app();
        app.tabs[0].list.set_filter_values(Dimension::Brand, [1]);
        app.request_quit();
        assert!(!app.should_quit);
        assert_eq!(app.confirm, Some(ConfirmIntent::Quit));
        app.confirm_no();
        assert_eq!(app.mode, Mode::Navigate);
        assert!(!app.should_quit);
    }

    #[test]
    fn invalid_form_stays_open_with_errors() {
        let mut app = test_app();
        app.open_new_form();
        app.submit_form();
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.errors.len(), 9);
        assert_eq!(form.error_for(FormField::Name), Some("Name is required"));
        assert_eq!(app.message.as_ref().unwrap().kind, MessageKind::Error);
    }

    #[test]
    fn valid_form_creates_and_refreshes() {
        let mut app = test_app();
        app.open_new_form();
        let form = app.form.as_mut().unwrap();
        form.draft = ProductDraft {
            name: "Desk".into(),
            sku: "D-1".into(),
            description: "Wide".into(),
            price: "199.50".into(),
            stock: "2".into(),
            img_url: String::new(),
            brand_id: Some(2),
            supercategory_id: Some(2),
            category_id: Some(20),
            subcategory_id: Some(200),
        };
        app.submit_form();
        assert!(app.form.is_none());
        assert_eq!(app.mode, Mode::Navigate);
        app.tick(Instant::now());
        assert_eq!(app.tabs[0].list.total(), 4);
    }

    #[test]
    fn delete_goes_through_confirmation() {
        let mut app = test_app();
        // Sorted by name: Laptop Air, Laptop Pro, Office Chair
        app.move_cursor(2);
        app.request_delete();
        assert_eq!(
            app.confirm,
            Some(ConfirmIntent::DeleteProduct {
                id: 3,
                name: "Office Chair".into()
            })
        );
        app.confirm_yes();
        app.tick(Instant::now());
        assert_eq!(app.tabs[0].list.total(), 2);
        assert_eq!(app.tabs[0].cursor, 1);
    }

    #[test]
    fn dirty_form_asks_before_discard() {
        let mut app = test_app();
        app.open_new_form();
        app.form.as_mut().unwrap().draft.name = "x".into();
        app.sync_dirty();
        assert!(app.dirty.is_key_dirty("products", "productForm"));
        app.request_close_form();
        assert_eq!(app.confirm, Some(ConfirmIntent::DiscardForm));
        app.confirm_no();
        assert_eq!(app.mode, Mode::Form);
        app.request_close_form();
        app.confirm_yes();
        assert!(app.form.is_none());
        assert!(!app.dirty.is_dirty("products"));
    }

    #[test]
    fn sort_and_page_size_cycle() {
        let mut app = test_app();
        app.cycle_sort_field();
        assert_eq!(app.tabs[0].list.filters().sort().field, "price");
        app.toggle_sort_direction();
        assert_eq!(
            app.tabs[0].list.filters().sort().direction,
            SortDirection::Desc
        );
        app.cycle_page_size();
        assert_eq!(app.tabs[0].list.filters().pagination().page_size, 25);
        app.cycle_page_size();
        assert_eq!(app.tabs[0].list.filters().pagination().page_size, 5);
    }

    #[test]
    fn recovery_go_home_returns_to_products() {
        let mut app = test_app();
        app.open_tab(Resource::Brands);
        app.open_new_form();
        app.recover("boom".into());
        app.go_home();
        assert!(app.recovery.is_none());
        assert!(app.form.is_none());
        assert_eq!(app.current_resource(), Some(Resource::Products));
        assert_eq!(app.tabs.len(), 2);
    }
}
