use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::api::{CollectionApi, ListPage};
use crate::io::http::HttpApi;
use crate::io::local::LocalApi;
use crate::model::{
    Brand, Category, Config, Dimension, Id, Pagination, Product, Relation, Resource, SortDirection,
    Subcategory, Supercategory,
};
use crate::ops::filters::FilterState;
use crate::ops::query::{ListSpec, QueryEnvelope, build_list_query, build_resource_query};
use crate::ops::validate::{FormField, ProductDraft, validate};
use crate::server::{self, ServeOptions};
use crate::tui::{self, DataSource};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli, config: &Config) -> CmdResult {
    let json = cli.json;
    let source = data_source(&cli, config);
    let api = || open_api(&source, config);

    match cli.command {
        None => tui::run(api()?, source.clone(), config),
        Some(cmd) => match cmd {
            Commands::Serve(args) => cmd_serve(args, cli.db, config),

            Commands::Products(ProductsCmd {
                action: ProductsAction::List(args),
            }) if args.print_query => {
                let filters = product_filters(&args, config);
                print_query(Resource::Products, &product_query(&filters), json)
            }
            Commands::Products(p) => {
                let api = api()?;
                let api = api.as_ref();
                match p.action {
                    ProductsAction::List(args) => cmd_products_list(api, args, config, json),
                    ProductsAction::Show(args) => cmd_products_show(api, args.id, json),
                    ProductsAction::Add(args) => cmd_products_add(api, args, json),
                    ProductsAction::Update(args) => cmd_products_update(api, args, json),
                    ProductsAction::Delete(args) => cmd_products_delete(api, args, json),
                }
            }

            Commands::Brands(c) => match c.action {
                ListAction::List(args) => {
                    cmd_name_list(api()?.as_ref(), Resource::Brands, args, None, config, json)
                }
            },
            Commands::Supercategories(c) => match c.action {
                ListAction::List(args) => cmd_name_list(
                    api()?.as_ref(),
                    Resource::Supercategories,
                    args,
                    None,
                    config,
                    json,
                ),
            },
            Commands::Categories(c) => match c.action {
                CategoriesAction::List(args) => {
                    let parent = args.supercategory.map(|id| ("supercategoryId", id));
                    cmd_name_list(
                        api()?.as_ref(),
                        Resource::Categories,
                        args.list,
                        parent,
                        config,
                        json,
                    )
                }
            },
            Commands::Subcategories(c) => match c.action {
                SubcategoriesAction::List(args) => {
                    let parent = args.category.map(|id| ("categoryId", id));
                    cmd_name_list(
                        api()?.as_ref(),
                        Resource::Subcategories,
                        args.list,
                        parent,
                        config,
                        json,
                    )
                }
            },
        },
    }
}

/// `--db` wins over `--api`, which wins over the configured URL
fn data_source(cli: &Cli, config: &Config) -> DataSource {
    match (&cli.db, &cli.api) {
        (Some(path), _) => DataSource::Local(path.clone()),
        (None, Some(url)) => DataSource::Remote(url.clone()),
        (None, None) => DataSource::Remote(config.api.url.clone()),
    }
}

pub fn open_api(
    source: &DataSource,
    config: &Config,
) -> Result<Arc<dyn CollectionApi>, Box<dyn std::error::Error>> {
    Ok(match source {
        DataSource::Local(path) => Arc::new(LocalApi::open(path)?),
        DataSource::Remote(url) => Arc::new(HttpApi::new(
            url,
            Duration::from_secs(config.api.timeout_secs),
        )?),
    })
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

fn cmd_serve(args: ServeArgs, db: Option<PathBuf>, config: &Config) -> CmdResult {
    let options = ServeOptions {
        host: args.host.unwrap_or_else(|| config.server.host.clone()),
        port: args.port.unwrap_or(config.server.port),
        db: db.unwrap_or_else(|| PathBuf::from(&config.server.db)),
        watch: config.server.watch && !args.no_watch,
        read_only: config.server.read_only || args.read_only,
    };
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(options))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn list_state(paging: &PagingArgs, config: &Config) -> FilterState {
    let mut filters = FilterState::new(
        paging
            .page_size
            .map(|n| n as usize)
            .unwrap_or(config.ui.page_size),
    );
    filters.set_page((paging.page - 1) as usize);
    let direction = if paging.desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };
    filters.set_sort(paging.sort.clone(), direction);
    filters
}

fn print_list(
    resource: Resource,
    page: ListPage,
    pagination: Pagination,
    table: Vec<String>,
    json: bool,
) -> CmdResult {
    if json {
        let out = ListJson {
            resource: resource.path().to_string(),
            page: pagination.page_index + 1,
            page_size: pagination.page_size,
            page_count: pagination.page_count(page.total),
            total: page.total,
            items: page.items,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    if page.items.is_empty() {
        println!("No {} found", resource.path());
    } else {
        for line in &table {
            println!("{}", line);
        }
    }
    println!("{}", format_page_footer(pagination, page.total));
    Ok(())
}

fn print_query(resource: Resource, query: &QueryEnvelope, json: bool) -> CmdResult {
    if json {
        let out = QueryJson {
            resource: resource.path().to_string(),
            params: query.to_pairs(),
            query: query.to_query_string(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("/{}?{}", resource.path(), query.to_query_string());
    }
    Ok(())
}

/// Filter state for a product listing, parents first: setting a dimension
/// clears the ones below it
fn product_filters(args: &ProductListArgs, config: &Config) -> FilterState {
    let mut filters = list_state(&args.paging, config);
    if let Some(search) = &args.search {
        filters.set_search_text(search.clone());
    }
    filters.set_filter_values(Dimension::Supercategory, args.supercategories.clone());
    filters.set_filter_values(Dimension::Category, args.categories.clone());
    filters.set_filter_values(Dimension::Subcategory, args.subcategories.clone());
    filters.set_filter_values(Dimension::Brand, args.brands.clone());
    match args.preset {
        Some(preset) => filters.toggle_price_preset(preset),
        None => filters.set_price_range(args.min_price, args.max_price),
    }
    filters
}

fn product_query(filters: &FilterState) -> QueryEnvelope {
    build_list_query(
        &ListSpec::products(),
        filters.selection(),
        filters.pagination(),
        Some(filters.sort()),
    )
}

fn cmd_products_list(
    api: &dyn CollectionApi,
    args: ProductListArgs,
    config: &Config,
    json: bool,
) -> CmdResult {
    let filters = product_filters(&args, config);
    let query = product_query(&filters);
    if args.print_query {
        return print_query(Resource::Products, &query, json);
    }

    let page = api.list(Resource::Products, &query)?;
    let table = if json {
        Vec::new()
    } else {
        format_product_table(&page.decode::<Product>()?)
    };
    print_list(Resource::Products, page, filters.pagination(), table, json)
}

fn cmd_name_list(
    api: &dyn CollectionApi,
    resource: Resource,
    args: NameListArgs,
    parent: Option<(&str, Id)>,
    config: &Config,
    json: bool,
) -> CmdResult {
    let filters = list_state(&args.paging, config);
    let spec = ListSpec::for_resource(resource);
    let mut query = build_resource_query(
        &spec,
        args.search.as_deref().unwrap_or(""),
        filters.pagination(),
        Some(filters.sort()),
    );
    if let Some((field, id)) = parent {
        query = query.with_eq(field, id);
    }

    let page = api.list(resource, &query)?;
    let table = if json {
        Vec::new()
    } else {
        match resource {
            Resource::Brands => format_name_table(
                &page
                    .decode::<Brand>()?
                    .into_iter()
                    .map(|b| (b.id, b.name))
                    .collect::<Vec<_>>(),
            ),
            Resource::Supercategories => format_name_table(
                &page
                    .decode::<Supercategory>()?
                    .into_iter()
                    .map(|s| (s.id, s.name))
                    .collect::<Vec<_>>(),
            ),
            Resource::Categories => format_category_table(&page.decode::<Category>()?),
            Resource::Subcategories => format_subcategory_table(&page.decode::<Subcategory>()?),
            Resource::Products => format_product_table(&page.decode::<Product>()?),
        }
    };
    print_list(resource, page, filters.pagination(), table, json)
}

fn fetch_product(api: &dyn CollectionApi, id: Id) -> Result<Product, Box<dyn std::error::Error>> {
    let value = api.get(Resource::Products, id, &Relation::PRODUCT)?;
    Ok(serde_json::from_value(value)?)
}

fn cmd_products_show(api: &dyn CollectionApi, id: Id, json: bool) -> CmdResult {
    let product = fetch_product(api, id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&product)?);
    } else {
        for line in format_product_detail(&product) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

/// Copy the given flags onto a draft. Selects go parent first so the form's
/// cascade clears stale children before explicit children are applied.
fn apply_fields(draft: &mut ProductDraft, fields: ProductFieldArgs) {
    let texts = [
        (FormField::Name, fields.name),
        (FormField::Sku, fields.sku),
        (FormField::Description, fields.description),
        (FormField::Price, fields.price),
        (FormField::Stock, fields.stock),
        (FormField::ImgUrl, fields.img_url),
    ];
    for (field, value) in texts {
        if let (Some(value), Some(slot)) = (value, draft.text_mut(field)) {
            *slot = value;
        }
    }
    let selects = [
        (FormField::Supercategory, fields.supercategory),
        (FormField::Category, fields.category),
        (FormField::Subcategory, fields.subcategory),
        (FormField::Brand, fields.brand),
    ];
    for (field, value) in selects {
        if value.is_some() {
            draft.select(field, value);
        }
    }
}

/// Validate a draft, reporting every failing field
fn validated_body(draft: &ProductDraft, json: bool) -> Result<Value, Box<dyn std::error::Error>> {
    match validate(draft) {
        Ok(product) => Ok(serde_json::to_value(product)?),
        Err(errors) => {
            if json {
                let out: Vec<FieldErrorJson> = errors.iter().map(FieldErrorJson::from).collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for line in format_field_errors(&errors) {
                    eprintln!("{}", line);
                }
            }
            Err(format!("product is invalid ({} field(s))", errors.len()).into())
        }
    }
}

fn print_saved(api: &dyn CollectionApi, verb: &str, saved: &Value, json: bool) -> CmdResult {
    if json {
        println!("{}", serde_json::to_string_pretty(saved)?);
        return Ok(());
    }
    let id = saved.get("id").and_then(Value::as_u64);
    let name = saved.get("name").and_then(Value::as_str).unwrap_or_default();
    match id {
        Some(id) => {
            println!("{} #{} {}", verb, id, name);
            if let Ok(product) = fetch_product(api, id) {
                for line in format_product_detail(&product).iter().skip(1) {
                    println!("  {}", line);
                }
            }
        }
        None => println!("{} {}", verb, name),
    }
    Ok(())
}

fn cmd_products_add(api: &dyn CollectionApi, args: ProductFieldArgs, json: bool) -> CmdResult {
    let mut draft = ProductDraft::default();
    apply_fields(&mut draft, args);
    let body = validated_body(&draft, json)?;
    let created = api.create(Resource::Products, &body)?;
    tracing::info!(id = %created["id"], "product created");
    print_saved(api, "created", &created, json)
}

fn cmd_products_update(api: &dyn CollectionApi, args: ProductUpdateArgs, json: bool) -> CmdResult {
    let existing = fetch_product(api, args.id)?;
    let mut draft = ProductDraft::from_product(&existing);
    apply_fields(&mut draft, args.fields);
    if draft == ProductDraft::from_product(&existing) {
        println!("nothing to change");
        return Ok(());
    }
    let body = validated_body(&draft, json)?;
    let updated = api.update(Resource::Products, args.id, &body)?;
    tracing::info!(id = args.id, "product updated");
    print_saved(api, "updated", &updated, json)
}

fn cmd_products_delete(api: &dyn CollectionApi, args: DeleteArgs, json: bool) -> CmdResult {
    let product = fetch_product(api, args.id)?;
    if !args.yes {
        eprintln!("Delete product #{} \"{}\"?", product.id, product.name);
        eprint!("Proceed? [y/n] ");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("cancelled");
            return Ok(());
        }
    }
    api.delete(Resource::Products, args.id)?;
    tracing::info!(id = args.id, "product deleted");
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "deleted": args.id }))?
        );
    } else {
        println!("deleted #{} {}", product.id, product.name);
    }
    Ok(())
}
