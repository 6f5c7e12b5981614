use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::ops::price::PricePreset;

#[derive(Parser)]
#[command(
    name = "catalog",
    about = concat!("catalog v", env!("CARGO_PKG_VERSION"), " - product catalog console and mock API"),
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Collection API base URL (default: [api] url, or CATALOG_API_URL)
    #[arg(long, global = true, value_name = "URL", conflicts_with = "db")]
    pub api: Option<String>,

    /// Work on a local dataset file instead of a server (also the file `serve` serves)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Config file (default: ./catalog.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to this file (the TUI logs nowhere otherwise)
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve a dataset file as a Collection API
    Serve(ServeArgs),
    /// List, show, add, update or delete products
    Products(ProductsCmd),
    /// List brands
    Brands(ListCmd),
    /// List supercategories
    Supercategories(ListCmd),
    /// List categories
    Categories(CategoriesCmd),
    /// List subcategories
    Subcategories(SubcategoriesCmd),
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ServeArgs {
    /// Interface to bind (default: [server] host)
    #[arg(long)]
    pub host: Option<String>,
    /// Port to listen on (default: [server] port)
    #[arg(long, short)]
    pub port: Option<u16>,
    /// Do not reload the dataset when the file changes
    #[arg(long)]
    pub no_watch: bool,
    /// Keep writes in memory; never rewrite the dataset file
    #[arg(long)]
    pub read_only: bool,
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProductsCmd {
    #[command(subcommand)]
    pub action: ProductsAction,
}

#[derive(Subcommand)]
pub enum ProductsAction {
    /// List products with filters, sorting and pagination
    List(ProductListArgs),
    /// Show one product with its brand and categories
    Show(IdArg),
    /// Create a product
    Add(ProductFieldArgs),
    /// Change fields of a product
    Update(ProductUpdateArgs),
    /// Delete a product
    Delete(DeleteArgs),
}

#[derive(Args)]
pub struct ProductListArgs {
    /// Case-insensitive substring of the name
    #[arg(long, short)]
    pub search: Option<String>,
    /// Brand id (repeatable, OR'd)
    #[arg(long = "brand", value_name = "ID", action = ArgAction::Append)]
    pub brands: Vec<u64>,
    /// Supercategory id (repeatable)
    #[arg(long = "supercategory", value_name = "ID", action = ArgAction::Append)]
    pub supercategories: Vec<u64>,
    /// Category id (repeatable)
    #[arg(long = "category", value_name = "ID", action = ArgAction::Append)]
    pub categories: Vec<u64>,
    /// Subcategory id (repeatable)
    #[arg(long = "subcategory", value_name = "ID", action = ArgAction::Append)]
    pub subcategories: Vec<u64>,
    /// Lowest price, inclusive
    #[arg(long, value_name = "N")]
    pub min_price: Option<f64>,
    /// Highest price, inclusive
    #[arg(long, value_name = "N")]
    pub max_price: Option<f64>,
    /// Price preset: under-300, 300-500, 500-1000, over-1000
    #[arg(long, conflicts_with_all = ["min_price", "max_price"])]
    pub preset: Option<PricePreset>,
    #[command(flatten)]
    pub paging: PagingArgs,
    /// Print the request that would be sent, without sending it
    #[arg(long)]
    pub print_query: bool,
}

#[derive(Args)]
pub struct PagingArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub page: u64,
    /// Items per page (default: [ui] page_size)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub page_size: Option<u64>,
    /// Sort field
    #[arg(long, default_value = "name")]
    pub sort: String,
    /// Sort descending
    #[arg(long)]
    pub desc: bool,
}

#[derive(Args)]
pub struct IdArg {
    /// Record id
    pub id: u64,
}

/// Product fields. Every field is optional here; `add` reports the missing
/// ones through form validation.
#[derive(Args, Default)]
pub struct ProductFieldArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub sku: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Price, up to two decimals
    #[arg(long)]
    pub price: Option<String>,
    /// Units in stock
    #[arg(long)]
    pub stock: Option<String>,
    /// Image URL (http:// or https://)
    #[arg(long)]
    pub img_url: Option<String>,
    #[arg(long = "brand", value_name = "ID")]
    pub brand: Option<u64>,
    #[arg(long = "supercategory", value_name = "ID")]
    pub supercategory: Option<u64>,
    #[arg(long = "category", value_name = "ID")]
    pub category: Option<u64>,
    #[arg(long = "subcategory", value_name = "ID")]
    pub subcategory: Option<u64>,
}

#[derive(Args)]
pub struct ProductUpdateArgs {
    /// Product id
    pub id: u64,
    #[command(flatten)]
    pub fields: ProductFieldArgs,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Product id
    pub id: u64,
    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Reference collections
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListCmd {
    #[command(subcommand)]
    pub action: ListAction,
}

#[derive(Subcommand)]
pub enum ListAction {
    /// List records
    List(NameListArgs),
}

#[derive(Args)]
pub struct NameListArgs {
    /// Case-insensitive substring of the name
    #[arg(long, short)]
    pub search: Option<String>,
    #[command(flatten)]
    pub paging: PagingArgs,
}

#[derive(Args)]
pub struct CategoriesCmd {
    #[command(subcommand)]
    pub action: CategoriesAction,
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories
    List(CategoryListArgs),
}

#[derive(Args)]
pub struct CategoryListArgs {
    /// Only categories under this supercategory
    #[arg(long, value_name = "ID")]
    pub supercategory: Option<u64>,
    #[command(flatten)]
    pub list: NameListArgs,
}

#[derive(Args)]
pub struct SubcategoriesCmd {
    #[command(subcommand)]
    pub action: SubcategoriesAction,
}

#[derive(Subcommand)]
pub enum SubcategoriesAction {
    /// List subcategories
    List(SubcategoryListArgs),
}

#[derive(Args)]
pub struct SubcategoryListArgs {
    /// Only subcategories under this category
    #[arg(long, value_name = "ID")]
    pub category: Option<u64>,
    #[command(flatten)]
    pub list: NameListArgs,
}
