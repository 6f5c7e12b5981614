pub mod dirty;
pub mod filters;
pub mod price;
pub mod query;
pub mod search;
pub mod validate;
