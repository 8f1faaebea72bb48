//! Sections and categories: the taxonomy that groups a user's transactions.

mod db;
mod defaults;
mod domain;
mod endpoints;

pub use db::{create_category, create_category_tables, get_taxonomy};
pub use defaults::{DEFAULT_TAXONOMY, seed_default_taxonomy};
pub use domain::{CategoryName, Section, SectionName, Taxonomy};
pub use endpoints::{create_category_endpoint, get_categories_endpoint, predict_category_endpoint};
