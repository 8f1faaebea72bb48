//! Categorization rules that predict a transaction's category from its description.
//! A rule matches transaction descriptions that contain a specific pattern and names a category.

mod create;
mod db;
mod defaults;
mod delete;
mod list;
mod models;
mod predict;

pub use create::create_rule_endpoint;
pub use db::{create_rule_table, get_rules};
pub use defaults::seed_default_rules;
pub use delete::delete_rule_endpoint;
pub use list::get_rules_endpoint;
pub use models::Rule;
pub use predict::{Prediction, choose_category, predict_category};

#[cfg(test)]
pub use db::create_rule;
