//! Route handlers for reading and extending the user's taxonomy.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::{CategoryName, SectionName, Taxonomy, create_category, get_taxonomy},
    rule::{Prediction, get_rules, predict_category},
    user::UserId,
};

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for adding a category to a section.
#[derive(Debug, Deserialize)]
pub struct NewCategoryData {
    /// The section to add the category to. Created if it does not exist.
    pub section: String,
    /// The category name.
    pub name: String,
}

/// The request body for predicting a category.
#[derive(Debug, Deserialize)]
pub struct DescriptionRequest {
    /// The transaction description to categorize.
    #[serde(default)]
    pub description: String,
}

/// A route handler that returns the user's taxonomy.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Taxonomy>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_taxonomy(&user_id, &connection).map(Json)
}

/// A route handler that adds a category to one of the user's sections.
///
/// Responds with the updated taxonomy.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Json(new_category): Json<NewCategoryData>,
) -> Result<(StatusCode, Json<Taxonomy>), Error> {
    let section = SectionName::new(&new_category.section)?;
    let name = CategoryName::new(&new_category.name)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    create_category(&user_id, &section, &name, &connection)?;
    tracing::info!("Added category \"{name}\" to section \"{section}\" for user {user_id}");

    let taxonomy = get_taxonomy(&user_id, &connection)?;

    Ok((StatusCode::CREATED, Json(taxonomy)))
}

/// A route handler that predicts the category of a transaction description.
pub async fn predict_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Json(request): Json<DescriptionRequest>,
) -> Result<Json<Prediction>, Error> {
    let description = request.description.trim();
    if description.is_empty() {
        return Err(Error::EmptyDescription);
    }

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let rules = get_rules(&user_id, &connection)?;
    let taxonomy = get_taxonomy(&user_id, &connection)?;
    let prediction = predict_category(description, &rules, &taxonomy);

    tracing::info!(
        "Predicted category \"{}\" for \"{description}\" (confidence {})",
        prediction.predicted_category,
        prediction.confidence
    );

    Ok(Json(prediction))
}
