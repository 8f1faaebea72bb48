//! Database operations for sections and categories.

use rusqlite::Connection;

use crate::{
    Error,
    category::{CategoryName, Section, SectionName, Taxonomy},
    user::UserId,
};

/// Initialize the section and category tables.
pub fn create_category_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS section (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            UNIQUE(user_id, name)
        );

        CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            section_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            UNIQUE(user_id, section_id, name),
            FOREIGN KEY(section_id) REFERENCES section(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user ON category(user_id);",
    )?;

    Ok(())
}

/// Get the user's taxonomy, sections and categories in creation order.
///
/// Sections without categories are included with an empty list.
pub fn get_taxonomy(user_id: &UserId, connection: &Connection) -> Result<Taxonomy, Error> {
    let mut statement = connection.prepare(
        "SELECT section.name, category.name
        FROM section
        LEFT JOIN category ON category.section_id = section.id
        WHERE section.user_id = :user_id
        ORDER BY section.id ASC, category.id ASC;",
    )?;

    let rows = statement.query_map(&[(":user_id", &user_id.as_str())], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
    })?;

    let mut sections: Vec<Section> = Vec::new();

    for row in rows {
        let (section_name, category_name) = row?;

        match sections.last_mut() {
            Some(section) if section.name == section_name => {
                section.categories.extend(category_name);
            }
            _ => sections.push(Section {
                name: section_name,
                categories: category_name.into_iter().collect(),
            }),
        }
    }

    Ok(Taxonomy::new(sections))
}

/// Add `category` to `section`, creating the section if the user does not have it yet.
///
/// # Errors
///
/// Returns [Error::DuplicateCategory] if the section already has the category.
pub fn create_category(
    user_id: &UserId,
    section: &SectionName,
    category: &CategoryName,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT OR IGNORE INTO section (user_id, name) VALUES (?1, ?2);",
        (user_id.as_str(), section.as_ref()),
    )?;

    let section_id: i64 = connection.query_row(
        "SELECT id FROM section WHERE user_id = ?1 AND name = ?2;",
        (user_id.as_str(), section.as_ref()),
        |row| row.get(0),
    )?;

    connection
        .execute(
            "INSERT INTO category (user_id, section_id, name) VALUES (?1, ?2, ?3);",
            (user_id.as_str(), section_id, category.as_ref()),
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateCategory(category.to_string())
            }
            error => error.into(),
        })?;

    Ok(())
}
