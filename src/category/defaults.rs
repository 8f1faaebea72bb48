//! The starter taxonomy given to new users.

use rusqlite::Connection;

use crate::{Error, user::UserId};

/// The default sections and their categories, in display order.
pub const DEFAULT_TAXONOMY: &[(&str, &[&str])] = &[
    (
        "Income",
        &[
            "Salary",
            "Bonus",
            "Interest Income",
            "Refunds",
            "Tax Refund",
            "Other Income",
        ],
    ),
    ("Housing", &["Rent", "Home Insurance", "Household Items"]),
    (
        "Utilities",
        &["Electricity", "Water", "Gas", "Internet", "Phone Service"],
    ),
    (
        "Food & Dining",
        &[
            "Groceries",
            "Restaurants",
            "Fast Food",
            "Cafes",
            "Bars & Alcohol",
        ],
    ),
    (
        "Transportation",
        &[
            "Fuel",
            "Public Transport",
            "Taxi Service",
            "Parking",
            "Tolls",
            "Vehicle Maintenance",
            "Car Insurance",
        ],
    ),
    (
        "Health",
        &[
            "Doctor Visits",
            "Dental Services",
            "Pharmacy",
            "Prescriptions",
            "Health Insurance",
            "Gym Membership",
        ],
    ),
    (
        "Shopping",
        &[
            "Clothing",
            "Electronics",
            "Online Shopping",
            "Beauty & Personal Care",
            "Gifts",
        ],
    ),
    (
        "Entertainment",
        &[
            "Streaming Services",
            "Subscriptions",
            "Movies",
            "Concerts",
            "Gaming",
            "Activities",
        ],
    ),
    ("Travel", &["Flights", "Hotels", "Car Rentals"]),
    (
        "Education",
        &["Tuition", "Books & Materials", "School Supplies", "Student Loans"],
    ),
    (
        "Financial",
        &[
            "Transfer",
            "Credit Card Payments",
            "Bank Fees",
            "ATM Fees",
            "Foreign Transaction Fees",
            "Federal Taxes",
        ],
    ),
    (
        "Other",
        &["Charitable Donations", "Miscellaneous", "Other Expenses"],
    ),
];

/// Give the user the default sections and categories.
///
/// Existing sections and categories are left as they are, so this can be run more than once.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn seed_default_taxonomy(user_id: &UserId, connection: &Connection) -> Result<(), Error> {
    let mut insert_section =
        connection.prepare("INSERT OR IGNORE INTO section (user_id, name) VALUES (?1, ?2);")?;
    let mut select_section =
        connection.prepare("SELECT id FROM section WHERE user_id = ?1 AND name = ?2;")?;
    let mut insert_category = connection.prepare(
        "INSERT OR IGNORE INTO category (user_id, section_id, name) VALUES (?1, ?2, ?3);",
    )?;

    for (section, categories) in DEFAULT_TAXONOMY {
        insert_section.execute((user_id.as_str(), section))?;
        let section_id: i64 =
            select_section.query_row((user_id.as_str(), section), |row| row.get(0))?;

        for category in categories.iter() {
            insert_category.execute((user_id.as_str(), section_id, category))?;
        }
    }

    tracing::debug!("Seeded the default taxonomy for user {user_id}");

    Ok(())
}
