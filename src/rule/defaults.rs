//! The starter categorization rules given to new users.

use rusqlite::Connection;

use crate::{Error, user::UserId};

/// Default `(pattern, category)` pairs. Every category is in the default taxonomy.
pub const DEFAULT_RULES: &[(&str, &str)] = &[
    ("payroll", "Salary"),
    ("salary", "Salary"),
    ("paycheck", "Salary"),
    ("wages", "Salary"),
    ("bonus", "Bonus"),
    ("interest earned", "Interest Income"),
    ("interest paid", "Interest Income"),
    ("refund", "Refunds"),
    ("tax refund", "Tax Refund"),
    ("rent", "Rent"),
    ("home insurance", "Home Insurance"),
    ("ikea", "Household Items"),
    ("electric", "Electricity"),
    ("water bill", "Water"),
    ("natural gas", "Gas"),
    ("internet", "Internet"),
    ("comcast", "Internet"),
    ("verizon", "Phone Service"),
    ("t-mobile", "Phone Service"),
    ("grocery", "Groceries"),
    ("supermarket", "Groceries"),
    ("whole foods", "Groceries"),
    ("trader joe", "Groceries"),
    ("restaurant", "Restaurants"),
    ("mcdonald", "Fast Food"),
    ("burger king", "Fast Food"),
    ("uber eats", "Fast Food"),
    ("starbucks", "Cafes"),
    ("coffee", "Cafes"),
    ("brewery", "Bars & Alcohol"),
    ("liquor", "Bars & Alcohol"),
    ("shell", "Fuel"),
    ("chevron", "Fuel"),
    ("gas station", "Fuel"),
    ("metro", "Public Transport"),
    ("transit", "Public Transport"),
    ("uber", "Taxi Service"),
    ("lyft", "Taxi Service"),
    ("parking", "Parking"),
    ("toll", "Tolls"),
    ("auto repair", "Vehicle Maintenance"),
    ("oil change", "Vehicle Maintenance"),
    ("geico", "Car Insurance"),
    ("car insurance", "Car Insurance"),
    ("clinic", "Doctor Visits"),
    ("dental", "Dental Services"),
    ("pharmacy", "Pharmacy"),
    ("cvs", "Pharmacy"),
    ("health insurance", "Health Insurance"),
    ("gym", "Gym Membership"),
    ("fitness", "Gym Membership"),
    ("clothing", "Clothing"),
    ("best buy", "Electronics"),
    ("amazon", "Online Shopping"),
    ("ebay", "Online Shopping"),
    ("sephora", "Beauty & Personal Care"),
    ("netflix", "Streaming Services"),
    ("spotify", "Streaming Services"),
    ("hulu", "Streaming Services"),
    ("subscription", "Subscriptions"),
    ("cinema", "Movies"),
    ("ticketmaster", "Concerts"),
    ("steam", "Gaming"),
    ("playstation", "Gaming"),
    ("airline", "Flights"),
    ("airways", "Flights"),
    ("hotel", "Hotels"),
    ("airbnb", "Hotels"),
    ("hertz", "Car Rentals"),
    ("tuition", "Tuition"),
    ("bookstore", "Books & Materials"),
    ("student loan", "Student Loans"),
    ("transfer", "Transfer"),
    ("credit card payment", "Credit Card Payments"),
    ("atm fee", "ATM Fees"),
    ("foreign transaction fee", "Foreign Transaction Fees"),
    ("monthly service fee", "Bank Fees"),
    ("irs", "Federal Taxes"),
    ("donation", "Charitable Donations"),
];

/// Give the user the default categorization rules.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn seed_default_rules(user_id: &UserId, connection: &Connection) -> Result<(), Error> {
    let mut statement = connection.prepare(
        "INSERT INTO categorization_rule (user_id, pattern, category) VALUES (?1, ?2, ?3);",
    )?;

    for (pattern, category) in DEFAULT_RULES {
        statement.execute((user_id.as_str(), pattern, category))?;
    }

    tracing::debug!(
        "Seeded {} default rules for user {user_id}",
        DEFAULT_RULES.len()
    );

    Ok(())
}
