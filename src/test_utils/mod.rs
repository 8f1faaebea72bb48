//! Shared helpers for handler tests.

#![allow(missing_docs)]

use axum_test::TestServer;
use jsonwebtoken::{EncodingKey, Header, encode};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, AuthConfig, Claims, ReportConfig, build_router,
    db::initialize,
    user::{UserId, upsert_user},
};

const TEST_SECRET: &[u8] = b"test-secret";

/// A token for the user `sub` that the test server accepts for the next hour.
pub(crate) fn bearer_token(sub: &str) -> String {
    let claims = Claims {
        sub: sub.to_owned(),
        exp: (OffsetDateTime::now_utc().unix_timestamp() + 3600) as u64,
        email: Some(format!("{sub}@example.com")),
        name: None,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .expect("Could not sign test token")
}

fn build_test_server(connection: Connection) -> TestServer {
    let state = AppState::new(
        connection,
        AuthConfig::from_secret(TEST_SECRET),
        ReportConfig::default(),
    )
    .expect("Could not create app state");

    TestServer::try_new(build_router(state)).expect("Could not create test server")
}

/// A server with an empty in-memory database.
pub(crate) fn get_test_server() -> TestServer {
    build_test_server(Connection::open_in_memory().expect("Could not open database"))
}

/// A server where the user `sub` already exists with the default categories and
/// rules, and a token for that user.
pub(crate) fn get_test_server_with_user(sub: &str) -> (TestServer, String) {
    let connection = Connection::open_in_memory().expect("Could not open database");
    initialize(&connection).expect("Could not initialize database");
    upsert_user(&UserId::new(sub), None, None, &connection).expect("Could not create test user");

    (build_test_server(connection), bearer_token(sub))
}
