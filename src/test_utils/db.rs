use rusqlite::Connection;

use crate::{
    auth::{PasswordHash, UserID, create_user},
    db::initialize,
};

/// An initialized in-memory database with one registered user.
pub(crate) fn get_test_connection() -> (Connection, UserID) {
    let conn = Connection::open_in_memory().unwrap();
    initialize(&conn).unwrap();
    let user = create_user(
        "test@example.com",
        "Test",
        PasswordHash::new_unchecked("hunter2"),
        &conn,
    )
    .unwrap();

    (conn, user.id)
}

/// Register a second user, for checking that data does not leak between users.
pub(crate) fn create_other_user(conn: &Connection) -> UserID {
    create_user(
        "other@example.com",
        "Other",
        PasswordHash::new_unchecked("hunter2"),
        conn,
    )
    .unwrap()
    .id
}
