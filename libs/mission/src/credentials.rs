//! Datastore connection parameters handed to collector jobs.

use std::fmt;

/// Environment variable names the collector executables read.
pub mod env {
    pub const DRONE_ID: &str = "DRONE_ID";
    pub const HOST: &str = "POSTGRES_HOST";
    pub const DATABASE: &str = "POSTGRES_DB";
    pub const USER: &str = "POSTGRES_USER";
    pub const PASSWORD: &str = "POSTGRES_PASSWORD";
}

/// Datastore connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct DatastoreCredentials {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for DatastoreCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatastoreCredentials")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
