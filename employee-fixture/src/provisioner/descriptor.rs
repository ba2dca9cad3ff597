//! Connection coordinates of a provisioned instance

use std::fmt;

/// Database the server always has; used for administrative statements
pub const ADMIN_DATABASE: &str = "postgres";

/// Host, mapped port, credentials and target database of a running instance.
///
/// Built only by [`PostgresInstance::descriptor`](super::PostgresInstance::descriptor), so
/// schema setup, checkpointing and the application host all derive their connection
/// strings from the same value.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl ConnectionDescriptor {
    /// URL of the target database
    pub fn connection_string(&self) -> String {
        self.url_for(&self.database)
    }

    /// URL of the administrative database on the same server
    pub fn admin_connection_string(&self) -> String {
        self.url_for(ADMIN_DATABASE)
    }

    fn url_for(&self, database: &str) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, database
        )
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}
