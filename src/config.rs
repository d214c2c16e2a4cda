//! Runtime configuration for the workflow executor.

/// Which checkpoint backend the executor should use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckpointerType {
    InMemory,
    #[cfg(feature = "sqlite")]
    Sqlite,
}

/// Executor configuration.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub checkpointer: CheckpointerType,
    /// SQLite database URL, e.g. `sqlite://jobflow.db`.
    pub sqlite_url: Option<String>,
    /// Hard ceiling on executor steps per drive; guards against a routing
    /// cycle that never reaches a terminal stage.
    pub max_steps_per_run: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            checkpointer: CheckpointerType::InMemory,
            sqlite_url: Self::resolve_sqlite_url(None),
            max_steps_per_run: Self::DEFAULT_MAX_STEPS,
        }
    }
}

impl RuntimeConfig {
    pub const DEFAULT_MAX_STEPS: u64 = 256;

    /// `JOBFLOW_SQLITE_URL` wins, then `SQLITE_DB_NAME` (bare file name),
    /// then the default database file.
    fn resolve_sqlite_url(provided: Option<String>) -> Option<String> {
        if provided.is_some() {
            return provided;
        }
        dotenvy::dotenv().ok();
        if let Ok(url) = std::env::var("JOBFLOW_SQLITE_URL") {
            return Some(url);
        }
        let name = std::env::var("SQLITE_DB_NAME").unwrap_or_else(|_| "jobflow.db".to_string());
        Some(format!("sqlite://{name}"))
    }

    #[must_use]
    pub fn new(checkpointer: CheckpointerType, sqlite_url: Option<String>) -> Self {
        Self {
            checkpointer,
            sqlite_url: Self::resolve_sqlite_url(sqlite_url),
            max_steps_per_run: Self::DEFAULT_MAX_STEPS,
        }
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps_per_run = max_steps;
        self
    }
}
