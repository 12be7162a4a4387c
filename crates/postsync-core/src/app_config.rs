/// How the store writer reacts to write failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Store errors, empty batches, and zero-row upserts abort the job.
    #[default]
    Strict,
    /// Store errors are logged and the job continues; affected-row counts are
    /// not verified.
    Lenient,
}

impl std::fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WritePolicy::Strict => write!(f, "strict"),
            WritePolicy::Lenient => write!(f, "lenient"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Base URL of the PostgREST endpoint, e.g. `https://xyz.supabase.co`.
    pub store_url: String,
    /// Credential sent as both `apikey` and bearer token.
    pub store_key: String,
    pub store_table: String,
    pub write_policy: WritePolicy,
    pub source_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub log_level: String,
    /// Six-field cron expression used by `postsync schedule`.
    pub schedule: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("store_url", &self.store_url)
            .field("store_key", &"[redacted]")
            .field("store_table", &self.store_table)
            .field("write_policy", &self.write_policy)
            .field("source_timeout_secs", &self.source_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .field("schedule", &self.schedule)
            .finish()
    }
}
