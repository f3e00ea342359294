use std::time::Duration;

/// Orchestrator-wide tunables. Field names are chosen so the demo binary's
/// `clap(env = "...")` bindings are a one-line mapping, the same way this
/// codebase's `ServeConfig`/`MigrateConfig` map CLI flags onto config
/// structs.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub max_parallel_workers: usize,
    pub compilation_timeout: Duration,
    pub enable_cache: bool,
    pub l1_max_size_bytes: u64,
    pub l1_ttl: Duration,
    pub l2_addr: Option<String>,
    pub l2_password: Option<String>,
    pub l2_db: i64,
    pub l2_ttl: Duration,
    pub l2_key_prefix: String,
    pub s3_bucket: Option<String>,
    pub s3_prefix: String,
    pub s3_region: String,
    pub codegen_version: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_parallel_workers: 5,
            compilation_timeout: Duration::from_secs(5 * 60),
            enable_cache: true,
            l1_max_size_bytes: 256 * 1024 * 1024,
            l1_ttl: Duration::from_secs(60 * 60),
            l2_addr: None,
            l2_password: None,
            l2_db: 0,
            l2_ttl: Duration::from_secs(24 * 60 * 60),
            l2_key_prefix: "protoforge:".to_owned(),
            s3_bucket: None,
            s3_prefix: String::new(),
            s3_region: "us-east-1".to_owned(),
            codegen_version: "v2".to_owned(),
        }
    }
}

impl OrchestratorConfig {
    /// `min(max_parallel_workers, number_of_languages)`, floored at 5 per
    /// §4.8 when `max_parallel_workers` is left at its default or otherwise
    /// unset to zero.
    pub fn worker_count(&self, language_count: usize) -> usize {
        let ceiling = if self.max_parallel_workers == 0 { 5 } else { self.max_parallel_workers };
        ceiling.min(language_count).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_is_bounded_by_language_count() {
        let config = OrchestratorConfig { max_parallel_workers: 10, ..Default::default() };
        assert_eq!(config.worker_count(3), 3);
    }

    #[test]
    fn worker_count_floors_at_five_when_unset() {
        let config = OrchestratorConfig { max_parallel_workers: 0, ..Default::default() };
        assert_eq!(config.worker_count(20), 5);
    }
}
