use serde::Serialize;
use std::fs;

use crate::config::Config;

/// Capability check shared by `spendlens health` and `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// "ok", or "degraded" when uploads cannot be staged
    pub status: &'static str,
    pub pdf_text: bool,
    pub xlsx_export: bool,
    pub api_key_set: bool,
    pub upload_dir: String,
}

impl HealthReport {
    pub fn check(config: &Config) -> Self {
        let dir = &config.server.upload_dir;
        let upload_ok = fs::create_dir_all(dir).is_ok();
        Self {
            status: if upload_ok { "ok" } else { "degraded" },
            // both backends are compiled in
            pdf_text: true,
            xlsx_export: true,
            api_key_set: config.api_key_set(),
            upload_dir: dir.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_reports_missing_key_and_creates_upload_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.server.upload_dir = tmp.path().join("uploads");
        cfg.llm.api_key_env = "SPENDLENS_HEALTH_TEST_UNSET_KEY".to_string();

        let report = HealthReport::check(&cfg);
        assert_eq!(report.status, "ok");
        assert!(!report.api_key_set);
        assert!(report.pdf_text && report.xlsx_export);
        assert!(cfg.server.upload_dir.is_dir());
    }

    #[test]
    fn test_unusable_upload_dir_is_degraded() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let mut cfg = Config::default();
        // a regular file cannot host a directory
        cfg.server.upload_dir = f.path().join("uploads");
        assert_eq!(HealthReport::check(&cfg).status, "degraded");
    }
}
