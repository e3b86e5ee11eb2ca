pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use config::TriageConfig;
use db::repository::SqliteDoctorDirectory;
use pipeline::extraction::PdfTextExtractor;
use pipeline::triage::{GeminiClient, TriageOrchestrator};

/// Wire the collaborators described by `config` into an orchestrator.
pub fn build_orchestrator(config: &TriageConfig) -> Result<TriageOrchestrator, String> {
    let table = config
        .load_specialty_table()
        .map_err(|e| format!("Failed to load specialty table: {e}"))?;

    let llm = GeminiClient::new(
        &config.gemini_base_url,
        config.gemini_api_key.clone(),
        &config.gemini_model,
        config.llm_timeout_secs,
    )
    .map_err(|e| format!("Failed to build LLM client: {e}"))?;
    let report_llm = GeminiClient::new(
        &config.gemini_base_url,
        config.gemini_api_key.clone(),
        &config.gemini_model,
        config.report_timeout_secs,
    )
    .map_err(|e| format!("Failed to build report LLM client: {e}"))?;

    if !llm.has_api_key() {
        tracing::warn!("GEMINI_API_KEY is not set; triage runs keyword-only and report analysis is unavailable");
    }

    let directory = SqliteDoctorDirectory::open(&config.db_path).map_err(|e| {
        format!(
            "Failed to open doctor directory at {}: {e}",
            config.db_path.display()
        )
    })?;

    tracing::info!(
        model = llm.model(),
        triage_timeout_secs = config.llm_timeout_secs,
        report_timeout_secs = config.report_timeout_secs,
        specialties = table.len(),
        db = %config.db_path.display(),
        scoring_mode = ?config.settings.scoring_mode,
        "Triage pipeline ready"
    );

    Ok(TriageOrchestrator::new(
        Arc::new(table),
        Arc::new(llm),
        Arc::new(directory),
        Arc::new(PdfTextExtractor),
        config.settings.clone(),
    )
    .with_report_llm(Arc::new(report_llm)))
}

pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = TriageConfig::from_env();

    // The blocking LLM client owns its own runtime; it must be created and
    // dropped outside the async one.
    let orchestrator = match build_orchestrator(&config) {
        Ok(orchestrator) => Arc::new(orchestrator),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(api::serve_until_ctrl_c(
        api::AppState::new(orchestrator.clone()),
        config.bind_addr,
    ));
    drop(runtime);
    drop(orchestrator);

    if let Err(e) = result {
        tracing::error!(addr = %config.bind_addr, "Triage server failed: {e}");
        std::process::exit(1);
    }
    tracing::info!("{} stopped", config::APP_NAME);
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn config_in(dir: &tempfile::TempDir) -> TriageConfig {
        TriageConfig {
            db_path: dir.path().join("doctors.db"),
            ..TriageConfig::default()
        }
    }

    #[test]
    fn builds_without_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = build_orchestrator(&config_in(&dir)).unwrap();
        assert_eq!(orchestrator.table().len(), 7);
        assert!(dir.path().join("doctors.db").exists());
    }

    #[test]
    fn missing_specialty_file_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = TriageConfig {
            specialties_path: Some(PathBuf::from("/nonexistent/specialties.json")),
            ..config_in(&dir)
        };
        let err = build_orchestrator(&config).err().unwrap();
        assert!(err.starts_with("Failed to load specialty table"));
    }
}
