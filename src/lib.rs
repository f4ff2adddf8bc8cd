use crate::store::InsightStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub mod app;
pub mod batch;
pub mod cli;
pub mod diners;
pub mod insights;
pub mod openai;
pub mod profile;
pub mod prompts;
pub mod store;
pub mod time_util;

pub mod test_utils;

// Define the AppState struct for both main app and testing
pub struct AppState {
    pub insight_store: InsightStore,
    // Keeps the test artifact directory alive for the lifetime of the state
    #[allow(dead_code)]
    temp_dir: Option<tempfile::TempDir>,
}

impl AppState {
    /// State backed by an empty temporary directory; no insights exist
    /// until a test writes them.
    pub fn new_for_testing() -> Self {
        let temp_dir = tempfile::tempdir()
            .expect("Failed to create temporary insights directory");
        let insight_store = InsightStore::new(temp_dir.path().join("output.json"));

        Self {
            insight_store,
            temp_dir: Some(temp_dir),
        }
    }
}

// Create a config struct to hold AppState configuration
pub struct AppConfig {
    pub insights_file: PathBuf,
}

// Function to create AppState from parameters
pub fn create_app_state(config: AppConfig) -> Arc<AppState> {
    info!("Serving insights from {}", config.insights_file.display());
    Arc::new(AppState {
        insight_store: InsightStore::new(config.insights_file),
        temp_dir: None,
    })
}

#[cfg(test)]
mod app_state_tests {
    use super::{create_app_state, AppConfig, AppState};
    use std::path::Path;

    #[test]
    fn create_app_state_uses_configured_path() {
        let state = create_app_state(AppConfig {
            insights_file: "/srv/insights/output.json".into(),
        });
        assert_eq!(
            state.insight_store.path(),
            Path::new("/srv/insights/output.json")
        );
    }

    #[test]
    fn testing_state_points_into_existing_directory() {
        let state = AppState::new_for_testing();
        let path = state.insight_store.path();
        assert!(!path.exists());
        assert!(path.parent().unwrap().is_dir());
    }
}
