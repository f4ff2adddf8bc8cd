use crate::insights::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use clap::Parser;
use std::path::PathBuf;

/// Common command-line arguments that can be shared between different apps
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    /// Path to the generated insights document
    #[arg(long, env = "INSIGHTS_FILE", default_value = "output.json")]
    pub insights_file: PathBuf,
}

/// Settings for talking to the language model
#[derive(Parser, Debug, Clone)]
pub struct ModelArgs {
    /// Path to the diner history dataset
    #[arg(
        long,
        env = "DINERS_FILE",
        default_value = "fine-dining-dataset.json"
    )]
    pub diners_file: PathBuf,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    pub openai_api_base: Option<String>,

    /// Model used for insight extraction
    #[arg(long, env = "INSIGHT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature for extraction requests
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Maximum number of model requests in flight
    #[arg(long, default_value = "1")]
    pub max_concurrent_requests: usize,
}
