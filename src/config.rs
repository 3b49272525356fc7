use std::path::PathBuf;

use clap::Parser;
use directories::ProjectDirs;

use crate::completion::DEFAULT_ENDPOINT;
use crate::prompt::DEFAULT_STARTUP_CUE;
use crate::store::IndexField;

const DATA_FILE_NAME: &str = "diary_entries.json";
const LOG_FILE_NAME: &str = "prompt_diary.log";

/// Application configuration, from command-line flags or environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "prompt-diary", version, about = "A diary that asks you a question first")]
pub struct Config {
    /// JSON file holding committed entries
    #[arg(long, env = "PROMPT_DIARY_DATA")]
    pub data_file: Option<PathBuf>,

    /// Completion endpoint that generates prompts
    #[arg(long, env = "PROMPT_DIARY_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Cue sent for the very first prompt
    #[arg(long, env = "PROMPT_DIARY_CUE", default_value = DEFAULT_STARTUP_CUE)]
    pub startup_cue: String,

    /// Field the entry list is ordered by
    #[arg(long, env = "PROMPT_DIARY_ORDER_BY", value_enum, default_value_t = IndexField::EntryContent)]
    pub order_by: IndexField,

    /// Where log output goes while the terminal UI is up
    #[arg(long, env = "PROMPT_DIARY_LOG")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    fn data_dir() -> PathBuf {
        ProjectDirs::from("", "", "prompt_diary")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn data_file(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| Self::data_dir().join(DATA_FILE_NAME))
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| Self::data_dir().join(LOG_FILE_NAME))
    }
}
