use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Client input error: {message}")]
    InputError { message: String },

    #[error("Failed to update good record {}: {source}", .path.display())]
    FatalUpdate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan task failed: {message}")]
    TaskError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Storage,
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScanError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::ConfigError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ScanError::InputError { .. } => ErrorCategory::Input,
            ScanError::IoError(_) | ScanError::FatalUpdate { .. } => ErrorCategory::Storage,
            ScanError::TaskError { .. } => ErrorCategory::Runtime,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ScanError::InputError { .. } => ErrorSeverity::Medium,
            ScanError::ConfigError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::MissingConfigError { .. } => ErrorSeverity::High,
            ScanError::IoError(_) | ScanError::FatalUpdate { .. } | ScanError::TaskError { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "檢查設定檔與命令列參數 (check the config file and CLI flags)",
            ErrorCategory::Input => "依照 `<item> <quantity>` 格式重新輸入，並以 `end` 結束",
            ErrorCategory::Storage => "確認商店目錄存在且可寫入 (check the shop directories are writable)",
            ErrorCategory::Runtime => "請以 --verbose 重新執行並查看日誌",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScanError::FatalUpdate { path, .. } => {
                format!("Purchase approved but stock for {} could not be updated", path.display())
            }
            ScanError::MissingConfigError { field } => {
                format!("Missing required setting '{}'", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
