use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Expected element `{element}` not found at {url}")]
    MissingElement { url: String, element: String },

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown venue tag: {venue}")]
    UnknownVenue { venue: String },

    #[error("Configuration parse error in {field}: {message}")]
    ConfigParse { field: String, message: String },

    #[error("Invalid value `{value}` for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Upstream contract broken: {message}")]
    UpstreamContract { message: String },

    #[error("Processing error: {message}")]
    Processing { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Extraction,
    Configuration,
    Upstream,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl HarvestError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HarvestError::Http(_) | HarvestError::UnexpectedStatus { .. } => ErrorCategory::Network,
            HarvestError::MissingElement { .. } | HarvestError::Processing { .. } => {
                ErrorCategory::Extraction
            }
            HarvestError::UnknownVenue { .. }
            | HarvestError::ConfigParse { .. }
            | HarvestError::InvalidConfigValue { .. }
            | HarvestError::MissingConfig { .. } => ErrorCategory::Configuration,
            HarvestError::UpstreamContract { .. } => ErrorCategory::Upstream,
            HarvestError::Csv(_) | HarvestError::Io(_) | HarvestError::Serialization(_) => {
                ErrorCategory::Storage
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Extraction => ErrorSeverity::Low,
            ErrorCategory::Upstream | ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// 設定錯誤與上游契約錯誤會終止整個執行；其餘只影響單筆記錄
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Configuration | ErrorCategory::Upstream | ErrorCategory::Storage
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check connectivity or lower --concurrency; the host may be throttling requests",
            ErrorCategory::Extraction => "The venue page layout may have changed; inspect the URL manually",
            ErrorCategory::Configuration => "Check --venue (sp, ndss, uss, ccs) and the TOML configuration values",
            ErrorCategory::Upstream => "The Semantic Scholar batch API returned an unexpected payload; retry later or lower batch_size",
            ErrorCategory::Storage => "Check that the output path is writable and has free space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            HarvestError::UnknownVenue { venue } => {
                format!("Venue '{}' is not supported", venue)
            }
            HarvestError::UpstreamContract { .. } => {
                "Abstract batch lookup returned data in an unexpected shape".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_level_errors_are_not_fatal() {
        let status = HarvestError::UnexpectedStatus {
            url: "https://example.org".to_string(),
            status: 503,
        };
        let missing = HarvestError::MissingElement {
            url: "https://example.org".to_string(),
            element: "section#abstract".to_string(),
        };
        assert!(!status.is_fatal());
        assert!(!missing.is_fatal());
        assert_eq!(missing.severity(), ErrorSeverity::Low);
    }

    #[test]
    fn test_contract_break_is_fatal() {
        let err = HarvestError::UpstreamContract {
            message: "expected 3 entries, got 2".to_string(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.category(), ErrorCategory::Upstream);
        assert!(err.severity() > ErrorSeverity::Medium);
    }
}
