//! Dead-letter sink configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Where records go once publishing has permanently failed
///
/// # Example
///
/// ```toml
/// [dead_letter]
/// type = "file"
/// path = "/var/lib/relay/dead-letter.jsonl"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeadLetterConfig {
    /// Write an error-level log event carrying the record (default)
    #[default]
    Log,
    /// Append JSON lines to a file
    File(FileDeadLetterConfig),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileDeadLetterConfig {
    /// Required; parent directories are created on open
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log() {
        let config: DeadLetterConfig = toml::from_str("type = \"log\"").unwrap();
        assert_eq!(config, DeadLetterConfig::Log);
    }

    #[test]
    fn test_file() {
        let toml = r#"
type = "file"
path = "dead/letters.jsonl"
"#;
        let config: DeadLetterConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config,
            DeadLetterConfig::File(FileDeadLetterConfig {
                path: PathBuf::from("dead/letters.jsonl"),
            })
        );
    }
}
