use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A credential given inline, through an environment variable, or in a file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SecretSource {
    Plain(String),
    FromEnv {
        #[serde(rename = "fromEnv", alias = "fromenv")]
        from_env: String,
    },
    FromFile {
        #[serde(rename = "fromFile", alias = "fromfile")]
        from_file: String,
    },
}

impl SecretSource {
    pub fn resolve(&self) -> Result<String> {
        match self {
            SecretSource::Plain(value) => Ok(value.clone()),
            SecretSource::FromEnv { from_env } => std::env::var(from_env)
                .map_err(|_| AppError::SecretNotFound(format!("environment variable {}", from_env))),
            SecretSource::FromFile { from_file } => std::fs::read_to_string(from_file)
                .map(|content| content.trim().to_string())
                .map_err(|e| AppError::SecretNotFound(format!("{} ({})", from_file, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_plain_secret() {
        let secret: SecretSource = serde_json::from_str(r#""s3cret""#).unwrap();
        assert_eq!(secret.resolve().unwrap(), "s3cret");
    }

    #[test]
    fn test_file_secret_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  from-file  ").unwrap();

        let json = serde_json::json!({ "fromFile": file.path().to_str().unwrap() });
        let secret: SecretSource = serde_json::from_value(json).unwrap();

        assert_eq!(secret.resolve().unwrap(), "from-file");
    }

    #[test]
    fn test_missing_env_secret() {
        let secret: SecretSource =
            serde_json::from_str(r#"{"fromEnv": "AMI_KAFKA_TEST_SECRET_THAT_IS_NOT_SET"}"#).unwrap();

        assert!(matches!(secret.resolve(), Err(AppError::SecretNotFound(_))));
    }
}
