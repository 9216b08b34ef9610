//! INI file configuration adapter.

use crate::domain::error::RiskboardError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RiskboardError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| RiskboardError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[gateway]
host = 127.0.0.1
port = 7497

[market]
benchmark = SPY
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("gateway", "host"),
            Some("127.0.0.1".to_string())
        );
        assert_eq!(adapter.get_string("market", "benchmark"), Some("SPY".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[gateway]\nport = 7497\n").unwrap();
        assert_eq!(adapter.get_string("gateway", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value_or_default() {
        let adapter = FileConfigAdapter::from_string("[gateway]\nport = 4002\nclient_id = abc\n").unwrap();
        assert_eq!(adapter.get_int("gateway", "port", 7497), 4002);
        assert_eq!(adapter.get_int("gateway", "client_id", 7), 7);
        assert_eq!(adapter.get_int("gateway", "timeout_secs", 30), 30);
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter =
            FileConfigAdapter::from_string("[csv]\nnet_liquidation = 250000.5\n[risk]\ntrading_days = x\n").unwrap();
        assert_eq!(adapter.get_double("csv", "net_liquidation", 0.0), 250000.5);
        assert_eq!(adapter.get_double("risk", "trading_days", 252.0), 252.0);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[dashboard]\noutput = /tmp/dashboard.html\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("dashboard", "output"),
            Some("/tmp/dashboard.html".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/riskboard.ini");
        assert!(matches!(
            result,
            Err(RiskboardError::ConfigParse { ref file, .. }) if file.contains("riskboard.ini")
        ));
    }
}
