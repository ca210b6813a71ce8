use std::{env, path::PathBuf};

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding one `<collection>.json` file per collection.
    pub data_dir: PathBuf,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: resolve_data_dir(env::var("APP_DATA_DIR").ok()),
            port: resolve_port(env::var("PORT").ok()),
        }
    }
}

fn resolve_data_dir(value: Option<String>) -> PathBuf {
    value
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

fn resolve_port(value: Option<String>) -> u16 {
    value
        .and_then(|port| port.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        assert_eq!(resolve_data_dir(None), PathBuf::from("data"));
        assert_eq!(resolve_data_dir(Some("  ".into())), PathBuf::from("data"));
        assert_eq!(resolve_port(None), 8080);
        assert_eq!(resolve_port(Some("not-a-port".into())), 8080);
    }

    #[test]
    fn explicit_values_win() {
        assert_eq!(
            resolve_data_dir(Some("/var/lib/tracker".into())),
            PathBuf::from("/var/lib/tracker")
        );
        assert_eq!(resolve_port(Some(" 9090 ".into())), 9090);
    }
}
