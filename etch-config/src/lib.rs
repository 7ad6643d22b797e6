use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            routing: RoutingConfig::default(),
            canvas: CanvasConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `ETCH_CONFIG`，否则
    /// 寻找 `./config/default.toml`。若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("ETCH_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 转向偏好的配置表示。
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasSetting {
    Left,
    Right,
}

impl Default for BiasSetting {
    fn default() -> Self {
        BiasSetting::Right
    }
}

/// 自动布线默认参数：格距、转向偏好与防御性步数上限。
/// `max_steps` 缺省表示沿用原始的无上限行为。
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub default_bias: BiasSetting,
    #[serde(default = "RoutingConfig::default_cell_pitch")]
    pub cell_pitch: f64,
    #[serde(default)]
    pub max_steps: Option<usize>,
}

impl RoutingConfig {
    fn default_cell_pitch() -> f64 {
        1.0
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_bias: BiasSetting::default(),
            cell_pitch: Self::default_cell_pitch(),
            max_steps: None,
        }
    }
}

/// 画布默认尺寸。
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "CanvasConfig::default_width")]
    pub width: f64,
    #[serde(default = "CanvasConfig::default_height")]
    pub height: f64,
}

impl CanvasConfig {
    fn default_width() -> f64 {
        800.0
    }

    fn default_height() -> f64 {
        600.0
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_returned_when_file_missing() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert!(matches!(cfg.routing.default_bias, BiasSetting::Right));
        assert!((cfg.routing.cell_pitch - 1.0).abs() < f64::EPSILON);
        assert!(cfg.routing.max_steps.is_none());
        assert!((cfg.canvas.width - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [routing]
            default_bias = "left"
            cell_pitch = 2.5
            max_steps = 50000

            [canvas]
            width = 1024.0
            height = 768.0
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert!(matches!(cfg.routing.default_bias, BiasSetting::Left));
        assert!((cfg.routing.cell_pitch - 2.5).abs() < f64::EPSILON);
        assert_eq!(cfg.routing.max_steps, Some(50_000));
        assert!((cfg.canvas.height - 768.0).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "not = [valid").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
