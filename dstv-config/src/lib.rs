use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 指向配置文件的环境变量。
pub const CONFIG_ENV: &str = "DSTV_CONFIG";

/// 解析与面合成的配置根结构。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub composer: ComposerConfig,
    #[serde(default)]
    pub inspection: InspectionConfig,
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

    /// 自动发现配置文件：优先读取环境变量 `DSTV_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let dir = env::current_dir().map_err(|source| ConfigError::Context {
            message: "获取当前工作目录失败".to_string(),
            source,
        })?;
        Self::discover_in(&dir)
    }

    /// 在指定目录下查找 `config/default.toml`，不存在时返回默认配置。
    pub fn discover_in(dir: &Path) -> Result<Self, ConfigError> {
        let default_path = dir.join("config").join("default.toml");
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置。`level` 为 `EnvFilter` 兼容的指令字符串，由安装订阅器的程序使用。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// 各库只通过 `tracing` 输出，不读取此字段；由安装 `tracing-subscriber`
    /// 的可执行程序在启动时传给 `EnvFilter::new`。
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

/// 面合成配置。
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ComposerConfig {
    /// 相邻两个面在竖直方向上的间距（mm）。
    #[serde(default)]
    pub face_gap: f64,
}

/// 斜切检测配置。
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct InspectionConfig {
    #[serde(default = "InspectionConfig::default_skew_tolerance")]
    pub skew_tolerance: f64,
}

impl InspectionConfig {
    fn default_skew_tolerance() -> f64 {
        0.1
    }
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            skew_tolerance: Self::default_skew_tolerance(),
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
