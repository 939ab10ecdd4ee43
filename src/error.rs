use std::path::PathBuf;
use thiserror::Error;

/// 统一错误类型
#[derive(Debug, Error)]
pub enum ReconError {
    /// 单个主机名解析失败
    #[error("resolve {host} failed: {reason}")]
    Resolution {
        /// 查询的主机名
        host: String,
        /// 解析器给出的原因
        reason: String,
    },

    /// 外部扫描进程无法启动或读取输出失败
    #[error("scan of {target} failed: {source}")]
    ScanLaunch {
        /// 扫描目标
        target: String,
        #[source]
        /// 底层 IO 错误
        source: std::io::Error,
    },

    /// 文件读写失败
    #[error("io error on '{}': {source}", .path.display())]
    Io {
        /// 出错的文件或目录
        path: PathBuf,
        #[source]
        /// 底层 IO 错误
        source: std::io::Error,
    },

    /// 结果文件写入失败
    #[error("result sink '{}' write failed: {source}", .path.display())]
    Sink {
        /// 结果文件路径
        path: PathBuf,
        #[source]
        /// 底层 IO 错误
        source: std::io::Error,
    },

    /// 动态子域名来源失败
    #[error("candidate source {name} failed: {reason}")]
    Source {
        /// 来源名称
        name: &'static str,
        /// 失败原因
        reason: String,
    },

    /// 配置不合法
    #[error("invalid configuration: {0}")]
    Config(String),

    /// 日志初始化失败
    #[error("logger init failed: {0}")]
    Logger(String),
}

impl ReconError {
    /// 带路径的 IO 错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReconError::Io {
            path: path.into(),
            source,
        }
    }
}

/// 本库统一的 `Result`
pub type Result<T> = std::result::Result<T, ReconError>;
