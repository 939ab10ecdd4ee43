//! # rvulnscan
//!
//! 自动化网络侦察工具库：递归发现并解析子域名，再对得到的 IP 有限并发地运行 nmap。
//!
//! ## 特性
//!
//! - 🔍 **递归子域名解析**: 常见前缀、证书透明日志、自定义字典，按层级展开
//! - 🚦 **并发限制**: DNS 查询、种子域名、扫描进程各自独立限流
//! - 💾 **增量输出**: 每个分支完成即写入结果文件
//! - ♻️ **断点续扫**: 已完成的目标通过完成标记文件跳过
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use rvulnscan::{resolve_ips_from_subdomains, SubdomainConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SubdomainConfig {
//!         level: 1,
//!         output_folder: None,
//!         ..Default::default()
//!     };
//!     let ips = resolve_ips_from_subdomains(&["example.com".to_string()], &config).await?;
//!     println!("发现 {} 个 IP", ips.len());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

/// 高层入口与配置
pub mod api;
/// 输入清洗
pub mod cleaner;
/// DNS 解析
pub mod dns_resolver;
/// 错误类型
pub mod error;
/// 候选子域名生成
pub mod gen;
/// 命令行参数
pub mod input;
/// 并发限制
pub mod limiter;
/// 日志输出
pub mod logger;
/// 扫描连接跟踪
pub mod monitor;
/// 结果文件
pub mod output;
/// nmap 扫描调度
pub mod scanner;
/// 内置子域名前缀
pub mod subdata;
/// 递归子域名解析
pub mod subdomain;
/// 目标加载
pub mod targets;
/// 杂项工具
pub mod util;

// 重新导出主要的公共API
pub use api::{
    build_engine, resolve_ips_from_subdomains, resolve_with, run_async_nmap, scan_targets,
    SubdomainConfig,
};

pub use dns_resolver::{DnsResolver, HostResolver};
pub use error::{ReconError, Result};
pub use gen::{CandidateGenerator, CandidateSource};
pub use input::OutputFormat;
pub use limiter::ConcurrencyLimiter;
pub use monitor::ConnectionMonitor;
pub use output::ResultSink;
pub use scanner::{NmapRunner, ScanConfig, ScanDispatcher, ScanOutput, ScanRunner, ScanSummary};
pub use subdomain::SubdomainResolver;
pub use targets::{LoadedTargets, Target};
