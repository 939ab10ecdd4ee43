//! 对外的组合入口：配置结构与完整流程

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cleaner::filtered_list;
use crate::dns_resolver::{DnsResolver, HostResolver};
use crate::error::{ReconError, Result};
use crate::gen::{load_wordlist, CandidateGenerator, CandidateSource};
use crate::input::OutputFormat;
use crate::limiter::ConcurrencyLimiter;
use crate::logger::{self, Status};
use crate::output::ResultSink;
use crate::scanner::{NmapRunner, ScanConfig, ScanDispatcher, ScanRunner, ScanSummary};
use crate::subdata;
use crate::subdomain::SubdomainResolver;
use crate::targets::LoadedTargets;

/// 默认递归层级
pub const DEFAULT_BRUTEFORCE_LEVEL: usize = 1;
/// 默认 DNS 查询并发
pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 100;
/// 默认种子域名并发
pub const DEFAULT_DOMAIN_CONCURRENCY: usize = 1;
/// 默认 nmap 参数
pub const DEFAULT_NMAP_PARAMS: &str = "-sV -Pn -T4";
/// 默认 nmap 进程数
pub const DEFAULT_NMAP_PROCESSES: usize = 4;
/// 子域名结果默认目录
pub const DEFAULT_SUBDOMAIN_OUTPUT_FOLDER: &str = "output/subdomain";
/// 扫描结果默认目录
pub const DEFAULT_NMAP_OUTPUT_FOLDER: &str = "output/nmap";
#[cfg(feature = "crtsh")]
const CRTSH_TIMEOUT_SECS: u64 = 20;

const MODULE: &str = "domain.subdomain";

/// 子域名解析配置
#[derive(Debug, Clone)]
pub struct SubdomainConfig {
    /// 最大递归层级，0 表示只解析种子本身
    pub level: usize,
    /// 暴破字典路径
    pub brute_force_file: Option<PathBuf>,
    /// 结果目录，`None` 时不写结果文件
    pub output_folder: Option<PathBuf>,
    /// 结果行格式
    pub output_format: OutputFormat,
    /// 同时进行的 DNS 查询上限
    pub resolve_concurrency: usize,
    /// 同时处理的种子域名上限
    pub domain_concurrency: usize,
    /// 是否查询证书透明日志
    pub use_crtsh: bool,
}

impl Default for SubdomainConfig {
    fn default() -> Self {
        SubdomainConfig {
            level: DEFAULT_BRUTEFORCE_LEVEL,
            brute_force_file: None,
            output_folder: Some(PathBuf::from(DEFAULT_SUBDOMAIN_OUTPUT_FOLDER)),
            output_format: OutputFormat::DomainIp,
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
            domain_concurrency: DEFAULT_DOMAIN_CONCURRENCY,
            use_crtsh: true,
        }
    }
}

impl SubdomainConfig {
    /// 并发上限必须为正
    pub fn validate(&self) -> Result<()> {
        if self.resolve_concurrency == 0 {
            return Err(ReconError::Config("resolve concurrency must be positive".into()));
        }
        if self.domain_concurrency == 0 {
            return Err(ReconError::Config("domain concurrency must be positive".into()));
        }
        Ok(())
    }
}

impl ScanConfig {
    /// 扫描进程数必须为正
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(ReconError::Config("scan processes must be positive".into()));
        }
        Ok(())
    }
}

/// 按配置构造默认的动态来源
pub fn default_sources(config: &SubdomainConfig) -> Vec<Arc<dyn CandidateSource>> {
    let mut sources: Vec<Arc<dyn CandidateSource>> = Vec::new();
    if config.use_crtsh {
        push_crtsh(&mut sources);
    }
    sources
}

#[cfg(feature = "crtsh")]
fn push_crtsh(sources: &mut Vec<Arc<dyn CandidateSource>>) {
    match crate::gen::CrtShSource::new(CRTSH_TIMEOUT_SECS) {
        Ok(source) => sources.push(Arc::new(source)),
        Err(e) => logger::error_status(MODULE, Status::Failed, &e.to_string()),
    }
}

#[cfg(not(feature = "crtsh"))]
fn push_crtsh(_sources: &mut Vec<Arc<dyn CandidateSource>>) {}

/// 构造解析引擎；字典读取失败时按空字典处理
pub async fn build_engine(
    config: &SubdomainConfig,
    resolver: Arc<dyn HostResolver>,
    sources: Vec<Arc<dyn CandidateSource>>,
) -> Result<SubdomainResolver> {
    config.validate()?;
    let wordlist = match &config.brute_force_file {
        Some(path) => load_wordlist(path).await.unwrap_or_else(|e| {
            logger::error_status(MODULE, Status::Failed, &e.to_string());
            Vec::new()
        }),
        None => Vec::new(),
    };
    let generator = CandidateGenerator::new(sources, subdata::get_common_subdomains(), wordlist);
    Ok(SubdomainResolver::new(
        resolver,
        generator,
        config.level,
        ConcurrencyLimiter::new(config.resolve_concurrency),
        ConcurrencyLimiter::new(config.domain_concurrency),
    ))
}

/// 用给定引擎解析一批域名，按配置打开并关闭结果文件
///
/// 结果文件无法创建时返回错误，其余失败只记录日志。
pub async fn resolve_with(
    engine: &SubdomainResolver,
    domains: &[String],
    config: &SubdomainConfig,
) -> Result<HashSet<String>> {
    let sink = match &config.output_folder {
        Some(folder) => Some(Arc::new(ResultSink::create(folder, config.output_format).await?)),
        None => None,
    };

    let found = engine
        .resolve_ips_from_subdomains(domains, sink.clone())
        .await;

    if let Some(sink) = sink {
        match Arc::try_unwrap(sink) {
            Ok(sink) => sink.close().await?,
            Err(sink) => logger::info_status(
                MODULE,
                Status::Complete,
                &format!("Results saved to '{}' file", sink.path().display()),
            ),
        }
    }
    Ok(found)
}

/// 使用系统 DNS 解析一批域名的子域名
pub async fn resolve_ips_from_subdomains(
    domains: &[String],
    config: &SubdomainConfig,
) -> Result<HashSet<String>> {
    let resolver: Arc<dyn HostResolver> = Arc::new(DnsResolver::new());
    let engine = build_engine(config, resolver, default_sources(config)).await?;
    resolve_with(&engine, domains, config).await
}

/// 解析域名目标后与字面 IP 合并，再分发扫描
pub async fn scan_targets(
    targets: &LoadedTargets,
    engine: &SubdomainResolver,
    config: &SubdomainConfig,
    dispatcher: &ScanDispatcher,
) -> Result<ScanSummary> {
    if targets.is_empty() {
        logger::error_status("nmap.async_nmap", Status::Failed, "No IPs or domains to scan");
        return Ok(ScanSummary::default());
    }
    let resolved = if targets.domains.is_empty() {
        HashSet::new()
    } else {
        resolve_with(engine, &targets.domains, config).await?
    };
    let all_ips = filtered_list(targets.ips.iter().chain(resolved.iter()));
    Ok(dispatcher.dispatch_scans(all_ips).await)
}

/// async-nmap 完整流程：系统 DNS + nmap
pub async fn run_async_nmap(
    targets: &LoadedTargets,
    sub_config: &SubdomainConfig,
    scan_config: ScanConfig,
) -> Result<ScanSummary> {
    scan_config.validate()?;
    let resolver: Arc<dyn HostResolver> = Arc::new(DnsResolver::new());
    let engine = build_engine(sub_config, resolver, default_sources(sub_config)).await?;
    let runner: Arc<dyn ScanRunner> = Arc::new(NmapRunner::new());
    let dispatcher = ScanDispatcher::new(runner, scan_config);
    scan_targets(targets, &engine, sub_config, &dispatcher).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SubdomainConfig::default();
        assert_eq!(config.level, DEFAULT_BRUTEFORCE_LEVEL);
        assert!(config.brute_force_file.is_none());
        assert_eq!(config.output_format, OutputFormat::DomainIp);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = SubdomainConfig {
            resolve_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ReconError::Config(_))));

        let scan = ScanConfig {
            max_concurrent: 0,
            ..Default::default()
        };
        assert!(scan.validate().is_err());
    }

    #[test]
    fn crtsh_can_be_disabled() {
        let config = SubdomainConfig {
            use_crtsh: false,
            ..Default::default()
        };
        assert!(default_sources(&config).is_empty());
    }
}
