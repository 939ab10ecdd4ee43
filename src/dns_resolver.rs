use std::net::IpAddr;

use async_trait::async_trait;
use trust_dns_resolver::config::*;
use trust_dns_resolver::TokioAsyncResolver;

use crate::error::{ReconError, Result};

/// 单个主机名解析接口
///
/// `Ok(None)` 表示查询成功但没有可用地址。
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// 解析 `host`，返回第一个可用的 IPv4 地址
    async fn resolve(&self, host: &str) -> Result<Option<String>>;
}

/// 基于 trust-dns 的解析器
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    /// 优先使用系统配置，失败时退回默认上游
    pub fn new() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|_| {
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        DnsResolver { resolver }
    }
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostResolver for DnsResolver {
    /// 简单的A记录解析，只取第一个 IPv4 地址
    async fn resolve(&self, host: &str) -> Result<Option<String>> {
        let response = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| ReconError::Resolution {
                host: host.to_string(),
                reason: e.to_string(),
            })?;
        Ok(response.iter().find_map(|ip| match ip {
            IpAddr::V4(ipv4) => Some(ipv4.to_string()),
            IpAddr::V6(_) => None,
        }))
    }
}
