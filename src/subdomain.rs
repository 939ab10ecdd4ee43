//! 递归子域名解析引擎
//!
//! 从种子域名开始逐层生成候选、并发解析，解析成功的名字继续向下一层展开，
//! 直到达到配置的最大层级。发现的 IP 汇总到一次运行共享的集合中，
//! 同时每个分支完成时立即写入结果文件。

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;

use crate::cleaner::filtered_list;
use crate::dns_resolver::HostResolver;
use crate::error::Result;
use crate::gen::CandidateGenerator;
use crate::limiter::ConcurrencyLimiter;
use crate::logger::{self, Status};
use crate::output::ResultSink;

const MODULE: &str = "domain.subdomain";

/// 单次运行的共享状态
#[derive(Debug, Default)]
struct RunState {
    found: Mutex<HashSet<String>>,
    sink: Option<Arc<ResultSink>>,
}

impl RunState {
    fn record(&self, resolved: &[(String, String)]) {
        let mut found = self.found.lock().unwrap_or_else(|e| e.into_inner());
        found.extend(resolved.iter().map(|(_, ip)| ip.clone()));
    }

    fn take(&self) -> HashSet<String> {
        std::mem::take(&mut *self.found.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// 子域名解析引擎
#[derive(Clone)]
pub struct SubdomainResolver {
    resolver: Arc<dyn HostResolver>,
    generator: CandidateGenerator,
    max_level: usize,
    lookup_limiter: ConcurrencyLimiter,
    domain_limiter: ConcurrencyLimiter,
}

impl SubdomainResolver {
    /// `max_level` 为 0 时只解析种子本身
    pub fn new(
        resolver: Arc<dyn HostResolver>,
        generator: CandidateGenerator,
        max_level: usize,
        lookup_limiter: ConcurrencyLimiter,
        domain_limiter: ConcurrencyLimiter,
    ) -> Self {
        SubdomainResolver {
            resolver,
            generator,
            max_level,
            lookup_limiter,
            domain_limiter,
        }
    }

    /// 单个名字查询共用的限流器
    pub fn lookup_limiter(&self) -> &ConcurrencyLimiter {
        &self.lookup_limiter
    }

    /// 解析单个种子域名
    pub async fn resolve(&self, domain: &str, sink: Option<Arc<ResultSink>>) -> HashSet<String> {
        self.resolve_ips_from_subdomains(&[domain.to_string()], sink)
            .await
    }

    /// 解析一批种子域名，返回所有发现的 IP（去重，无序）
    ///
    /// 每个种子在独立任务中运行，某个种子失败只记录日志，不影响其他种子。
    pub async fn resolve_ips_from_subdomains(
        &self,
        domains: &[String],
        sink: Option<Arc<ResultSink>>,
    ) -> HashSet<String> {
        let run = Arc::new(RunState {
            found: Mutex::new(HashSet::new()),
            sink,
        });
        logger::info_status(MODULE, Status::Started, "The search for subdomains has begun");

        let tasks = filtered_list(domains).into_iter().map(|domain| {
            let engine = self.clone();
            let run = run.clone();
            async move {
                let _permit = engine.domain_limiter.acquire().await;
                let handle = tokio::spawn(engine.clone().resolve_domain(domain.clone(), run));
                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => logger::error_target(
                        MODULE,
                        &domain,
                        Status::Error,
                        &format!("Failed resolve_ips_from_subdomains: {}", e),
                    ),
                    Err(e) => logger::error_target(
                        MODULE,
                        &domain,
                        Status::Error,
                        &format!("Resolution task aborted: {}", e),
                    ),
                }
            }
        });
        join_all(tasks).await;

        let found = run.take();
        logger::info_status(
            MODULE,
            Status::Complete,
            &format!("{} unique IPs found", found.len()),
        );
        found
    }

    async fn resolve_domain(self, domain: String, run: Arc<RunState>) -> Result<()> {
        self.search(domain, 0, &run).await
    }

    /// 处理一个分支 `(domain, level)`
    fn search<'a>(&'a self, domain: String, level: usize, run: &'a RunState) -> BoxFuture<'a, Result<()>> {
        async move {
            let candidates = self.generator.candidates(&domain, level).await;
            let answers = join_all(candidates.iter().map(|c| self.lookup(c))).await;
            let failed = answers.iter().filter(|a| a.is_err()).count();
            if let Some(summary) = failure_summary(candidates.len(), failed) {
                logger::warn_target(MODULE, &domain, Status::Failed, &summary);
            }
            let resolved: Vec<(String, String)> = candidates
                .iter()
                .zip(answers)
                .filter_map(|(candidate, ip)| ip.ok().flatten().map(|ip| (candidate.clone(), ip)))
                .collect();

            if !resolved.is_empty() {
                run.record(&resolved);
                if let Some(sink) = &run.sink {
                    sink.write_branch(&resolved).await?;
                }
            }

            if level >= self.max_level {
                return Ok(());
            }

            // 种子总是向下展开，更深的层只展开解析成功的名字
            let next: Vec<String> = if level == 0 {
                candidates
            } else {
                resolved.into_iter().map(|(name, _)| name).collect()
            };
            let children = join_all(next.into_iter().map(|name| self.search(name, level + 1, run))).await;
            children.into_iter().collect::<Result<Vec<()>>>()?;
            Ok(())
        }
        .boxed()
    }

    /// 解析单个候选；失败只在 debug 级别逐条记录，由分支汇总计数
    async fn lookup(&self, host: &str) -> Result<Option<String>> {
        match self.lookup_limiter.run(self.resolver.resolve(host)).await {
            Ok(Some(ip)) if !ip.trim().is_empty() => {
                logger::info_target(MODULE, &ip, Status::Resolved, host);
                Ok(Some(ip.trim().to_string()))
            }
            Ok(_) => Ok(None),
            Err(e) => {
                logger::debug_target(MODULE, host, Status::Failed, &e.to_string());
                Err(e)
            }
        }
    }
}

/// 分支内解析失败的汇总，全部成功时为 `None`
fn failure_summary(total: usize, failed: usize) -> Option<String> {
    if failed == 0 {
        return None;
    }
    Some(format!("{} of {} candidates failed to resolve", failed, total))
}
