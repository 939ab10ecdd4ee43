//! 扫描调度：对每个目标运行外部扫描器，已完成的目标在后续运行中自动跳过

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::fs;
use tokio::process::Command;

use crate::cleaner::filtered_list;
use crate::error::{ReconError, Result};
use crate::limiter::ConcurrencyLimiter;
use crate::logger::{self, Status};
use crate::monitor::ConnectionMonitor;
use crate::output::{finished_marker_path, scan_output_path};

const MODULE: &str = "nmap.async_nmap";

/// 扫描进程的标准输出和标准错误
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// 标准输出
    pub stdout: String,
    /// 标准错误
    pub stderr: String,
}

/// 外部扫描器
#[async_trait]
pub trait ScanRunner: Send + Sync {
    /// 扫描 `target`，结果写入 `output_file`
    async fn scan(&self, target: &str, params: &str, output_file: &Path) -> Result<ScanOutput>;
}

/// 调用 nmap 可执行文件
#[derive(Debug, Clone)]
pub struct NmapRunner {
    binary: PathBuf,
}

impl NmapRunner {
    /// 使用 `PATH` 中的 nmap
    pub fn new() -> Self {
        Self::with_binary("nmap")
    }

    /// 使用指定的可执行文件
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        NmapRunner {
            binary: binary.into(),
        }
    }
}

impl Default for NmapRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScanRunner for NmapRunner {
    async fn scan(&self, target: &str, params: &str, output_file: &Path) -> Result<ScanOutput> {
        // 没有超时：卡住的 nmap 会一直占用许可
        let output = Command::new(&self.binary)
            .args(params.split_whitespace())
            .arg("-oX")
            .arg(output_file)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ReconError::ScanLaunch {
                target: target.to_string(),
                source: e,
            })?;
        Ok(ScanOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// 扫描调度配置
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// 扫描结果目录
    pub output_folder: PathBuf,
    /// 传给扫描器的参数
    pub params: String,
    /// 同时运行的扫描进程上限
    pub max_concurrent: usize,
    /// 输出文件名前缀
    pub file_prefix: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            output_folder: PathBuf::from(crate::api::DEFAULT_NMAP_OUTPUT_FOLDER),
            params: crate::api::DEFAULT_NMAP_PARAMS.to_string(),
            max_concurrent: crate::api::DEFAULT_NMAP_PROCESSES,
            file_prefix: "nmap.async".to_string(),
        }
    }
}

/// 单个目标的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// 扫描完成并已提交结果
    Finished,
    /// 已有完成标记
    Skipped,
    /// 扫描器无法运行
    Failed,
}

/// 调度汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// 完成数
    pub finished: usize,
    /// 跳过数
    pub skipped: usize,
    /// 失败数
    pub failed: usize,
}

impl ScanSummary {
    fn add(&mut self, outcome: ScanOutcome) {
        match outcome {
            ScanOutcome::Finished => self.finished += 1,
            ScanOutcome::Skipped => self.skipped += 1,
            ScanOutcome::Failed => self.failed += 1,
        }
    }
}

/// 扫描调度器
pub struct ScanDispatcher {
    runner: Arc<dyn ScanRunner>,
    config: ScanConfig,
    limiter: ConcurrencyLimiter,
    monitor: ConnectionMonitor,
}

impl ScanDispatcher {
    /// 进程上限取自 `config.max_concurrent`
    pub fn new(runner: Arc<dyn ScanRunner>, config: ScanConfig) -> Self {
        let limiter = ConcurrencyLimiter::new(config.max_concurrent);
        ScanDispatcher {
            runner,
            config,
            limiter,
            monitor: ConnectionMonitor::new(),
        }
    }

    /// 扫描进程限流器
    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// 正在运行的扫描
    pub fn monitor(&self) -> &ConnectionMonitor {
        &self.monitor
    }

    /// 扫描所有目标，全部完成后返回
    ///
    /// 目标先去重；单个目标的失败只记录日志。
    pub async fn dispatch_scans<I, S>(&self, targets: I) -> ScanSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let targets = filtered_list(targets);
        let mut summary = ScanSummary::default();
        if targets.is_empty() {
            logger::error_status(MODULE, Status::Failed, "No targets to scan");
            return summary;
        }

        if let Err(e) = fs::create_dir_all(&self.config.output_folder).await {
            logger::error_status(
                MODULE,
                Status::Error,
                &ReconError::io(&self.config.output_folder, e).to_string(),
            );
        }

        logger::info_status(
            MODULE,
            Status::Started,
            &format!("Starts scanning to: {}", targets.join(", ")),
        );
        let outcomes = join_all(
            targets
                .iter()
                .map(|ip| self.limiter.run(self.scan_ip(ip))),
        )
        .await;

        for outcome in outcomes {
            summary.add(outcome);
        }
        logger::info_status(
            MODULE,
            Status::Complete,
            &format!(
                "{} finished, {} skipped, {} failed",
                summary.finished, summary.skipped, summary.failed
            ),
        );
        summary
    }

    async fn scan_ip(&self, ip: &str) -> ScanOutcome {
        let folder = &self.config.output_folder;
        let prefix = &self.config.file_prefix;
        let finished = finished_marker_path(folder, prefix, ip);
        if fs::try_exists(&finished).await.unwrap_or(false) {
            logger::info_target(
                MODULE,
                ip,
                Status::Skipped,
                &format!("The '{}' file already exists.", finished.display()),
            );
            return ScanOutcome::Skipped;
        }

        let _token = self.monitor.start();

        let output = scan_output_path(folder, prefix, ip);
        if fs::try_exists(&output).await.unwrap_or(false) {
            logger::info_target(
                MODULE,
                ip,
                Status::Scanning,
                &format!("The '{}' file already exists. It will be overwritten.", output.display()),
            );
        }

        logger::info_target(MODULE, ip, Status::Scanning, "Starts!");
        match self.run_and_commit(ip, &output, &finished).await {
            Ok(()) => ScanOutcome::Finished,
            Err(e) => {
                logger::error_target(MODULE, ip, Status::Error, &format!("Error when scanning: {}", e));
                ScanOutcome::Failed
            }
        }
    }

    /// 运行扫描，成功后把输出文件重命名为完成标记
    async fn run_and_commit(&self, ip: &str, output: &Path, finished: &Path) -> Result<()> {
        let result = self.runner.scan(ip, &self.config.params, output).await?;
        logger::info_target(MODULE, ip, Status::Finished, &format!("\n{}", result.stdout));
        if !result.stderr.trim().is_empty() {
            logger::warn_target(
                MODULE,
                ip,
                Status::Error,
                &format!("Error when scanning:\n{}", result.stderr),
            );
        }

        fs::rename(output, finished)
            .await
            .map_err(|e| ReconError::io(output, e))?;
        logger::info_target(
            MODULE,
            ip,
            Status::Complete,
            &format!("File renamed from {} to {}", output.display(), finished.display()),
        );
        Ok(())
    }
}
