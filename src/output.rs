//! 结果输出：子域名解析结果文件与扫描文件路径

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{ReconError, Result};
use crate::input::OutputFormat;
use crate::logger::{self, Status};

const MODULE: &str = "domain.subdomain";

/// 结果文件名，包含运行时间戳
pub fn results_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("domain.subdomain_results_{}.txt", now.format("%Y%m%d_%H%M%S_%3f"))
}

/// 扫描进行中的输出文件
pub fn scan_output_path(folder: &Path, prefix: &str, ip: &str) -> PathBuf {
    folder.join(format!("{}_{}.xml", prefix, ip))
}

/// 扫描完成标记文件，存在即视为已扫描
pub fn finished_marker_path(folder: &Path, prefix: &str, ip: &str) -> PathBuf {
    folder.join(format!("{}_finished_{}.xml", prefix, ip))
}

/// 把一个分支的解析结果格式化为输出行
///
/// `domain-ip` 每个解析成功的候选一行，`ip` 整个分支一行。
pub fn format_branch(format: OutputFormat, resolved: &[(String, String)]) -> Vec<String> {
    if resolved.is_empty() {
        return Vec::new();
    }
    match format {
        OutputFormat::DomainIp => resolved
            .iter()
            .map(|(domain, ip)| format!("{} - {}", domain, ip))
            .collect(),
        OutputFormat::Ip => {
            let ips: Vec<&str> = resolved.iter().map(|(_, ip)| ip.as_str()).collect();
            vec![ips.join(", ")]
        }
    }
}

/// 追加写入的结果文件，整个运行期间只打开一次
#[derive(Debug)]
pub struct ResultSink {
    path: PathBuf,
    format: OutputFormat,
    file: Mutex<File>,
}

impl ResultSink {
    /// 在 `folder` 下新建带时间戳的结果文件
    pub async fn create(folder: &Path, format: OutputFormat) -> Result<Self> {
        fs::create_dir_all(folder)
            .await
            .map_err(|e| ReconError::io(folder, e))?;
        let path = folder.join(results_file_name(chrono::Local::now()));
        Self::create_at(path, format).await
    }

    /// 在指定路径新建结果文件，已存在则截断
    pub async fn create_at(path: PathBuf, format: OutputFormat) -> Result<Self> {
        let file = File::create(&path)
            .await
            .map_err(|e| ReconError::io(&path, e))?;
        Ok(ResultSink {
            path,
            format,
            file: Mutex::new(file),
        })
    }

    /// 结果文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入一个分支的结果；同一分支的行在一次加锁内写完，不会和其他分支交错
    pub async fn write_branch(&self, resolved: &[(String, String)]) -> Result<()> {
        let lines = format_branch(self.format, resolved);
        if lines.is_empty() {
            return Ok(());
        }
        let mut buf = lines.join("\n");
        buf.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(buf.as_bytes())
            .await
            .map_err(|e| self.sink_error(e))?;
        file.flush().await.map_err(|e| self.sink_error(e))
    }

    /// 刷新并关闭
    pub async fn close(self) -> Result<()> {
        let file = self.file.into_inner();
        file.sync_all().await.map_err(|e| ReconError::Sink {
            path: self.path.clone(),
            source: e,
        })?;
        logger::info_status(
            MODULE,
            Status::Complete,
            &format!("Results saved to '{}' file", self.path.display()),
        );
        Ok(())
    }

    fn sink_error(&self, source: std::io::Error) -> ReconError {
        ReconError::Sink {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pair(d: &str, ip: &str) -> (String, String) {
        (d.to_string(), ip.to_string())
    }

    #[test]
    fn domain_ip_format() {
        let lines = format_branch(
            OutputFormat::DomainIp,
            &[pair("www.a.com", "1.1.1.1"), pair("api.a.com", "2.2.2.2")],
        );
        assert_eq!(lines, vec!["www.a.com - 1.1.1.1", "api.a.com - 2.2.2.2"]);
    }

    #[test]
    fn ip_format_is_single_line() {
        let lines = format_branch(
            OutputFormat::Ip,
            &[pair("www.a.com", "1.1.1.1"), pair("api.a.com", "2.2.2.2")],
        );
        assert_eq!(lines, vec!["1.1.1.1, 2.2.2.2"]);
        assert!(format_branch(OutputFormat::Ip, &[]).is_empty());
    }

    #[test]
    fn scan_paths() {
        let folder = Path::new("/tmp/scans");
        assert_eq!(
            scan_output_path(folder, "nmap.async", "10.0.0.1"),
            PathBuf::from("/tmp/scans/nmap.async_10.0.0.1.xml")
        );
        assert_eq!(
            finished_marker_path(folder, "nmap.async", "10.0.0.1"),
            PathBuf::from("/tmp/scans/nmap.async_finished_10.0.0.1.xml")
        );
    }

    #[tokio::test]
    async fn concurrent_branches_do_not_interleave() {
        let folder = std::env::temp_dir().join(format!("rvulnscan_sink_{}", rand::random::<u32>()));
        let sink = Arc::new(ResultSink::create(&folder, OutputFormat::DomainIp).await.unwrap());

        let writes = (0..50).map(|i| {
            let sink = sink.clone();
            async move {
                let branch = vec![
                    pair(&format!("a{}.example.com", i), "10.0.0.1"),
                    pair(&format!("b{}.example.com", i), "10.0.0.2"),
                ];
                sink.write_branch(&branch).await.unwrap();
            }
        });
        futures::future::join_all(writes).await;

        let path = sink.path().to_path_buf();
        Arc::try_unwrap(sink).unwrap().close().await.unwrap();
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 100);
        for chunk in lines.chunks(2) {
            let a = chunk[0].trim_start_matches('a');
            let b = chunk[1].trim_start_matches('b');
            assert_eq!(a.split('.').next(), b.split('.').next());
        }
        tokio::fs::remove_dir_all(&folder).await.unwrap();
    }

    #[tokio::test]
    async fn unwritable_folder_is_error() {
        let result = ResultSink::create(Path::new("/proc/rvulnscan/denied"), OutputFormat::Ip).await;
        assert!(matches!(result, Err(ReconError::Io { .. })));
    }
}
