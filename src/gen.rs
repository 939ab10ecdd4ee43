//! 子域名候选生成

use std::path::Path;
use std::sync::Arc;
#[cfg(feature = "crtsh")]
use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "crtsh")]
use serde::Deserialize;

use crate::cleaner::filtered_list;
use crate::error::{ReconError, Result};
use crate::logger::{self, Status};

const MODULE: &str = "domain.subdomain";

/// 动态子域名来源（证书透明日志等）
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// 来源名称，用于日志
    fn name(&self) -> &'static str;

    /// 返回完整的主机名
    async fn collect(&self, domain: &str) -> Result<Vec<String>>;
}

/// 基于 crt.sh 证书透明日志的来源
#[cfg(feature = "crtsh")]
#[cfg_attr(docsrs, doc(cfg(feature = "crtsh")))]
pub struct CrtShSource {
    client: reqwest::Client,
}

#[cfg(feature = "crtsh")]
#[derive(Debug, Deserialize)]
struct CrtShEntry {
    name_value: String,
}

#[cfg(feature = "crtsh")]
impl CrtShSource {
    /// `timeout_secs` 为单次请求超时
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ReconError::Source {
                name: "crt.sh",
                reason: e.to_string(),
            })?;
        Ok(CrtShSource { client })
    }
}

#[cfg(feature = "crtsh")]
#[async_trait]
impl CandidateSource for CrtShSource {
    fn name(&self) -> &'static str {
        "crt.sh"
    }

    async fn collect(&self, domain: &str) -> Result<Vec<String>> {
        let source_err = |e: reqwest::Error| ReconError::Source {
            name: "crt.sh",
            reason: e.to_string(),
        };
        let url = format!("https://crt.sh/?q=%.{}&output=json", domain);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(source_err)?;
        let text = response.text().await.map_err(source_err)?;
        let entries: Vec<CrtShEntry> =
            serde_json::from_str(&text).map_err(|e| ReconError::Source {
                name: "crt.sh",
                reason: e.to_string(),
            })?;
        Ok(names_under(domain, entries.iter().map(|e| e.name_value.as_str())))
    }
}

/// 从证书名称中挑出属于 `domain` 的主机名
pub fn names_under<'a, I>(domain: &str, raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let domain = domain.to_lowercase();
    let suffix = format!(".{}", domain);
    let names = raw
        .into_iter()
        .flat_map(|value| value.split('\n'))
        .map(|line| line.trim().trim_start_matches("*.").to_lowercase())
        .filter(|name| !name.contains('*') && (*name == domain || name.ends_with(&suffix)));
    filtered_list(names)
}

/// 读取暴破字典，忽略空行和 `#` 注释
pub async fn load_wordlist(path: &Path) -> Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ReconError::io(path, e))?;
    let labels: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect();
    logger::info_status(
        MODULE,
        Status::Loaded,
        &format!("{} subdomains from '{}'", labels.len(), path.display()),
    );
    Ok(labels)
}

/// 候选生成器：动态来源 + 常见前缀 + 字典
#[derive(Clone)]
pub struct CandidateGenerator {
    sources: Vec<Arc<dyn CandidateSource>>,
    labels: Vec<String>,
    wordlist: Vec<String>,
}

impl CandidateGenerator {
    /// `labels` 与 `wordlist` 中的前缀会拼接到每一层的域名上
    pub fn new(
        sources: Vec<Arc<dyn CandidateSource>>,
        labels: Vec<String>,
        wordlist: Vec<String>,
    ) -> Self {
        CandidateGenerator {
            sources,
            labels,
            wordlist,
        }
    }

    /// 生成某一层的候选集合（已去重）
    ///
    /// 第 0 层只有种子域名本身。
    pub async fn candidates(&self, domain: &str, level: usize) -> Vec<String> {
        if level == 0 {
            return filtered_list([domain]);
        }

        let mut candidates = Vec::new();
        for source in &self.sources {
            match source.collect(domain).await {
                Ok(names) => candidates.extend(names),
                Err(e) => logger::warn_target(
                    MODULE,
                    domain,
                    Status::Failed,
                    &format!("{} lookup: {}", source.name(), e),
                ),
            }
        }
        candidates.extend(self.labels.iter().map(|label| format!("{}.{}", label, domain)));
        candidates.extend(self.wordlist.iter().map(|entry| format!("{}.{}", entry, domain)));

        // 动态来源可能返回父域名本身
        candidates.retain(|c| c != domain);
        filtered_list(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Vec<&'static str>);

    #[async_trait]
    impl CandidateSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn collect(&self, _domain: &str) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl CandidateSource for BrokenSource {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn collect(&self, _domain: &str) -> Result<Vec<String>> {
            Err(ReconError::Source {
                name: "broken",
                reason: "offline".into(),
            })
        }
    }

    #[test]
    fn crt_names_are_scoped_to_domain() {
        let raw = ["*.example.com\nwww.example.com", "Mail.Example.com", "evil.com", "example.com"];
        let names = names_under("example.com", raw);
        assert_eq!(names, vec!["example.com", "www.example.com", "mail.example.com"]);
    }

    #[tokio::test]
    async fn level_zero_is_seed_only() {
        let gen = CandidateGenerator::new(vec![], vec!["www".into()], vec![]);
        assert_eq!(gen.candidates("example.com", 0).await, vec!["example.com"]);
    }

    #[tokio::test]
    async fn duplicate_labels_collapse() {
        let source: Arc<dyn CandidateSource> = Arc::new(FixedSource(vec!["www.example.com", ""]));
        let gen = CandidateGenerator::new(
            vec![source],
            vec!["www".into(), "www".into(), "mail".into()],
            vec!["mail".into(), "dev".into()],
        );
        let candidates = gen.candidates("example.com", 1).await;
        assert_eq!(
            candidates,
            vec!["www.example.com", "mail.example.com", "dev.example.com"]
        );
    }

    #[tokio::test]
    async fn failing_source_is_ignored() {
        let gen = CandidateGenerator::new(vec![Arc::new(BrokenSource)], vec!["www".into()], vec![]);
        assert_eq!(gen.candidates("example.com", 2).await, vec!["www.example.com"]);
    }

    #[tokio::test]
    async fn wordlist_skips_comments_and_blanks() {
        let path = std::env::temp_dir().join(format!("rvulnscan_wordlist_{}.txt", rand::random::<u32>()));
        tokio::fs::write(&path, "# header\napi\n\n  dev  \n#skip\n").await.unwrap();
        let labels = load_wordlist(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(labels, vec!["api", "dev"]);
    }
}
