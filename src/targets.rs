//! 目标加载：从逗号列表或文本文件中提取 IP 与域名

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::cleaner::{filtered_list, filtered_str};
use crate::error::{ReconError, Result};
use crate::logger::{self, Status};

const MODULE: &str = "utils.load_from_file";

lazy_static! {
    static ref IP_RE: Regex = Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap();
    static ref DOMAIN_RE: Regex = Regex::new(r"\b(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}\b").unwrap();
}

/// 目标分类，仅做语法判断
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// IPv4 字面量
    Ip(String),
    /// 需要先解析子域名的域名
    Domain(String),
}

impl Target {
    /// 只由数字和点组成的视为 IP，其余视为域名
    pub fn classify(token: &str) -> Target {
        let token = token.trim();
        if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit() || c == '.') {
            Target::Ip(token.to_string())
        } else {
            Target::Domain(token.to_string())
        }
    }
}

/// 已去重的目标集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedTargets {
    /// IP 字面量
    pub ips: Vec<String>,
    /// 域名
    pub domains: Vec<String>,
}

impl LoadedTargets {
    /// 两类目标都为空
    pub fn is_empty(&self) -> bool {
        self.ips.is_empty() && self.domains.is_empty()
    }
}

/// 解析逗号分隔的目标列表
pub fn split_target_list(list: &str) -> LoadedTargets {
    let mut ips = Vec::new();
    let mut domains = Vec::new();
    for token in list.split(',') {
        match Target::classify(token) {
            Target::Ip(ip) => ips.push(ip),
            Target::Domain(domain) => domains.push(domain),
        }
    }
    LoadedTargets {
        ips: filtered_list(ips),
        domains: filtered_list(domains),
    }
}

/// 从任意文本中提取 IP 和域名
pub fn parse_targets(contents: &str) -> LoadedTargets {
    let contents = filtered_str(contents);
    let ips: Vec<&str> = IP_RE.find_iter(&contents).map(|m| m.as_str()).collect();
    let domains: Vec<&str> = DOMAIN_RE
        .find_iter(&contents)
        .map(|m| m.as_str())
        .filter(|d| !ips.contains(d))
        .collect();

    LoadedTargets {
        ips: filtered_list(ips),
        domains: filtered_list(domains),
    }
}

/// 异步读取目标文件
pub async fn load_targets(input_file: &Path) -> Result<LoadedTargets> {
    logger::info_status(
        MODULE,
        Status::Load,
        &format!("Check IPs and domains in the '{}' file", input_file.display()),
    );
    let contents = tokio::fs::read_to_string(input_file)
        .await
        .map_err(|e| ReconError::io(input_file, e))?;
    let targets = parse_targets(&contents);

    if !targets.ips.is_empty() {
        logger::info_status(MODULE, Status::Loaded, &format!("IPs: {}", targets.ips.join(", ")));
    }
    if !targets.domains.is_empty() {
        logger::info_status(
            MODULE,
            Status::Loaded,
            &format!("Domains: {}", targets.domains.join(", ")),
        );
    }
    if targets.is_empty() {
        logger::error_status(
            MODULE,
            Status::Failed,
            &format!("No IPs or domains found in '{}'", input_file.display()),
        );
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_syntactic() {
        assert_eq!(Target::classify("10.0.0.1"), Target::Ip("10.0.0.1".into()));
        assert_eq!(Target::classify(" 999.1.1.1 "), Target::Ip("999.1.1.1".into()));
        assert_eq!(
            Target::classify("example.com"),
            Target::Domain("example.com".into())
        );
    }

    #[test]
    fn comma_list_is_split_and_deduped() {
        let targets = split_target_list("10.0.0.1, example.com,10.0.0.1,,example.com ");
        assert_eq!(targets.ips, vec!["10.0.0.1"]);
        assert_eq!(targets.domains, vec!["example.com"]);
    }

    #[test]
    fn free_text_extraction() {
        let text = "hosts: 192.168.1.10 and mail.example.org\nweb example.org, 192.168.1.10\n";
        let targets = parse_targets(text);
        assert_eq!(targets.ips, vec!["192.168.1.10"]);
        assert_eq!(targets.domains, vec!["mail.example.org", "example.org"]);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = tokio_test::block_on(load_targets(Path::new("/nonexistent/rvulnscan/targets.txt")));
        assert!(matches!(result, Err(ReconError::Io { .. })));
    }
}
