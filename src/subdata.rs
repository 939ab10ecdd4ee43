/// 常见子域名前缀，每一层递归都会拼接到当前域名上
pub const COMMON_SUBDOMAINS: &[&str] = &[
    "www", "mail", "webmail", "smtp", "pop", "imap", "ftp", "ns1", "ns2", "vpn", "api", "dev",
    "test", "staging", "admin", "portal", "m", "blog", "shop", "cdn", "git", "remote",
];

/// 内置前缀的拥有副本
pub fn get_common_subdomains() -> Vec<String> {
    COMMON_SUBDOMAINS.iter().map(|s| s.to_string()).collect()
}
