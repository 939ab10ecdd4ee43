use std::net::SocketAddr;
use std::time::Duration;

use colored::*;
use tokio::net::TcpStream;
use tokio::time::timeout;

const CONNECTIVITY_ADDRS: [&str; 2] = ["1.1.1.1:53", "8.8.8.8:53"];
const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(3);

/// 检查外网连通性：任一公共 DNS 的 53 端口可连即可
pub async fn check_internet_connection() -> bool {
    for addr in CONNECTIVITY_ADDRS {
        let Ok(addr) = addr.parse::<SocketAddr>() else {
            continue;
        };
        if let Ok(Ok(_)) = timeout(CONNECTIVITY_TIMEOUT, TcpStream::connect(addr)).await {
            return true;
        }
    }
    false
}

/// 启动横幅
pub fn banner() -> String {
    let title = format!(
        r"
               _
 _ ____   ___   _| |_ __  ___  ___ __ _ _ __
| '__\ \ / / | | | | '_ \/ __|/ __/ _` | '_ \
| |   \ V /| |_| | | | | \__ \ (_| (_| | | | |
|_|    \_/  \__,_|_|_| |_|___/\___\__,_|_| |_|  v{}
",
        env!("CARGO_PKG_VERSION")
    );
    format!(
        "{}\n{}\n",
        title.bright_red().bold(),
        "recursive subdomain resolution + bounded nmap dispatch".dimmed()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_has_version() {
        colored::control::set_override(false);
        assert!(banner().contains(env!("CARGO_PKG_VERSION")));
    }
}
