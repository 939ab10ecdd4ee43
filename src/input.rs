use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::api::{
    DEFAULT_BRUTEFORCE_LEVEL, DEFAULT_DOMAIN_CONCURRENCY, DEFAULT_NMAP_PARAMS,
    DEFAULT_NMAP_PROCESSES, DEFAULT_RESOLVE_CONCURRENCY,
};

/// 结果文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `<domain> - <ip>`
    #[default]
    DomainIp,
    /// `<ip>, <ip>, ...`
    Ip,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "domain-ip" => Ok(OutputFormat::DomainIp),
            "ip" => Ok(OutputFormat::Ip),
            _ => Err(format!("unsupported output format: {}. supported: domain-ip, ip", s)),
        }
    }
}

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "rvulnscan")]
#[command(author = "gelenlen")]
#[command(version)]
#[command(about = "Recursive subdomain resolution and bounded nmap scanning", long_about = None, arg_required_else_help = true)]
pub struct Opts {
    /// verbose (debug) console logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// also write logs into this folder
    #[arg(long, global = true)]
    pub log_folder: Option<PathBuf>,

    /// 要执行的模块命令
    #[command(subcommand)]
    pub command: Command,
}

/// 命令注册表：模块 -> 命令
#[derive(Subcommand, Debug)]
pub enum Command {
    /// domain module
    #[command(subcommand)]
    Domain(DomainCommand),

    /// nmap module
    #[command(subcommand)]
    Nmap(NmapCommand),
}

/// domain 模块的命令
#[derive(Subcommand, Debug)]
pub enum DomainCommand {
    /// resolve subdomains of the given domains
    Subdomain(SubdomainArgs),
}

/// nmap 模块的命令
#[derive(Subcommand, Debug)]
pub enum NmapCommand {
    /// resolve targets and run nmap against them with bounded parallelism
    AsyncNmap(AsyncNmapArgs),
}

/// 子域名暴破相关参数
#[derive(Args, Debug, Clone)]
pub struct BruteForceArgs {
    /// level of subdomain brute-forcing
    #[arg(short = 'l', long, default_value_t = DEFAULT_BRUTEFORCE_LEVEL)]
    pub level: usize,

    /// path to brute-force subdomains file
    #[arg(short = 'b', long)]
    pub brute_force_file: Option<PathBuf>,

    /// max DNS lookups in flight
    #[arg(long, default_value_t = DEFAULT_RESOLVE_CONCURRENCY)]
    pub resolve_concurrency: usize,

    /// max seed domains resolved at the same time
    #[arg(long, default_value_t = DEFAULT_DOMAIN_CONCURRENCY)]
    pub domain_concurrency: usize,

    /// do not query certificate transparency logs
    #[arg(long)]
    pub no_crtsh: bool,
}

/// `domain subdomain` 参数
#[derive(Args, Debug, Clone)]
pub struct SubdomainArgs {
    /// comma-separated list of domains (no spaces)
    #[arg(short, long, conflicts_with = "input_file", required_unless_present = "input_file")]
    pub domains: Option<String>,

    /// path to a file with domains
    #[arg(short, long)]
    pub input_file: Option<PathBuf>,

    /// 子域名暴破参数
    #[command(flatten)]
    pub brute: BruteForceArgs,

    /// output folder for results
    #[arg(short, long, default_value = "output/subdomain")]
    pub output_folder: PathBuf,

    /// do not write a result file
    #[arg(long)]
    pub no_output: bool,

    /// output format: domain-ip or ip
    #[arg(short = 'f', long, default_value = "domain-ip")]
    pub output_format: OutputFormat,
}

/// `nmap async-nmap` 参数
#[derive(Args, Debug, Clone)]
pub struct AsyncNmapArgs {
    /// comma-separated list of IP addresses or domains (no spaces)
    #[arg(short, long, conflicts_with = "input_file", required_unless_present = "input_file")]
    pub targets: Option<String>,

    /// path to a file with IP addresses or domains
    #[arg(short, long)]
    pub input_file: Option<PathBuf>,

    /// 子域名暴破参数
    #[command(flatten)]
    pub brute: BruteForceArgs,

    /// folder for nmap results
    #[arg(short, long, default_value = "output/nmap")]
    pub output_folder: PathBuf,

    /// parameters for nmap
    #[arg(long, default_value = DEFAULT_NMAP_PARAMS, allow_hyphen_values = true)]
    pub nmap_params: String,

    /// number of parallel scanning processes
    #[arg(short = 'p', long, default_value_t = DEFAULT_NMAP_PROCESSES)]
    pub processes: usize,

    /// skip the internet connectivity check
    #[arg(long)]
    pub skip_connectivity_check: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_consistent() {
        Opts::command().debug_assert();
    }

    #[test]
    fn output_format_parse() {
        assert_eq!("domain-ip".parse::<OutputFormat>(), Ok(OutputFormat::DomainIp));
        assert_eq!("IP".parse::<OutputFormat>(), Ok(OutputFormat::Ip));
        assert!("json".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn parses_subdomain_command() {
        let opts = Opts::try_parse_from([
            "rvulnscan", "domain", "subdomain", "-d", "a.com,b.com", "-l", "2", "-f", "ip",
        ])
        .unwrap();
        match opts.command {
            Command::Domain(DomainCommand::Subdomain(args)) => {
                assert_eq!(args.domains.as_deref(), Some("a.com,b.com"));
                assert_eq!(args.brute.level, 2);
                assert_eq!(args.output_format, OutputFormat::Ip);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_async_nmap_command() {
        let opts = Opts::try_parse_from([
            "rvulnscan", "nmap", "async-nmap", "-t", "10.0.0.1", "--nmap-params", "-sS -p 80", "-p", "2",
        ])
        .unwrap();
        match opts.command {
            Command::Nmap(NmapCommand::AsyncNmap(args)) => {
                assert_eq!(args.nmap_params, "-sS -p 80");
                assert_eq!(args.processes, 2);
                assert_eq!(args.brute.level, DEFAULT_BRUTEFORCE_LEVEL);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn targets_and_file_are_exclusive() {
        let result = Opts::try_parse_from([
            "rvulnscan", "nmap", "async-nmap", "-t", "10.0.0.1", "-i", "targets.txt",
        ]);
        assert!(result.is_err());
        assert!(Opts::try_parse_from(["rvulnscan", "nmap", "async-nmap"]).is_err());
    }
}
