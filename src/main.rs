use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error, info};
use rvulnscan::api::{self, SubdomainConfig};
use rvulnscan::input::{
    AsyncNmapArgs, BruteForceArgs, Command, DomainCommand, NmapCommand, Opts, SubdomainArgs,
};
use rvulnscan::logger;
use rvulnscan::scanner::ScanConfig;
use rvulnscan::targets::{self, LoadedTargets};
use rvulnscan::util;

#[tokio::main]
async fn main() -> ExitCode {
    let opts = Opts::parse();

    if let Err(e) = logger::init_logger(opts.verbose, opts.log_folder.as_deref()) {
        eprintln!("日志初始化失败: {}", e);
    }
    info!("{}", util::banner());
    debug!("log folder: {:?}", opts.log_folder);

    let result = match opts.command {
        Command::Domain(DomainCommand::Subdomain(args)) => run_subdomain(args).await,
        Command::Nmap(NmapCommand::AsyncNmap(args)) => run_async_nmap(args).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn subdomain_config(brute: &BruteForceArgs) -> SubdomainConfig {
    SubdomainConfig {
        level: brute.level,
        brute_force_file: brute.brute_force_file.clone(),
        resolve_concurrency: brute.resolve_concurrency,
        domain_concurrency: brute.domain_concurrency,
        use_crtsh: !brute.no_crtsh,
        ..Default::default()
    }
}

/// 读取目标：逗号列表或文件
async fn load_targets(
    list: Option<&str>,
    input_file: Option<&Path>,
) -> Result<LoadedTargets, Box<dyn std::error::Error>> {
    match (list, input_file) {
        (Some(list), _) => Ok(targets::split_target_list(list)),
        (None, Some(path)) => Ok(targets::load_targets(path).await?),
        (None, None) => Ok(LoadedTargets::default()),
    }
}

/// domain subdomain
async fn run_subdomain(args: SubdomainArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let loaded = load_targets(args.domains.as_deref(), args.input_file.as_deref()).await?;
    // 该命令只处理域名
    let domains = loaded.domains;
    if domains.is_empty() {
        logger::error_status("domain.subdomain", logger::Status::Failed, "No domains to resolve");
        return Ok(ExitCode::SUCCESS);
    }

    let config = SubdomainConfig {
        output_folder: (!args.no_output).then(|| args.output_folder.clone()),
        output_format: args.output_format,
        ..subdomain_config(&args.brute)
    };
    let ips = api::resolve_ips_from_subdomains(&domains, &config).await?;
    let mut ips: Vec<String> = ips.into_iter().collect();
    ips.sort();
    info!("found IPs: {}", ips.join(", "));
    Ok(ExitCode::SUCCESS)
}

/// nmap async-nmap
async fn run_async_nmap(args: AsyncNmapArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if !args.skip_connectivity_check && !util::check_internet_connection().await {
        logger::error_status(
            "nmap.async_nmap",
            logger::Status::Error,
            "Unable to execute script, no internet connection!",
        );
        return Ok(ExitCode::FAILURE);
    }

    let loaded = load_targets(args.targets.as_deref(), args.input_file.as_deref()).await?;
    // 扫描流程不写子域名结果文件
    let sub_config = SubdomainConfig {
        output_folder: None,
        ..subdomain_config(&args.brute)
    };
    let scan_config = ScanConfig {
        output_folder: args.output_folder,
        params: args.nmap_params,
        max_concurrent: args.processes,
        ..Default::default()
    };
    let summary = api::run_async_nmap(&loaded, &sub_config, scan_config).await?;
    info!(
        "scan summary: {} finished, {} skipped, {} failed",
        summary.finished, summary.skipped, summary.failed
    );
    Ok(ExitCode::SUCCESS)
}
