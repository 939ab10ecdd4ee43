use std::fs::{self, File};
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use crate::error::{ReconError, Result};

/// 初始化日志：终端输出，另可写入日志目录
pub fn init_logger(verbose: bool, log_folder: Option<&Path>) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(folder) = log_folder {
        fs::create_dir_all(folder).map_err(|e| ReconError::io(folder, e))?;
        let path = folder.join(format!(
            "rvulnscan_{}.log",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ));
        let file = File::create(&path).map_err(|e| ReconError::io(&path, e))?;
        // 文件日志始终记录 debug 级别
        loggers.push(WriteLogger::new(LevelFilter::Debug, config, file));
    }

    CombinedLogger::init(loggers).map_err(|e| ReconError::Logger(e.to_string()))
}
