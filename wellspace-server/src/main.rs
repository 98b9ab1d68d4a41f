use std::fs;
use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;

use log::LevelFilter;
use simplelog::ColorChoice;
use simplelog::CombinedLogger;
use simplelog::Config;
use simplelog::SharedLogger;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use wellspace_server::AppState;
use wellspace_server::ServerConfig;
use wellspace_server::ServerError;
use wellspace_server::paths;
use wellspace_server::serve;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.log_level);

    if let Err(e) = run(config).await {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn init_logging(level: LevelFilter) {
    paths::rotate_logs();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = paths::log_file() {
        if let Some(dir) = path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        match File::create(&path) {
            Ok(file) => loggers.push(WriteLogger::new(level, Config::default(), file)),
            Err(e) => eprintln!("Warning: cannot write {}: {}", path.display(), e),
        }
    }
    let _ = CombinedLogger::init(loggers);
}

async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.bind).await?;
    let state = Arc::new(AppState::open(config).await?);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Shutting down");
                signal.cancel();
            }
            Err(e) => log::warn!("Cannot listen for Ctrl-C: {}", e),
        }
    });

    serve(listener, state, shutdown).await
}
