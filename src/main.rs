use std::process::ExitCode;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weekly_momentum::application::report;
use weekly_momentum::config::{ReportFormat, ScreeningConfig};
use weekly_momentum::domain::repositories::candidate_source::PaginatedCandidateSource;
use weekly_momentum::domain::services::symbol_screening::{
    AbortHandle, MomentumScreeningService, RunSettings,
};
use weekly_momentum::infrastructure::{ScreenerClient, YahooConfig, YahooFinanceClient};
use weekly_momentum::rate_limit::create_rate_limiter;

/// Trips `abort` on Ctrl+C or SIGTERM. Symbols already in flight finish.
fn spawn_abort_on_signal(abort: AbortHandle) {
    tokio::spawn(async move {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal"),
                Err(e) => {
                    error!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("Received SIGTERM signal");
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
        warn!("Aborting run, remaining symbols will be reported as cancelled");
        abort.abort();
    });
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env file: {}", e);
        }
    }

    // Logs go to stderr; stdout carries the report only.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weekly_momentum=info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ScreeningConfig::from_env();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::from(2);
    }

    let limiter = create_rate_limiter(config.rate_limiter_config());
    let request_timeout = Duration::from_millis(config.fetch_timeout_ms);

    let screener = match ScreenerClient::new(request_timeout) {
        Ok(client) => client.with_rate_limiter(limiter.clone()),
        Err(e) => {
            error!("Failed to create screener client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let yahoo_config = YahooConfig {
        request_timeout,
        ..YahooConfig::default()
    };
    let yahoo = match YahooFinanceClient::new(yahoo_config) {
        Ok(client) => client.with_rate_limiter(limiter),
        Err(e) => {
            error!("Failed to create market data client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let settings = RunSettings {
        screen: config.screen_url.clone(),
        max_pages: config.max_pages,
        index_identifier: config.index_symbol.clone(),
        lookback: config.lookback(),
        interval: config.interval,
        max_concurrent_fetches: config.max_concurrent_fetches,
        retry: config.retry_config(),
    };

    let service = MomentumScreeningService::new(
        PaginatedCandidateSource::new(screener, config.page_size),
        yahoo,
        settings,
    )
    .with_policy(config.symbol_policy())
    .with_fundamentals(config.fundamentals_screen())
    .with_engine(config.indicator_engine())
    .with_liquidity(config.liquidity_filter())
    .with_ranker(config.ranker());

    spawn_abort_on_signal(service.abort_handle());

    let run_report = match service.run().await {
        Ok(run_report) => run_report,
        Err(e) => {
            error!("Screening run aborted: {}", e);
            println!("{}", report::source_error_message(&e));
            return ExitCode::FAILURE;
        }
    };

    match config.report_format {
        ReportFormat::Text => {
            println!("{}", report::render_text(&run_report.outcome, config.top_n));
        }
        ReportFormat::Json => match report::render_json(&run_report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}
