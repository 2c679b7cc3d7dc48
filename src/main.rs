//! KRXSCAN — daily KRX pattern scanner
//!
//! Entry point. Loads configuration, initialises structured logging,
//! gates on the trading calendar, and runs the single-pass
//! universe→scan→rank→notify pipeline.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::time::Duration;
use tracing::{error, info, warn};

use krxscan::config::AppConfig;
use krxscan::engine::gate::CalendarGate;
use krxscan::engine::scanner::Scanner;
use krxscan::engine::universe::UniverseBuilder;
use krxscan::notify::WebhookNotifier;
use krxscan::predicates::breakout::BreakoutPredicate;
use krxscan::predicates::gainer::{prev_weekday, GainerScan};
use krxscan::predicates::pullback::PullbackPredicate;
use krxscan::predicates::trendline::TrendlinePredicate;
use krxscan::predicates::PatternPredicate;
use krxscan::provider::krx::KrxClient;
use krxscan::report;

const BANNER: &str = r#"
 _  ___ ______  _____ ____    _    _   _
| |/ / |  _ \ \/ / __/ ___|  / \  | \ | |
| ' /| | |_) \  /\__ \ |    / _ \ |  \| |
| . \| |  _ </  \___) | |__/ ___ \| |\  |
|_|\_\_|_| \_\/\_\____/\____/_/  \_\_| \_|

  KRX daily pattern scanner
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        predicate = %cfg.scan.predicate,
        markets = ?cfg.universe.markets,
        depth = cfg.universe.depth,
        "KRXSCAN starting up"
    );

    // Webhook is a secret resolved from the environment. Without it we
    // still run, printing the report to stdout (dry-run mode).
    let notifier = match AppConfig::resolve_env(&cfg.notifier.webhook_url_env) {
        Ok(url) => Some(WebhookNotifier::new(
            url,
            cfg.notifier.chunk_limit,
            Duration::from_millis(cfg.notifier.chunk_delay_ms),
        )?),
        Err(e) => {
            warn!(error = %e, "No webhook configured — running in dry-run mode");
            None
        }
    };

    let today = Local::now().date_naive();
    match run(&cfg, notifier.as_ref(), today).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(error = %e, "Run failed");
            // Best-effort failure notice; decided behaviour for the
            // inconsistent startup-error reporting of the old scripts.
            if let Some(n) = &notifier {
                n.send(&format!("⚠️ KRXSCAN 실행 실패: {e}")).await;
            }
            Err(e)
        }
    }
}

/// Run the full calendar→universe→scan→rank→notify pipeline once.
async fn run(cfg: &AppConfig, notifier: Option<&WebhookNotifier>, today: NaiveDate) -> Result<()> {
    let provider = KrxClient::new(&cfg.provider.base_url)?;

    // 1. Calendar gate
    let gate = CalendarGate::new(&cfg.calendar.reference_ticker);
    if !gate.is_market_open(&provider, today).await {
        info!(date = %today, "Market closed — nothing to do");
        if cfg.calendar.notify_on_closed {
            deliver(
                notifier,
                &format!("📅 {} 오늘은 시장이 열리지 않아 분석을 건너뜁니다.", today),
            )
            .await;
        }
        return Ok(());
    }

    let universe_builder = UniverseBuilder::new(&cfg.universe)?;

    // 2-4. Scan, rank, format — predicate selected by config.
    let message = match cfg.scan.predicate.as_str() {
        "gainer" => {
            let scan = GainerScan::new(cfg.gainer.clone());
            let results = scan
                .run(&provider, today, prev_weekday(today), universe_builder.markets())
                .await?;
            let ranked = report::rank(results, scan.sort_order(), cfg.report.top_k);
            info!(matched = ranked.len(), "Gainer ranking complete");
            report::format_table(today, scan.label(), &ranked, &["change_pct", "close"])
        }
        name => {
            let predicate: Box<dyn PatternPredicate> = match name {
                "trendline" => Box::new(TrendlinePredicate::new(cfg.trendline.clone())),
                "pullback" => Box::new(PullbackPredicate::new(cfg.pullback.clone())),
                "breakout" => Box::new(BreakoutPredicate::new(cfg.breakout.clone())),
                other => anyhow::bail!("Unknown predicate in config: {other}"),
            };

            let universe = universe_builder.build(&provider, today).await;
            if universe.is_empty() {
                anyhow::bail!("Universe is empty — no venue ranking succeeded");
            }

            let scanner = Scanner::new(
                cfg.scan.lookback_days,
                Duration::from_millis(cfg.provider.request_delay_ms),
            );
            let (results, stats) = scanner
                .scan(&provider, predicate.as_ref(), &universe, today)
                .await;
            let ranked = report::rank(results, predicate.sort_order(), cfg.report.top_k);

            info!(
                scanned = stats.scanned,
                matched = ranked.len(),
                skipped = stats.skipped,
                errored = stats.errored,
                "Scan complete"
            );

            match cfg.report.style.as_str() {
                "itemized" => report::format_itemized(today, predicate.label(), &ranked),
                _ => report::format_table(
                    today,
                    predicate.label(),
                    &ranked,
                    metric_columns(predicate.name()),
                ),
            }
        }
    };

    // 5. Notify
    deliver(notifier, &message).await;
    Ok(())
}

/// Table columns shown per predicate.
fn metric_columns(predicate: &str) -> &'static [&'static str] {
    match predicate {
        "trendline" => &["close", "expected", "disparity", "r_squared"],
        "pullback" => &["flagpole_pct", "disparity", "close"],
        "breakout" => &["trigger_rise_pct", "disparity", "days_since_trigger"],
        _ => &[],
    }
}

/// Send to the webhook, or print when running without one.
async fn deliver(notifier: Option<&WebhookNotifier>, message: &str) {
    match notifier {
        Some(n) => n.send(message).await,
        None => println!("{message}"),
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("krxscan=info"));

    let json_logging = std::env::var("KRXSCAN_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
