use clap::Parser;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod pipeline;

#[derive(Debug, Parser)]
#[command(name = "ri_advisor_worker")]
struct Args {
    /// Usage report JSON file. Takes precedence over USAGE_FILE and USAGE_SOURCE_URL.
    #[arg(long)]
    input: Option<String>,

    /// Last day of the usage window (YYYY-MM-DD). Defaults to today's UTC date.
    #[arg(long)]
    end_date: Option<String>,

    /// Utilization ratio below which a reservation is flagged (0..=1).
    #[arg(long)]
    threshold: Option<String>,

    /// Skip usage rows without a reservation id instead of failing the run.
    #[arg(long)]
    skip_missing_keys: bool,

    /// Directory the JSON and CSV reports are written to. Defaults to REPORT_DIR or ".".
    #[arg(long)]
    output_dir: Option<String>,

    /// Do everything except writing reports.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = ri_advisor_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let opts = pipeline::RunOptions {
        input: args.input,
        end_date: args.end_date,
        threshold: args.threshold,
        skip_missing_keys: args.skip_missing_keys,
        output_dir: args.output_dir,
        dry_run: args.dry_run,
    };

    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("ri_report_run", %run_id);

    match pipeline::run(&settings, &opts, chrono::Utc::now())
        .instrument(span)
        .await
    {
        Ok(report) => {
            tracing::info!(
                %run_id,
                summaries = report.summaries,
                recommendations = report.recommendations,
                stored = ?report.stored,
                "ri report run finished"
            );
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(%run_id, error = %err, "ri report run failed");
            Err(err)
        }
    }
}

fn init_sentry(settings: &ri_advisor_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    let options = sentry::ClientOptions {
        release: sentry::release_name!(),
        environment: settings.sentry_environment.clone().map(Into::into),
        ..Default::default()
    };
    Some(sentry::init((dsn, options)))
}
