use anyhow::Context;
use clap::Parser;
use daybrief_core::pipeline::Pipeline;
use daybrief_core::storage::json_file::JsonFileStore;
use daybrief_core::storage::lock::acquire_run_lock;
use std::path::PathBuf;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "daybrief")]
struct Args {
    /// Directory holding daily_snapshot.json and the files the run writes.
    /// Defaults to $DAYBRIEF_DATA_DIR, then `data`.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Date stamped on the brief (YYYY-MM-DD). Defaults to today's local date.
    #[arg(long)]
    as_of_date: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = daybrief_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let as_of_date = resolve_as_of_date(args.as_of_date.as_deref())?;
    let data_dir = args.data_dir.unwrap_or_else(|| settings.data_dir());
    let run_id = uuid::Uuid::new_v4();

    let result = run(&settings, &data_dir, as_of_date)
        .instrument(tracing::info_span!("pipeline_run", %run_id))
        .await;

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(%run_id, %as_of_date, error = format!("{err:#}"), "pipeline run failed");
    }
    result
}

async fn run(
    settings: &daybrief_core::config::Settings,
    data_dir: &std::path::Path,
    as_of_date: chrono::NaiveDate,
) -> anyhow::Result<()> {
    let _lock = acquire_run_lock(data_dir)?;

    let store = JsonFileStore::new(data_dir);
    let llm = daybrief_core::llm::client_from_settings(settings)?;
    tracing::info!(
        data_dir = %data_dir.display(),
        provider = %llm.provider(),
        %as_of_date,
        "starting pipeline run"
    );

    let report = Pipeline::new(&store, llm.as_ref())
        .run(as_of_date)
        .await
        .context("pipeline run aborted")?;

    tracing::info!(
        %as_of_date,
        items = report.brief.items.len(),
        observations = report.observations,
        actions = report.actions,
        history_len = report.history_len,
        unmatched_reviews = report.joins.unmatched_reviews.len(),
        brief = %store.latest_brief_path().display(),
        "daily decision brief ready"
    );
    Ok(())
}

fn init_sentry(settings: &daybrief_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

fn resolve_as_of_date(as_of_date_arg: Option<&str>) -> anyhow::Result<chrono::NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("--as-of-date `{s}` is not YYYY-MM-DD"));
    }
    Ok(chrono::Local::now().date_naive())
}
