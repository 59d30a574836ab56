use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dataset_sdk::{HttpDatasetService, SortCondition, SortDirection};
use dataset_server::telemetry::init_tracing;
use tokio::sync::broadcast;
use tracing::{info, warn};
use window_store::{
    FetchChannel, QueryController, ScrollGeometry, ScrollOutcome, StoreConfig, StoreEvent,
    WindowStore,
};

const ROW_HEIGHT_PX: f64 = 40.0;
const VIEWPORT_PX: f64 = 800.0;

#[derive(Debug, Parser)]
#[command(
    name = "window-probe",
    author,
    version,
    about = "Loads a dataset window, applies optional edits and scrolls to the bottom"
)]
struct Cli {
    /// Base URL of the dataset service.
    #[arg(long, env = "DATASET_SERVICE_URL", default_value = "http://127.0.0.1:8000")]
    base_url: String,

    /// Call `init_db` before querying.
    #[arg(long, default_value_t = false)]
    init: bool,

    /// Force re-seeding when `--init` is set.
    #[arg(long, default_value_t = false)]
    force: bool,

    /// Free-text search, applied through the search debouncer.
    #[arg(long)]
    search: Option<String>,

    /// Sort keys as `column:asc` or `column:desc`, in priority order.
    #[arg(long = "sort")]
    sorts: Vec<String>,

    /// Number of near-bottom scroll events to simulate.
    #[arg(long, default_value_t = 3)]
    scrolls: usize,

    /// Tracing filter directive.
    #[arg(long, env = "WINDOW_PROBE_LOG", default_value = "info")]
    log: String,
}

fn parse_sort(raw: &str, priority: u32) -> Result<SortCondition> {
    let (column, direction) = raw.split_once(':').unwrap_or((raw, "asc"));
    let direction = match direction.to_ascii_lowercase().as_str() {
        "asc" => SortDirection::Asc,
        "desc" => SortDirection::Desc,
        other => bail!("unknown sort direction `{other}` in `{raw}`"),
    };
    if column.is_empty() {
        bail!("sort `{raw}` has no column");
    }
    Ok(SortCondition::new(column, direction, priority))
}

/// Waits until the next full refresh settles.
async fn wait_for_refresh(events: &mut broadcast::Receiver<StoreEvent>) -> Result<()> {
    loop {
        match events.recv().await {
            Ok(StoreEvent::FetchSettled {
                channel: FetchChannel::FullRefresh,
            }) => return Ok(()),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "event receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => bail!("store event channel closed"),
        }
    }
}

fn report(store: &WindowStore, label: &str) {
    let snapshot = store.snapshot();
    let first = store.items().first().map(|record| record.id);
    info!(
        step = label,
        len = snapshot.len,
        capacity = snapshot.capacity,
        total = snapshot.total,
        window_start = snapshot.window_start,
        first_id = ?first,
        error = ?snapshot.error,
        "window"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    let service = HttpDatasetService::parse(&cli.base_url)
        .with_context(|| format!("invalid base url: {}", cli.base_url))?;
    if cli.init {
        let response = service
            .init_dataset(cli.force)
            .await
            .context("init_db failed")?;
        info!(message = %response.message, "dataset initialised");
    }

    let config = StoreConfig::from_env();
    let store = WindowStore::new(Arc::new(service), config).context("invalid store config")?;
    let mut events = store.subscribe();
    let controller = QueryController::new(store.clone());

    let logger = {
        let mut events = store.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                info!(event = ?event, "store event");
            }
        })
    };

    store.full_refresh().await;
    report(&store, "initial");

    if !cli.sorts.is_empty() {
        let sorts = cli
            .sorts
            .iter()
            .zip(1u32..)
            .map(|(raw, priority)| parse_sort(raw, priority))
            .collect::<Result<Vec<_>>>()?;
        events = events.resubscribe();
        controller.edit_sorts(sorts);
        wait_for_refresh(&mut events).await?;
        report(&store, "sorted");
    }

    if let Some(search) = cli.search {
        events = events.resubscribe();
        controller.edit_search(search);
        wait_for_refresh(&mut events).await?;
        report(&store, "searched");
    }

    for step in 0..cli.scrolls {
        let scroll_height = store.len() as f64 * ROW_HEIGHT_PX;
        let geometry = ScrollGeometry::new(
            (scroll_height - VIEWPORT_PX).max(0.0),
            scroll_height,
            VIEWPORT_PX,
        );
        match controller.on_scroll(geometry).await {
            Some(ScrollOutcome::Appended { evicted, .. }) => {
                info!(step, evicted, "scroll loaded next page");
            }
            Some(outcome) => info!(step, outcome = ?outcome, "scroll did not extend window"),
            None => {
                info!(step, "nothing left to load");
                break;
            }
        }
        report(&store, "scrolled");
    }

    let snapshot = store.snapshot();
    println!(
        "{}",
        serde_json::json!({
            "len": snapshot.len,
            "capacity": snapshot.capacity,
            "total": snapshot.total,
            "window_start": snapshot.window_start,
            "error": snapshot.error.map(|err| err.to_string()),
        })
    );
    logger.abort();
    Ok(())
}
