//! Run with: cargo run -p skipwise-core --example detect -- "Show.S01E02.mkv" 1320

use std::sync::Arc;

use skipwise_core::{
    AppConfig, ContentIdentity, ManualPreferences, Orchestrator, ResultCache, SegmentKind,
    SkipMarkers,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("skipwise_core=debug,skipwise_api=debug")
        }))
        .init();

    let mut args = std::env::args().skip(1);
    let filename = args.next().unwrap_or_else(|| "Show.S01E02.mkv".into());
    let runtime: i64 = args.next().and_then(|r| r.parse().ok()).unwrap_or(1320);

    let config = AppConfig::load()?;
    let prefs = Arc::new(config.preferences.clone());
    let auto_skip = ManualPreferences::read(prefs.as_ref()).auto_skip;
    let orchestrator = Orchestrator::from_config(&config, ResultCache::in_memory()?, prefs)?;

    let identity = ContentIdentity::from_filename(&filename, runtime);
    println!("asset: {} ({}s)", identity.cache_key(), runtime);

    let result = orchestrator.run_detection(&identity).await;
    if !result.is_success() {
        println!("no segments: {}", result.error().unwrap_or_default());
        return Ok(());
    }

    println!(
        "source: {} (confidence {:.2})",
        result.source(),
        result.confidence()
    );
    let markers = SkipMarkers::from_result(&result);
    for kind in SegmentKind::ALL {
        if let Some(segment) = markers.get(kind) {
            println!(
                "  {kind:?}: {}s - {}s",
                segment.start_secs, segment.end_secs
            );
        }
    }
    if let Some(target) = markers.auto_skip_target(30, &auto_skip) {
        println!("at 30s playback would jump to {target}s");
    }
    if let Some(report) = orchestrator.last_report() {
        println!(
            "attempted {:?}, skipped {:?}, took {:?}",
            report.attempted, report.skipped, report.elapsed
        );
    }
    Ok(())
}
