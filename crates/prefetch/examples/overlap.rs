//! Compare strict alternation with prefetching for a slow producer and a slow consumer.
//!
//! ```
//! cargo run -p prefetch --example overlap [ITEMS] [MAX_PREFETCH]
//! ```

use std::{
    env::args,
    error::Error,
    thread,
    time::{Duration, Instant},
};

use prefetch::{PrefetchConfig, prefetch_with};
use tracing::{info, metadata::LevelFilter};
use tracing_subscriber::EnvFilter;

const STEP: Duration = Duration::from_millis(25);

/// Pretend to read a batch from disk.
fn load_batches(count: u32) -> impl Iterator<Item = Result<Vec<u8>, std::io::Error>> + Send {
    (0..count).map(|i| {
        thread::sleep(STEP);
        Ok(vec![i as u8; 1024])
    })
}

/// Pretend to crunch a batch.
fn process(batch: &[u8]) -> u64 {
    thread::sleep(STEP);
    batch.iter().map(|&b| u64::from(b)).sum()
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::default()
                .add_directive("prefetch=debug".parse()?)
                .add_directive(LevelFilter::INFO.into()),
        )
        .with_line_number(false)
        .with_file(false)
        .init();

    let count: u32 = args().nth(1).map(|s| s.parse()).transpose()?.unwrap_or(20);
    let max_prefetch: isize = args().nth(2).map(|s| s.parse()).transpose()?.unwrap_or(1);

    let start = Instant::now();
    let mut total = 0;
    for batch in load_batches(count) {
        total += process(&batch?);
    }
    info!(total, elapsed = ?start.elapsed(), "sequential");

    let config = PrefetchConfig::new(max_prefetch).with_thread_name("batch-loader");
    let batches = prefetch_with(config, load_batches);

    let start = Instant::now();
    let mut total = 0;
    for batch in batches(count) {
        total += process(&batch?);
    }
    info!(total, elapsed = ?start.elapsed(), max_prefetch, "prefetched");

    Ok(())
}
