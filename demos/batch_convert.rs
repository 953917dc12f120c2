//! Batch document conversion through the queue.
//!
//! Simulates the motivating deployment: several callers hand batches of
//! named byte buffers to a single conversion engine that must never run
//! two jobs at once. Each work function reports per-file success or
//! failure inside its returned value; the queue stays oblivious.
//!
//! Run with: `cargo run --example batch_convert`

use std::thread;
use std::time::Duration;

use convq::TaskQueue;

/// Per-file conversion result: the converted bytes or an error note.
type BatchResult = Vec<(String, Result<Vec<u8>, String>)>;

/// Stand-in for the real engine call (e.g. a headless soffice subprocess).
fn convert_batch(files: Vec<(String, Vec<u8>)>) -> BatchResult {
    thread::sleep(Duration::from_millis(100));
    files
        .into_iter()
        .map(|(name, content)| {
            if content.is_empty() {
                (name, Err("empty input".to_string()))
            } else {
                (name, Ok(content.to_ascii_uppercase()))
            }
        })
        .collect()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "convq=debug".into()),
        )
        .init();

    let queue = TaskQueue::new();

    let batches = vec![
        vec![
            ("report.doc".to_string(), b"quarterly numbers".to_vec()),
            ("notes.doc".to_string(), Vec::new()),
        ],
        vec![("slides.ppt".to_string(), b"roadmap".to_vec())],
        vec![("ledger.xls".to_string(), b"balances".to_vec())],
    ];

    let ids: Vec<_> = batches
        .into_iter()
        .map(|files| queue.submit(move || convert_batch(files)).unwrap())
        .collect();

    for id in &ids {
        println!("task {id} at position {}", queue.position(*id));
    }

    for id in ids {
        match queue.wait(id, Duration::from_secs(30)).await {
            Some(Ok(batch)) => {
                for (name, result) in batch {
                    match result {
                        Ok(bytes) => println!("{name}: converted {} bytes", bytes.len()),
                        Err(reason) => println!("{name}: failed ({reason})"),
                    }
                }
            }
            Some(Err(failure)) => println!("task {id} crashed: {failure}"),
            None => println!("task {id} timed out or was abandoned"),
        }
    }

    queue.shutdown().await;
}
