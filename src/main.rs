// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use fluid_constructs::config::{load_and_validate_config_with, RuntimeBuilder};
use fluid_constructs::data::Data;
use fluid_constructs::observability::init_tracing;
use fluid_constructs::sinks;
use fluid_constructs::sources::SourceRegistry;
use serde_json::Value;

const MERGED_STREAM_NAME: &str = "fluid";

/// Render a payload as a line: strings verbatim, everything else as JSON.
fn render(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn usage(program: &str) {
    eprintln!("Usage: {} <config.yaml> [--output <file>]", program);
    eprintln!("Example: {} configs/demo.yaml", program);
    eprintln!("Example: {} configs/demo.yaml --output /tmp/demo.txt", program);
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("fluid");

    let (config_file, output) = match args.as_slice() {
        [_, config] => (config.as_str(), None),
        [_, config, flag, path] if flag == "--output" => (config.as_str(), Some(path.as_str())),
        _ => {
            usage(program);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config_file, output).await {
        eprintln!("❌ Failed to run {}: {:#}", config_file, e);
        std::process::exit(1);
    }
}

async fn run(config_file: &str, output: Option<&str>) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let registry = SourceRegistry::with_builtins();
    let config = load_and_validate_config_with(config_file, &registry)?;
    let sources = RuntimeBuilder::from_config(&config, &registry)
        .await
        .with_context(|| format!("building sources from {}", config_file))?;

    println!("🚀 Fluid Constructs");
    println!("═══════════════════");
    println!("Config: {}", config_file);
    println!("Sources: {:?}", sources.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>());
    println!();

    let mut streams = sources.into_iter().map(|(_, stream)| stream);
    let Some(first) = streams.next() else {
        println!("No sources configured, nothing to do.");
        return Ok(());
    };

    let delivered = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&delivered);
    let lines = first
        .merge_with(streams)
        .named(MERGED_STREAM_NAME)
        .transform(move |data: Data<Value>| {
            counter.fetch_add(1, Ordering::Relaxed);
            data.map(render)
        });

    match output {
        Some(path) => lines.to(sinks::file(path)).await?,
        None => {
            lines
                .to(sinks::for_each(|data: Data<String>| println!("{}", data.payload())))
                .await?
        }
    }

    println!();
    println!(
        "✅ Delivered {} items in {:?}",
        delivered.load(Ordering::Relaxed),
        start_time.elapsed()
    );
    if let Some(path) = output {
        println!("📄 Output written to {}", path);
    }
    Ok(())
}
