// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Dump a web bundle's sections and index entries.

use std::fs;

use anyhow::Context as _;
use clap::Parser;
use webexchange_bundle::{load_metadata, read_response};
use webexchange_cbor::Decoder;

#[derive(Parser)]
#[command(about = "Dump web bundle metadata")]
struct Args {
    /// Webbundle input file.
    #[arg(long, short = 'i', default_value = "in.webbundle")]
    input: String,
}

/// Pull the `:url` value out of a canonical request map for display.
fn request_url(request_key: &[u8]) -> Option<String> {
    let mut dec = Decoder::new(request_key);
    let n = dec.decode_map_header().ok()?;
    for _ in 0..n {
        let key = dec.decode_byte_string().ok()?;
        let value = dec.decode_byte_string().ok()?;
        if key == b":url" {
            return Some(String::from_utf8_lossy(value).into_owned());
        }
    }
    None
}

fn run(args: Args) -> anyhow::Result<()> {
    let bytes = fs::read(&args.input)
        .with_context(|| format!("failed to open input file {:?}", args.input))?;
    let metadata = load_metadata(&bytes).context("failed to load bundle metadata")?;

    println!("sections (start at byte {}):", metadata.sections_start);
    for section in &metadata.section_offsets {
        println!(
            "  {:<10} offset {:>8} length {:>8}",
            section.name, section.offset, section.length
        );
    }

    println!("index entries: {}", metadata.index.len());
    for entry in &metadata.index {
        let url = request_url(&entry.request_key).unwrap_or_else(|| "<no :url>".to_string());
        let response = read_response(&bytes, &metadata, entry)
            .with_context(|| format!("failed to read response for {url}"))?;
        println!(
            "  {url}: {} header(s), {} payload byte(s) at {}+{}",
            response.headers.len(),
            response.payload.len(),
            entry.offset,
            entry.length
        );
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();
    if let Err(e) = run(Args::parse()) {
        eprintln!("dump-bundle: {e:#}");
        std::process::exit(1);
    }
}
