// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Generate a web bundle (`.webbundle`) file from a single resource.

use std::fs;

use anyhow::Context as _;
use clap::Parser;
use url::Url;
use webexchange::ResponseHeader;
use webexchange_bundle::{Bundle, Exchange};

#[derive(Parser)]
#[command(about = "Generate a web bundle file")]
struct Args {
    /// The URI of the resource represented in the exchange.
    #[arg(long, default_value = "https://example.com/index.html")]
    uri: Url,

    /// Source file to be used as the exchange payload.
    #[arg(long, default_value = "index.html")]
    content: String,

    /// Content-Type of the response.
    #[arg(long, default_value = "text/html; charset=utf-8")]
    content_type: String,

    /// Webbundle output file.
    #[arg(long, short = 'o', default_value = "out.webbundle")]
    output: String,
}

fn run(args: Args) -> anyhow::Result<()> {
    let payload = fs::read(&args.content)
        .with_context(|| format!("failed to read content from {:?}", args.content))?;

    let exchange = Exchange::new(
        args.uri,
        Vec::new(),
        200,
        vec![ResponseHeader::new("Content-Type", args.content_type)],
        payload,
    )?;

    let bundle = Bundle::new(vec![exchange]);
    let out = fs::File::create(&args.output)
        .with_context(|| format!("failed to open output file {:?}", args.output))?;
    let written = bundle.write_to(out).context("failed to write bundle")?;
    println!("wrote {written} bytes to {}", args.output);
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();
    if let Err(e) = run(Args::parse()) {
        eprintln!("gen-bundle: {e:#}");
        std::process::exit(1);
    }
}
