// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Generate a signed exchange (`.htxg`) file.

use std::fs;

use anyhow::Context as _;
use chrono::{Duration, Utc};
use clap::Parser;
use url::Url;
use webexchange::{
    parse_certificates, parse_private_key_pem, write_exchange_file, Input, ResponseHeader, Signer,
};

#[derive(Parser)]
#[command(about = "Generate a signed exchange file")]
struct Args {
    /// The URI of the resource represented in the exchange.
    #[arg(long, default_value = "https://example.com/index.html")]
    uri: Url,

    /// The status of the response represented in the exchange.
    #[arg(long, default_value_t = 200)]
    status: u16,

    /// Source file to be used as the exchange payload.
    #[arg(long, default_value = "index.html")]
    content: String,

    /// Content-Type of the response.
    #[arg(long, default_value = "text/html; charset=utf-8")]
    content_type: String,

    /// Certificate chain PEM file of the origin.
    #[arg(long, default_value = "cert.pem")]
    certificate: String,

    /// The URL where the certificate chain is hosted.
    #[arg(long, default_value = "https://example.com/cert.msg")]
    cert_url: Url,

    /// The URL where signature validity updates are hosted.
    #[arg(long)]
    validity_url: Option<Url>,

    /// Private key PEM file of the origin.
    #[arg(long, default_value = "cert-key.pem")]
    private_key: String,

    /// Signed exchange output file.
    #[arg(long, short = 'o', default_value = "out.htxg")]
    output: String,

    /// The record size of Merkle Integrity Content Encoding.
    #[arg(long, default_value_t = 4096)]
    mi_record_size: usize,
}

fn run(args: Args) -> anyhow::Result<()> {
    let payload = fs::read(&args.content)
        .with_context(|| format!("failed to read content from {:?}", args.content))?;

    let cert_text = fs::read(&args.certificate)
        .with_context(|| format!("failed to read certificate file {:?}", args.certificate))?;
    let certs = parse_certificates(&cert_text)
        .with_context(|| format!("failed to parse certificate file {:?}", args.certificate))?;

    let key_text = fs::read(&args.private_key)
        .with_context(|| format!("failed to read private key file {:?}", args.private_key))?;
    let priv_key = parse_private_key_pem(&key_text)
        .with_context(|| format!("failed to parse private key file {:?}", args.private_key))?;

    let mut input = Input::new(
        args.uri,
        args.status,
        vec![ResponseHeader::new("Content-Type", args.content_type)],
        payload,
        args.mi_record_size,
    )?;
    input.add_signed_headers_header(&["content-type", "content-encoding", "mi"]);

    let date = Utc::now();
    let mut signer = Signer {
        date,
        expires: date + Duration::hours(1),
        certs,
        cert_url: args.cert_url,
        validity_url: args.validity_url,
        priv_key,
        rng: rand::rngs::OsRng,
    };
    let signature = signer
        .signature_header_value(&input)
        .context("failed to compute Signature header value")?;
    input
        .response_headers
        .push(ResponseHeader::new("Signature", signature));

    let mut out = fs::File::create(&args.output)
        .with_context(|| format!("failed to open output file {:?}", args.output))?;
    write_exchange_file(&mut out, &input).context("failed to write exchange")?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();
    if let Err(e) = run(Args::parse()) {
        eprintln!("gen-signedexchange: {e:#}");
        std::process::exit(1);
    }
}
