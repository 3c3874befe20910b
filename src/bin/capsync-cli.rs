use anyhow::{Context, Result, bail};
use clap::Parser;

use std::fs;
use std::io::{self, BufWriter, Read};

use capsync::classify::TranscriptFormat;
use capsync::convert::WrapOptions;
use capsync::engine::CaptionEngine;
use capsync::logging;
use capsync::opts::Opts;

fn main() -> Result<()> {
    logging::init();
    let params = Params::parse();

    let text = match params.input.as_deref() {
        Some("-") | None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read transcript from stdin")?;
            buf
        }
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read transcript from '{path}'"))?,
    };

    let engine = CaptionEngine::new(Opts {
        wrap: WrapOptions {
            max_lines: params.max_lines,
            max_cols: params.max_cols,
        },
        ..Opts::default()
    });

    let Some(transcript) = engine.ingest(params.content_type.as_deref(), &text) else {
        bail!("input is not a recognizable transcript (tried content type, then sniffing)");
    };

    let stdout = io::stdout();
    let writer = BufWriter::new(stdout.lock());
    engine.write_as(&transcript, params.output_type, writer)?;

    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "capsync")]
#[command(about = "Convert podcast transcripts between SubRip, WebVTT, and JSON segments")]
struct Params {
    /// Input file, or `-` (the default) for stdin.
    #[arg(short = 'i', long = "input")]
    pub input: Option<String>,

    /// Declared content type; sniffing is used when omitted.
    #[arg(short = 'c', long = "content-type")]
    pub content_type: Option<String>,

    #[arg(
        short = 'o',
        long = "output-type",
        value_enum,
        default_value_t = TranscriptFormat::WebVtt
    )]
    pub output_type: TranscriptFormat,

    /// Maximum rendered lines per cue when merging segments.
    #[arg(long = "max-lines", default_value_t = 2)]
    pub max_lines: usize,

    /// Maximum characters per rendered line when merging segments.
    #[arg(long = "max-cols", default_value_t = 32)]
    pub max_cols: usize,
}
