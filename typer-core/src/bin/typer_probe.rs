// typer-core/src/bin/typer_probe.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use typer_core::layout::{FrameLayout, Viewport};
use typer_core::services::{FadeEffect, MonospaceMeasurer, Services, TypingSound};
use typer_core::{Typer, TyperConfig, TyperEvent, UpdateCause};

#[derive(Parser)]
#[command(name = "typer_probe", about = "Run text through the typewriter engine in a terminal")]
struct Args {
    /// Log state transitions (DEBUG level)
    #[arg(short)]
    verbose: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Text to type. A literal `\n` breaks the line.
    text: Vec<String>,
}

/// Stands in for the typing sound.
struct Click;

impl TypingSound for Click {
    fn play(&self) {
        tracing::trace!("click");
    }
}

/// Nothing to fade in a terminal, so just take the time.
struct SleepFade;

#[async_trait]
impl FadeEffect for SleepFade {
    async fn fade_out(&self, duration: Duration) -> Result<()> {
        tracing::info!("Fading out over {:?}", duration);
        tokio::time::sleep(duration).await;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => {
            let doc = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            TyperConfig::from_json(&doc)?
        }
        None => TyperConfig {
            caret: "_".to_string(),
            ..TyperConfig::default()
        },
    };

    // Literal "\n" in an argument breaks the line, so multi-line text fits in a shell.
    let text = if args.text.is_empty() {
        "Hello, World!".to_string()
    } else {
        args.text.join(" ").replace("\\n", "\n")
    };

    let measurer = Arc::new(MonospaceMeasurer::default());
    let services = Services::new(measurer.clone())
        .with_sound(Arc::new(Click))
        .with_fade(Arc::new(SleepFade));

    let (typer, mut rx) = Typer::new(config.clone(), services)?;
    typer.init(&text).context("Typer::init failed")?;
    let run = typer.start().context("Typer::start failed")?;

    let viewport = Viewport {
        width: 800.0,
        height: 600.0,
    };
    let mut out = std::io::stdout();
    let mut printed_line = 0;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\n[typer_probe] Ctrl+C received, stopping…");
                typer.stop();
            }

            event = rx.recv() => {
                let Some(event) = event else { break };

                match event {
                    TyperEvent::Updated(frame) => {
                        if !matches!(frame.cause, UpdateCause::Reveal | UpdateCause::Blink) {
                            continue;
                        }

                        let layout = FrameLayout::compute(&frame, &config, measurer.as_ref(), viewport)?;
                        let Some(tail) = layout.lines.last() else { continue };

                        if tail.index != printed_line {
                            writeln!(out)?;
                            printed_line = tail.index;
                        }

                        let caret = match &layout.caret {
                            Some(c) if c.visible => c.glyph.as_str(),
                            _ => " ",
                        };
                        write!(out, "\r\x1b[2K{}{}", tail.text, caret)?;
                        out.flush()?;
                    }
                    TyperEvent::Finished => {
                        writeln!(out)?;
                        eprintln!("[typer_probe] finished");
                        break;
                    }
                }
            }
        }
    }

    run.await.context("Typer run panicked")?;
    Ok(())
}
