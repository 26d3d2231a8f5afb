mod cli;

use supsync::batch::{self, discovery, BatchOptions, BatchRunner};
use supsync::config;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use supsync_common::Timestamp;
use supsync_pgs::{Event, FrameRate, SegmentStream, SegmentSummary};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "supsync=trace,supsync_pgs=debug,supsync_av=debug".to_string()
        } else {
            "supsync=info,supsync_pgs=info,supsync_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sync {
            dir,
            audio,
            max_workers,
            keep_temp,
            json,
        } => sync_dir(
            &dir,
            audio.as_deref(),
            max_workers,
            keep_temp,
            json,
            cli.config.as_deref(),
        ),
        Commands::Inspect { file, events, json } => inspect_file(&file, events, json),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("supsync {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn sync_dir(
    dir: &Path,
    audio: Option<&Path>,
    max_workers: Option<usize>,
    keep_temp: bool,
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    if let Some(workers) = max_workers {
        config.sync.workers = workers;
    }
    if keep_temp {
        config.sync.keep_temp = true;
    }
    config::validate_config(&config)?;

    let dir = dir
        .canonicalize()
        .with_context(|| format!("Input directory does not exist: {:?}", dir))?;
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {:?}", dir);
    }

    let files = discovery::list_sup_files(&dir)
        .with_context(|| format!("Failed to list {:?}", dir))?;
    if files.is_empty() {
        println!("No .sup files found in {}", dir.display());
        return Ok(());
    }

    let reference = match audio {
        Some(path) => path.to_path_buf(),
        None => {
            let search = discovery::reference_search_dir(&dir);
            discovery::find_reference_media(search, &config.reference.extensions)
                .with_context(|| format!("No reference audio found in {:?}", search))?
        }
    };
    tracing::info!("Using reference {:?}", reference);

    let program = supsync_av::get_tool_path(&config.backend.program)
        .context("Aligner not available (see `supsync check-tools`)")?;
    tracing::debug!("Aligner: {:?}", program);

    let mut backend_config = config.clone();
    backend_config.backend.program = program;
    let runner = BatchRunner::new(
        BatchOptions::from_config(&config),
        Arc::new(batch::backend_from_config(&backend_config)),
    );
    let stop = runner.stop_signal();

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing files already in progress");
                stop.store(true, Ordering::Relaxed);
            }
        });
        runner.run(&dir, files, &reference).await
    })?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        report.write_text(&mut std::io::stdout().lock())?;
    }

    if let Some(ref err) = report.restore_error {
        anyhow::bail!("{}", err);
    }
    if report.has_failures() {
        anyhow::bail!(
            "{} of {} files failed",
            report.count(batch::FileStatus::Failed),
            report.files.len()
        );
    }

    Ok(())
}

#[derive(Serialize)]
struct EpochSummary {
    first_segment: usize,
    last_segment: usize,
    display_sets: usize,
    earliest: Option<Timestamp>,
}

#[derive(Serialize)]
struct InspectOutput {
    file: PathBuf,
    source_len: usize,
    gap_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame_rate: Option<FrameRate>,
    segments: Vec<SegmentSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    events: Option<Vec<Event>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    epochs: Option<Vec<EpochSummary>>,
}

fn inspect_file(file: &Path, with_events: bool, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let data = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
    let stream = SegmentStream::parse(data)
        .with_context(|| format!("Failed to parse {:?}", file))?;

    let (events, epochs) = if with_events {
        let segments = stream.segments();
        let epochs = supsync_pgs::epoch::epochs(segments)
            .iter()
            .map(|epoch| {
                let range = epoch.range();
                EpochSummary {
                    first_segment: range.start,
                    last_segment: range.end.saturating_sub(1),
                    display_sets: epoch.display_sets.len(),
                    earliest: epoch.earliest_timestamp(segments),
                }
            })
            .collect();
        (Some(supsync_pgs::extract(segments)), Some(epochs))
    } else {
        (None, None)
    };

    let output = InspectOutput {
        file: file.to_path_buf(),
        source_len: stream.source_len(),
        gap_bytes: stream.gap_len(),
        frame_rate: stream.nominal_frame_rate(),
        segments: stream.describe(),
        events,
        epochs,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("File: {}", output.file.display());
    println!("Size: {} bytes", output.source_len);
    if output.gap_bytes > 0 {
        println!("Unparsed bytes: {}", output.gap_bytes);
    }
    match output.frame_rate {
        Some(rate) => println!("Frame rate: {} fps", rate),
        None => println!("Frame rate: unknown"),
    }

    println!("\nSegments: {}", output.segments.len());
    for seg in &output.segments {
        print!(
            "  [{:>4}] {} pts {} dts {} @{} ({} bytes)",
            seg.index, seg.kind, seg.pts, seg.dts, seg.offset, seg.payload_len
        );
        if let Some(rate) = seg.frame_rate {
            print!(" {} fps", rate);
        }
        println!();
    }

    if let Some(ref events) = output.events {
        println!("\nEvents: {}", events.len());
        for (i, event) in events.iter().enumerate() {
            println!(
                "  {:>4}. {} --> {} (segments {}..{}, {})",
                i + 1,
                event.start,
                event.end,
                event.start_index,
                event.end_index,
                event.rule
            );
        }
    }

    if let Some(ref epochs) = output.epochs {
        println!("\nEpochs: {}", epochs.len());
        for (i, epoch) in epochs.iter().enumerate() {
            print!(
                "  [{}] segments {}..={}, {} display sets",
                i, epoch.first_segment, epoch.last_segment, epoch.display_sets
            );
            if let Some(ts) = epoch.earliest {
                print!(", from {}", ts);
            }
            println!();
        }
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tool = supsync_av::check_tool(&config.backend.program.to_string_lossy());

    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);
    if let Some(ref version) = tool.version {
        print!(" ({})", version.lines().next().unwrap_or(""));
    }
    if let Some(ref path) = tool.path {
        print!(" - {}", path.display());
    }
    println!();

    println!();
    if tool.available {
        println!("All required tools are available!");
    } else {
        println!("The aligner is missing. Install ffsubsync or set backend.program.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Workers: {}", config.sync.workers);
    println!("  Keep temp: {}", config.sync.keep_temp);
    println!("  Output: {}", config.sync.output_dir.display());
    println!("  Aligner: {}", config.backend.program.display());
    println!("  Timeout: {}s", config.backend.timeout_secs);
    println!("  Reference extensions: {}", config.reference.extensions.join(" "));

    Ok(())
}
