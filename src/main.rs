use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use anyhow::{Context, Result};

use vidforge::cli::{self, Commands};
use vidforge::config::Config;
use vidforge::engine::{self, FfmpegRunner, HardwareAvailability, PreviewPipeline, probe};
use vidforge::events::{Event, Level, Reporter};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::parse();

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            input,
            output,
            encoder,
        } => run_batch_command(input, output, encoder, false),

        Commands::DryRun {
            input,
            output,
            encoder,
        } => run_batch_command(input, output, encoder, true),

        Commands::Scan { directory } => scan_command(directory),

        Commands::Probe { file } => {
            let duration = probe::probe_duration(&file)?;
            let report = serde_json::json!({
                "file": file.display().to_string(),
                "duration_seconds": duration,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }

        Commands::Preview { file, out_dir } => preview_command(file, out_dir),

        Commands::CheckFfmpeg => {
            println!("{}", probe::ffmpeg_version()?);
            println!("{}", probe::ffprobe_version()?);
            let hw = HardwareAvailability::default();
            println!(
                "hevc_nvenc: {}",
                if hw.hevc_nvenc { "available" } else { "not available" }
            );
            println!(
                "av1_nvenc:  {}",
                if hw.av1_nvenc { "available" } else { "not available" }
            );
            Ok(())
        }

        Commands::InitConfig => {
            let path = Config::config_path()?;
            if path.exists() {
                println!("Config already exists: {}", path.display());
            } else {
                Config::default().save()?;
                println!("Wrote default config: {}", path.display());
            }
            Ok(())
        }
    }
}

fn load_config(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    encoder: Option<String>,
) -> Result<Config> {
    let mut config = Config::load()?;

    if let Some(input) = input {
        config.paths.input_dir = input.display().to_string();
    }
    if let Some(output) = output {
        config.paths.output_dir = output.display().to_string();
    }
    if let Some(encoder) = encoder {
        config.encoder.active = encoder;
    }

    if config.paths.input_dir.is_empty() {
        anyhow::bail!("No input folder configured (set paths.input_dir or pass --input)");
    }
    if config.paths.output_dir.is_empty() {
        anyhow::bail!("No output folder configured (set paths.output_dir or pass --output)");
    }

    Ok(config)
}

fn run_batch_command(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    encoder: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let config = load_config(input, output, encoder)?;
    let options = config.batch_options();
    let requested = config.requested_profile()?;

    let mut items = engine::scan_items(&options.input_dir, config.default_adjustments())?;
    if items.is_empty() {
        println!("No videos found in {}", options.input_dir.display());
        return Ok(());
    }

    if dry_run {
        return dry_run_command(&config, &items);
    }

    // Environment check up front: a missing encoder binary means the batch
    // never starts.
    probe::ffmpeg_version().context("encoder not found, check installation")?;

    let (reporter, rx) = Reporter::channel();
    let printer = thread::spawn(move || {
        for event in rx {
            print_event(&event);
        }
    });

    if config.upload.enabled {
        reporter.warning(
            "Upload is enabled but no video platform client is wired to the CLI; skipping uploads",
        );
    }

    let runner = FfmpegRunner::default();
    let report = engine::run_batch(
        &mut items,
        &requested,
        &config.encoder.cpu,
        &options,
        &HardwareAvailability::default(),
        &runner,
        None,
        &reporter,
    );

    drop(reporter);
    let _ = printer.join();

    let report = report?;
    println!(
        "Done: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(())
}

fn scan_command(directory: Option<PathBuf>) -> Result<()> {
    let config = Config::load()?;
    let root = directory.unwrap_or_else(|| PathBuf::from(&config.paths.input_dir));
    if root.as_os_str().is_empty() {
        anyhow::bail!("No folder given and no input folder configured");
    }

    let items = engine::scan_items(&root, config.default_adjustments())?;
    for item in &items {
        println!("{}", item.name());
    }
    println!("{} video(s)", items.len());
    Ok(())
}

fn dry_run_command(config: &Config, items: &[engine::VideoItem]) -> Result<()> {
    let options = config.batch_options();
    let requested = config.requested_profile()?;
    let (reporter, rx) = Reporter::channel();

    let resolved = engine::resolve_profile(
        &requested,
        &config.encoder.cpu,
        &HardwareAvailability::default(),
        &reporter,
    );
    drop(reporter);
    for event in rx {
        print_event(&event);
    }

    let codec_args = engine::build_codec_args(&resolved.profile)
        .map_err(|errs| anyhow::anyhow!("invalid profile: {:?}", errs))?;

    for item in items.iter().filter(|i| i.selected) {
        let filters = engine::build_filter_chain(&item.adjustments(), options.filters);
        let args = engine::build_encode_args(
            item.path(),
            &options.output_dir.join(item.name()),
            &filters,
            &codec_args,
            &options.extra_args,
        );
        println!("ffmpeg {}", args.join(" "));
    }

    Ok(())
}

fn preview_command(file: PathBuf, out_dir: PathBuf) -> Result<()> {
    let config = Config::load()?;
    let pipeline = PreviewPipeline::new("ffmpeg");
    let adjustments = config.default_adjustments();

    let (before40, before60) = pipeline.extract_before_frames(&file);
    let (after40, after60) = pipeline.regenerate_after_frames(&file, &adjustments);

    std::fs::create_dir_all(&out_dir)?;
    let mut written = 0usize;
    for (label, frame) in [
        ("before_40", before40),
        ("before_60", before60),
        ("after_40", after40),
        ("after_60", after60),
    ] {
        if let Some(bytes) = frame {
            let path = out_dir.join(format!("{}.jpg", label));
            std::fs::write(&path, bytes)?;
            println!("{}", path.display());
            written += 1;
        }
    }

    if written == 0 {
        println!("No frames could be extracted (is the file a readable video?)");
    }
    Ok(())
}

fn print_event(event: &Event) {
    match event {
        Event::Log { level, message } => {
            let tag = match level {
                Level::Info => "info",
                Level::Success => " ok ",
                Level::Warning => "warn",
                Level::Error => "fail",
            };
            println!("[{}] {}", tag, message);
        }
        Event::Progress { .. } => {
            // Progress log lines already arrive as throttled Log events
        }
        Event::ItemStarted { index, total, name } => {
            println!("[info] ({}/{}) {}", index, total, name);
        }
        Event::ItemSucceeded { .. } | Event::ItemFailed { .. } => {}
        Event::BatchFinished { succeeded, failed } => {
            println!("[info] Batch finished: {} succeeded, {} failed", succeeded, failed);
        }
    }
}
