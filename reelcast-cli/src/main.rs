use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "reelcast", version)]
struct Cli {
    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Print the resolved timeline as JSON.
    Timeline(TimelineArgs),
    /// Time-stretch and pitch-shift one audio clip into raw stereo `f32le`.
    Audio(AudioArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Override the project frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Skip the narration/music mix.
    #[arg(long, default_value_t = false)]
    no_audio: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Session time in seconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct TimelineArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct AudioArgs {
    /// Input clip (any format `ffmpeg` decodes, or raw stereo 48 kHz `.f32le`).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output raw `f32le` path.
    #[arg(long)]
    out: PathBuf,

    /// Playback speed; the clip gets shorter above 1.
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Pitch shift in semitones.
    #[arg(long, default_value_t = 0.0)]
    pitch: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Timeline(args) => cmd_timeline(args),
        Command::Audio(args) => cmd_audio(args),
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn assets_root(in_path: &Path) -> &Path {
    in_path.parent().unwrap_or_else(|| Path::new("."))
}

fn load_session(in_path: &Path, opts: reelcast::SessionOpts) -> anyhow::Result<reelcast::RenderSession> {
    let project = reelcast::Project::from_path(in_path)?;
    let resolver = reelcast::AssetResolver::new(assets_root(in_path));
    let session = reelcast::RenderSession::new(project, &resolver, opts)?;
    report_issues(session.issues());
    Ok(session)
}

fn report_issues(issues: &[reelcast::AssetIssue]) {
    for issue in issues {
        tracing::warn!(kind = ?issue.kind, url = %issue.url, "{}", issue.message);
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let project = reelcast::Project::from_path(&args.in_path)?;
    let resolver = reelcast::AssetResolver::new(assets_root(&args.in_path));
    let fps = args.fps.map(|n| reelcast::Fps::new(n, 1)).transpose()?;
    let opts = reelcast::ExportOpts {
        enable_audio: !args.no_audio,
        fps,
    };

    let out = reelcast::export_to_file(project, &resolver, &args.out, opts)?;
    report_issues(&out.issues);
    for line in &out.log {
        tracing::debug!("{line}");
    }
    eprintln!(
        "wrote {} ({} frames, {:.2}s, {} bytes)",
        args.out.display(),
        out.frames,
        out.duration_secs,
        out.bytes.len()
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut session = load_session(
        &args.in_path,
        reelcast::SessionOpts {
            enable_audio: false,
            throttle_vfx: false,
            ..reelcast::SessionOpts::default()
        },
    )?;
    let frame = session.render_at(args.time)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_timeline(args: TimelineArgs) -> anyhow::Result<()> {
    let session = load_session(
        &args.in_path,
        reelcast::SessionOpts {
            enable_audio: false,
            ..reelcast::SessionOpts::default()
        },
    )?;
    let json = serde_json::to_string_pretty(session.timeline()).context("serialize timeline")?;
    println!("{json}");
    Ok(())
}

fn cmd_audio(args: AudioArgs) -> anyhow::Result<()> {
    let decoded = reelcast::decode_audio_f32_stereo(&args.in_path, reelcast::MIX_SAMPLE_RATE)?;
    let in_secs = decoded.duration_secs();
    let stretched = reelcast::stretch_audio(decoded, args.speed);
    let shifted = reelcast::shift_pitch(stretched, args.pitch);
    reelcast::write_mix_to_f32le_file(&shifted.samples, &args.out)?;
    eprintln!(
        "wrote {} ({:.3}s -> {:.3}s, {} Hz, {} ch)",
        args.out.display(),
        in_secs,
        shifted.duration_secs(),
        shifted.sample_rate,
        shifted.channels
    );
    Ok(())
}
