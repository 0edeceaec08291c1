use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "storyreel", version)]
struct Cli {
    /// More log output (`-v` debug, `-vv` trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a project into a narrated MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Print the frame schedule of a project as JSON without generating anything.
    Plan(PlanArgs),
    /// Generate only the character reference image.
    Reference(ReferenceArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path (overrides the project's `output.video`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Working directory for frames and intermediates (overrides `output.work_dir`).
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Frames per second (overrides the project's `fps`).
    #[arg(long)]
    fps: Option<u32>,

    /// Image backend (overrides the project's `synthesizer`).
    #[arg(long, value_enum)]
    backend: Option<BackendChoice>,

    /// Base URL of the HTTP image API; required with `--backend http`.
    #[arg(long)]
    endpoint: Option<String>,

    /// Skip narration and keep the silent video as the final artifact.
    #[arg(long, default_value_t = false)]
    no_narration: bool,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frames per second (overrides the project's `fps`).
    #[arg(long)]
    fps: Option<u32>,
}

#[derive(Parser, Debug)]
struct ReferenceArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Image backend (overrides the project's `synthesizer`).
    #[arg(long, value_enum)]
    backend: Option<BackendChoice>,

    /// Base URL of the HTTP image API; required with `--backend http`.
    #[arg(long)]
    endpoint: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Procedural,
    Http,
}

#[derive(serde::Serialize)]
struct PlanReport<'a> {
    fps: u32,
    total_frames: u64,
    duration_secs: f64,
    timeline: &'a [storyreel::TimelineEntry],
    frames: &'a [storyreel::PlannedFrame],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Plan(args) => cmd_plan(args),
        Command::Reference(args) => cmd_reference(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_backend(
    current: &storyreel::SynthesizerConfig,
    choice: Option<BackendChoice>,
    endpoint: Option<String>,
) -> anyhow::Result<storyreel::SynthesizerConfig> {
    Ok(match (choice, endpoint) {
        (None, None) => current.clone(),
        (Some(BackendChoice::Procedural), _) => storyreel::SynthesizerConfig::Procedural,
        (Some(BackendChoice::Http) | None, Some(endpoint)) => {
            storyreel::SynthesizerConfig::http(endpoint)
        }
        (Some(BackendChoice::Http), None) => match current {
            storyreel::SynthesizerConfig::Http { .. } => current.clone(),
            storyreel::SynthesizerConfig::Procedural => {
                anyhow::bail!("--backend http needs --endpoint")
            }
        },
    })
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut project = storyreel::Project::load(&args.in_path)?;
    if let Some(out) = args.out {
        project.output.video = out;
    }
    if let Some(dir) = args.work_dir {
        project.output.work_dir = dir;
    }
    if let Some(fps) = args.fps {
        project.fps = storyreel::Fps::new(fps)?;
    }
    project.synthesizer = resolve_backend(&project.synthesizer, args.backend, args.endpoint)?;

    let mut session = storyreel::ReelSession::new(project).with_progress(|p| {
        if p.failed {
            tracing::warn!(
                scene = p.tag.scene,
                position = p.tag.position,
                "frame {}/{} failed",
                p.completed,
                p.total
            );
        } else {
            tracing::info!(
                scene = p.tag.scene,
                position = p.tag.position,
                "frame {}/{}",
                p.completed,
                p.total
            );
        }
    });
    if args.no_narration {
        session = session.without_narration();
    }

    let report = session.run()?;
    for failure in &report.failures {
        eprintln!(
            "frame failed: scene {} position {} strength {:.3}: {}",
            failure.tag.scene,
            failure.tag.position,
            failure.strength.get(),
            failure.message
        );
    }
    report_stage("frames", &report.frames_dir);
    report_stage("silent video", &report.silent_video);
    report_stage("narration", &report.narration);
    report_stage("final video", &report.final_video);

    match report.final_artifact() {
        Some(path) => {
            eprintln!("wrote {}", path.display());
            Ok(())
        }
        None => anyhow::bail!("no video was produced"),
    }
}

fn report_stage(name: &str, stage: &storyreel::StageOutcome<PathBuf>) {
    match stage {
        storyreel::StageOutcome::Done(path) => eprintln!("{name}: {}", path.display()),
        storyreel::StageOutcome::Skipped(why) => eprintln!("{name}: skipped ({why})"),
        storyreel::StageOutcome::Failed(why) => eprintln!("{name}: FAILED ({why})"),
    }
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let mut project = storyreel::Project::load(&args.in_path)?;
    if let Some(fps) = args.fps {
        project.fps = storyreel::Fps::new(fps)?;
    }
    let frames = storyreel::plan(&project.scenes, project.fps, &project.naming()?)?;
    let timeline =
        storyreel::Timeline::from_counts(project.fps, project.scenes.frame_counts(project.fps));

    let report = PlanReport {
        fps: project.fps.get(),
        total_frames: timeline.total_frames(),
        duration_secs: timeline.duration_secs(),
        timeline: timeline.entries(),
        frames: &frames,
    };
    let json = serde_json::to_string_pretty(&report).context("serialize plan")?;
    println!("{json}");
    Ok(())
}

fn cmd_reference(args: ReferenceArgs) -> anyhow::Result<()> {
    let mut project = storyreel::Project::load(&args.in_path)?;
    project.synthesizer = resolve_backend(&project.synthesizer, args.backend, args.endpoint)?;

    let mut synth = storyreel::create_synthesizer(&project.synthesizer)?;
    let identity = storyreel::build_identity(&project, synth.as_mut())?;
    identity.save_reference(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
