use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "revlapse", version, about = "Animate the revision history of a document")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the history, render one digest per revision and write the animation.
    ///
    /// WARNING: revisions are checked out with `--force`; uncommitted changes in the
    /// repository are lost.
    Run(RunArgs),
    /// Render one PDF to a digest PNG without touching any repository.
    Digest(DigestArgs),
    /// List the revisions a run would visit, oldest first.
    Revisions(RevisionsArgs),
}

#[derive(Args, Debug, Default)]
struct LayoutArgs {
    /// Canvas width in pixels (minimum 100).
    #[arg(long)]
    frame_width: Option<u32>,

    /// Canvas height in pixels (minimum 100).
    #[arg(long)]
    frame_height: Option<u32>,

    /// Page thumbnail width in pixels (minimum 10).
    #[arg(long)]
    page_width: Option<u32>,

    /// Page thumbnail height in pixels (minimum 10).
    #[arg(long)]
    page_height: Option<u32>,

    /// First page to include (1-based).
    #[arg(long)]
    first_page: Option<u32>,

    /// Last page to include (1-based, inclusive).
    #[arg(long)]
    last_page: Option<u32>,
}

impl LayoutArgs {
    fn canvas(&self, base: revlapse::Dimensions) -> revlapse::Dimensions {
        revlapse::Dimensions::canvas(
            self.frame_width.unwrap_or(base.width),
            self.frame_height.unwrap_or(base.height),
        )
    }

    fn page(&self, base: revlapse::Dimensions) -> revlapse::Dimensions {
        revlapse::Dimensions::page(
            self.page_width.unwrap_or(base.width),
            self.page_height.unwrap_or(base.height),
        )
    }

    fn pages(&self, base: revlapse::PageRange) -> revlapse::PageRange {
        revlapse::PageRange {
            first: self.first_page.or(base.first),
            last: self.last_page.or(base.last),
        }
    }
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// JSON configuration; flags given on the command line override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Working tree whose history is animated.
    #[arg(long)]
    repository: Option<PathBuf>,

    /// PDF produced by the build command.
    #[arg(long)]
    artifact: Option<PathBuf>,

    /// Run the build command in this directory of the repository.
    #[arg(long)]
    subdirectory: Option<PathBuf>,

    /// Directory for the `<n>_digest.png` images.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Animation output (`.mp4` for MP4, anything else for GIF).
    #[arg(long)]
    animation: Option<PathBuf>,

    #[command(flatten)]
    layout: LayoutArgs,

    /// First revision to process (full or abbreviated id, branch, tag).
    #[arg(long)]
    start_revision: Option<String>,

    /// Last revision to process, inclusive.
    #[arg(long)]
    end_revision: Option<String>,

    /// Kill the build after this many seconds.
    #[arg(long)]
    build_timeout_secs: Option<u64>,

    /// What to do when the build fails.
    #[arg(long, value_enum)]
    on_build_failure: Option<FailureChoice>,

    /// Write a JSON run report here.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Build command and its arguments, e.g. `-- latexmk -pdf paper.tex`.
    #[arg(last = true)]
    command: Vec<String>,
}

#[derive(Parser, Debug)]
struct DigestArgs {
    /// PDF to render.
    #[arg(long)]
    pdf: PathBuf,

    /// Output name prefix; the image is written to `<prefix>_digest.png`.
    #[arg(long, default_value = "document")]
    prefix: String,

    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    #[command(flatten)]
    layout: LayoutArgs,
}

#[derive(Parser, Debug)]
struct RevisionsArgs {
    #[arg(long)]
    repository: PathBuf,

    #[arg(long)]
    start_revision: Option<String>,

    #[arg(long)]
    end_revision: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FailureChoice {
    Continue,
    Skip,
    Abort,
}

impl From<FailureChoice> for revlapse::BuildFailurePolicy {
    fn from(c: FailureChoice) -> Self {
        match c {
            FailureChoice::Continue => Self::Continue,
            FailureChoice::Skip => Self::Skip,
            FailureChoice::Abort => Self::Abort,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    revlapse::init_logging(&revlapse::LoggingConfig::from_flags(cli.verbose, cli.log_json));
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Digest(args) => cmd_digest(args),
        Command::Revisions(args) => cmd_revisions(args),
    }
}

fn load_config(args: RunArgs) -> anyhow::Result<revlapse::LapseConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let mut cfg = revlapse::LapseConfig::from_path(path)?;
            if !args.command.is_empty() {
                cfg.build_command = revlapse::BuildCommand::from_argv(args.command)?;
            }
            if let Some(repo) = args.repository {
                cfg.repository = repo;
            }
            if let Some(artifact) = args.artifact {
                cfg.artifact = artifact;
            }
            cfg
        }
        None => {
            let repository = args
                .repository
                .context("--repository is required without --config")?;
            let artifact = args
                .artifact
                .context("--artifact is required without --config")?;
            let command = revlapse::BuildCommand::from_argv(args.command)
                .context("a build command is required after `--`")?;
            revlapse::LapseConfig::new(repository, command, artifact)
        }
    };

    if args.subdirectory.is_some() {
        cfg.subdirectory = args.subdirectory;
    }
    if let Some(dir) = args.output_dir {
        cfg.output_dir = dir;
    }
    if args.animation.is_some() {
        cfg.animation = args.animation;
    }
    cfg.canvas = args.layout.canvas(cfg.canvas);
    cfg.page = args.layout.page(cfg.page);
    cfg.pages = args.layout.pages(cfg.pages);
    if args.start_revision.is_some() {
        cfg.start_revision = args.start_revision;
    }
    if args.end_revision.is_some() {
        cfg.end_revision = args.end_revision;
    }
    if args.build_timeout_secs.is_some() {
        cfg.build_timeout_secs = args.build_timeout_secs;
    }
    if let Some(policy) = args.on_build_failure {
        cfg.on_build_failure = policy.into();
    }
    Ok(cfg.normalized())
}

/// Expand user-supplied bounds to the full ids the revision list uses. Anything git cannot
/// resolve is kept verbatim and matched exactly.
fn resolve_bound(repo: &revlapse::GitRepository, bound: Option<String>) -> Option<String> {
    bound.map(|name| match repo.resolve(&name) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!(revision = %name, error = %e, "could not resolve revision; using it verbatim");
            name
        }
    })
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let report_path = args.report.clone();
    let mut cfg = load_config(args)?;
    cfg.validate()?;

    if revlapse::GitRepository::is_git_on_path() {
        let repo = revlapse::GitRepository::open(&cfg.repository)?;
        cfg.start_revision = resolve_bound(&repo, cfg.start_revision.take());
        cfg.end_revision = resolve_bound(&repo, cfg.end_revision.take());
    }

    let mut pipeline = revlapse::Pipeline::from_config(&cfg)?;
    let report = pipeline.run(&cfg.run_opts())?;

    if let Some(path) = report_path {
        report.write_json(&path)?;
        eprintln!("wrote report {}", path.display());
    }
    eprintln!("{}", report.summary());
    Ok(())
}

fn cmd_digest(args: DigestArgs) -> anyhow::Result<()> {
    let defaults = revlapse::RenderSettings::default();
    let settings = revlapse::RenderSettings {
        canvas: args.layout.canvas(defaults.canvas),
        page: args.layout.page(defaults.page),
        pages: args.layout.pages(defaults.pages),
        output_dir: args.output_dir,
    };
    if !revlapse::PopplerRasterizer::is_available() {
        anyhow::bail!("pdfinfo and pdftoppm (poppler) are required but were not found on PATH");
    }

    let renderer =
        revlapse::DocumentRenderer::new(settings, Box::new(revlapse::PopplerRasterizer::new()))?;
    let digest = renderer
        .render(&args.pdf, &args.prefix)
        .with_context(|| format!("render '{}'", args.pdf.display()))?;

    eprintln!("wrote {}", digest.path.display());
    Ok(())
}

fn cmd_revisions(args: RevisionsArgs) -> anyhow::Result<()> {
    use revlapse::RevisionSource as _;

    let repo = revlapse::GitRepository::open(&args.repository)?;
    let start = resolve_bound(&repo, args.start_revision);
    let end = resolve_bound(&repo, args.end_revision);

    let planned = revlapse::plan_revisions(repo.revisions()?, start.as_deref(), end.as_deref());
    for (n, rev) in planned.iter().enumerate() {
        println!("{}\t{rev}", n + 1);
    }
    eprintln!("{} revision(s)", planned.len());
    Ok(())
}
