use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pola_caption_core::{
    app_paths, load_config_from, run, save_config_to, validate_dest, AnnotationGeometry, AppConfig,
    Annotator, CaptionFormat, DryRun, ImageMagick, RunOptions, RunSummary,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pola-caption", version)]
#[command(about = "Stamps the capture date found in each file name onto a copy of the image")]
struct Cli {
    /// Config file to read instead of the per-user one
    #[arg(long, global = true)]
    config_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
    #[command(flatten)]
    annotate: AnnotateArgs,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect or create the config file
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    Init,
}

#[derive(Debug, Args)]
struct AnnotateArgs {
    /// Source directory to scan for images
    #[arg(long, default_value = ".")]
    src: PathBuf,
    /// Destination directory name, created inside every scanned directory
    #[arg(long)]
    dest: Option<PathBuf>,
    /// Extensions to accept; a file's extension must appear in this string
    #[arg(long)]
    ext: Option<String>,
    /// Location shown before the date for files at the top level
    #[arg(long)]
    location: Option<String>,
    /// Caption template, first %v is the location and second the date
    #[arg(long)]
    format: Option<String>,
    /// Caption size in points
    #[arg(long)]
    text_size: Option<i32>,
    /// Margin used to adjust vertical centring, in pixels
    #[arg(long, allow_negative_numbers = true)]
    bottom_margin: Option<i32>,
    /// Font used to draw the caption
    #[arg(long)]
    font: Option<String>,
    /// Annotate several images at once
    #[arg(long, alias = "use-goroutine", default_value_t = false)]
    parallel: bool,
    /// Annotate one image at a time even if the config enables parallel mode
    #[arg(long, default_value_t = false, conflicts_with = "parallel")]
    no_parallel: bool,
    /// Upper bound on images annotated at once in parallel mode
    #[arg(long, alias = "max-goroutines")]
    max_workers: Option<usize>,
    /// ImageMagick convert executable
    #[arg(long)]
    convert_bin: Option<PathBuf>,
    /// Log what would be annotated without running convert
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Print the run summary as JSON on stdout
    #[arg(long, default_value_t = false)]
    json: bool,
    #[arg(short, long, default_value_t = false, conflicts_with = "quiet")]
    verbose: bool,
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.annotate.verbose, cli.annotate.quiet);

    let config_path = match cli.config_file {
        Some(path) => path,
        None => app_paths()?.config_path,
    };

    match cli.command {
        Some(Commands::Config(config)) => match config.action {
            ConfigAction::Show => cmd_config_show(&config_path),
            ConfigAction::Init => cmd_config_init(&config_path),
        },
        None => cmd_annotate(cli.annotate, &config_path),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn cmd_annotate(args: AnnotateArgs, config_path: &std::path::Path) -> Result<()> {
    let config = load_config_from(config_path)?;
    let options = build_options(&args, &config)?;

    debug!(
        geometry = %AnnotationGeometry::compute(options.text_size, options.bottom_margin),
        parallel = options.parallel,
        "resolved options"
    );

    let magick = ImageMagick::new(
        args.convert_bin
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.convert_bin)),
    );
    let annotator: &dyn Annotator = if options.dry_run { &DryRun } else { &magick };

    let summary = run(&options, annotator)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, options.dry_run);
    }
    Ok(())
}

fn build_options(args: &AnnotateArgs, config: &AppConfig) -> Result<RunOptions> {
    let format_source = args.format.as_deref().unwrap_or(&config.format);
    let format = CaptionFormat::parse(format_source)
        .with_context(|| format!("invalid --format value: {format_source:?}"))?;

    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.dest));
    validate_dest(&dest).context("invalid --dest value")?;

    Ok(RunOptions {
        src: args.src.clone(),
        dest,
        extensions: args.ext.clone().unwrap_or_else(|| config.ext.clone()),
        location: args.location.clone().or_else(|| config.location.clone()),
        format,
        text_size: args.text_size.unwrap_or(config.text_size),
        bottom_margin: args.bottom_margin.unwrap_or(config.bottom_margin),
        font: args.font.clone().unwrap_or_else(|| config.font.clone()),
        parallel: !args.no_parallel && (args.parallel || config.parallel),
        max_workers: args.max_workers.unwrap_or(config.max_workers),
        dry_run: args.dry_run,
    })
}

fn cmd_config_show(config_path: &std::path::Path) -> Result<()> {
    let config = load_config_from(config_path)?;
    println!("config file: {}", config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_init(config_path: &std::path::Path) -> Result<()> {
    if config_path.exists() {
        eprintln!("config file already exists: {}", config_path.display());
        return Ok(());
    }
    save_config_to(&AppConfig::default(), config_path)?;
    eprintln!("config file written: {}", config_path.display());
    Ok(())
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    let verb = if dry_run { "planned" } else { "annotated" };
    eprintln!(
        "\nsummary: directories={} files={} {}={} failed={} skipped_ext={} skipped_date={} skipped_subtrees={}",
        summary.directories_scanned,
        summary.files_seen,
        verb,
        summary.annotated,
        summary.failed,
        summary.skipped_extension,
        summary.skipped_date,
        summary.subtrees_skipped
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pola-caption").chain(args.iter().copied()))
            .expect("arguments must parse")
    }

    #[test]
    fn defaults_come_from_config() {
        let cli = parse(&[]);
        let config = AppConfig {
            font: "Helvetica".to_string(),
            max_workers: 4,
            ..AppConfig::default()
        };
        let options = build_options(&cli.annotate, &config).expect("options");
        assert_eq!(options.font, "Helvetica");
        assert_eq!(options.max_workers, 4);
        assert_eq!(options.dest, PathBuf::from("ready"));
        assert_eq!(options.extensions, ".jpg");
        assert_eq!(options.text_size, 100);
        assert_eq!(options.bottom_margin, 30);
        assert!(!options.parallel);
    }

    #[test]
    fn flags_override_config() {
        let cli = parse(&[
            "--src",
            "/photos",
            "--font",
            "Futura",
            "--bottom-margin",
            "-10",
            "--use-goroutine",
            "--max-goroutines",
            "2",
            "--location",
            "Paris",
        ]);
        let options = build_options(&cli.annotate, &AppConfig::default()).expect("options");
        assert_eq!(options.src, PathBuf::from("/photos"));
        assert_eq!(options.font, "Futura");
        assert_eq!(options.bottom_margin, -10);
        assert!(options.parallel);
        assert_eq!(options.max_workers, 2);
        assert_eq!(options.location.as_deref(), Some("Paris"));
    }

    #[test]
    fn bad_format_is_rejected_before_running() {
        let cli = parse(&["--format", "%v"]);
        let err = build_options(&cli.annotate, &AppConfig::default()).expect_err("must fail");
        assert!(err.to_string().contains("invalid --format value"));
    }

    #[test]
    fn no_parallel_overrides_config() {
        let config = AppConfig {
            parallel: true,
            ..AppConfig::default()
        };
        let options = build_options(&parse(&[]).annotate, &config).expect("options");
        assert!(options.parallel);

        let cli = parse(&["--no-parallel"]);
        let options = build_options(&cli.annotate, &config).expect("options");
        assert!(!options.parallel);

        assert!(Cli::try_parse_from(["pola-caption", "--parallel", "--no-parallel"]).is_err());
    }

    #[test]
    fn nested_dest_is_rejected() {
        let cli = parse(&["--dest", "out/ready"]);
        let err = build_options(&cli.annotate, &AppConfig::default()).expect_err("must fail");
        assert!(err.to_string().contains("invalid --dest value"));

        let config = AppConfig {
            dest: "../ready".to_string(),
            ..AppConfig::default()
        };
        assert!(build_options(&parse(&[]).annotate, &config).is_err());
    }

    #[test]
    fn config_subcommand_parses() {
        let cli = parse(&["config", "show"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config(ConfigArgs {
                action: ConfigAction::Show
            }))
        ));
    }
}
