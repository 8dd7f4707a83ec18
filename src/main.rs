use clap::{Parser, Subcommand};
use inkpost::pipeline::{Pipeline, PipelineError};
use inkpost::{config, generate, output};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inkpost")]
#[command(about = "Render markdown posts with front matter into HTML pages and a JSON API")]
#[command(long_about = "\
Render markdown posts with front matter into HTML pages and a JSON API

Your filesystem is the data source. Every file in the post directory is a
post; its filename stem is its slug and URL.

Site structure:

  site/
  ├── config.toml                  # Optional; see 'inkpost gen-config'
  ├── blog_src/
  │   ├── hello_world.md           # Slug: hello_world
  │   └── release_notes.md
  └── templates/
      ├── blog_template.html       # Post page
      ├── blog_list_template.html  # All posts
      └── tag_list_template.html   # Posts with one tag

Front matter (YAML between --- lines, or TOML between +++ lines):

  ---
  title: Release Notes             # default: filename, humanized
  author: Sam                      # default: Anonymous
  date: 2024-03-01                 # default: file creation time
  description: What changed        # default: empty
  tags: [rust, web]                # default: none
  ---

Posts are listed newest first. A post that fails to load is skipped and
reported by 'inkpost check'.")]
#[command(version)]
struct Cli {
    /// Site root (holds config.toml, the post directory and templates)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Debug logging on stderr (otherwise RUST_LOG, default warn)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one post page
    Page { slug: String },
    /// Render the all-posts page
    List,
    /// Render the page for one tag
    Tag { name: String },
    /// Post summaries as JSON, newest first
    Posts {
        /// Only the newest N posts (N defaults to latest_limit)
        #[arg(long, allow_negative_numbers = true)]
        latest: Option<Option<i64>>,
    },
    /// One post as JSON, with body and table of contents
    Post { slug: String },
    /// Tags with post counts, most used first
    Tags {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Load every post and template and report problems
    Check,
    /// Write every page and API payload to a directory
    Build {
        /// Output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn run(cli: Cli) -> CliResult<ExitCode> {
    let open = || -> CliResult<Pipeline> {
        let pipeline = Pipeline::open(&cli.root)?;
        init_thread_pool(&pipeline.config().processing);
        Ok(pipeline)
    };

    match cli.command {
        Command::Page { slug } => found(open()?.render_document_page(&slug), print_html),
        Command::Post { slug } => found(open()?.get_post(&slug), |post| print_json(&post)),
        Command::List => {
            print_html(open()?.render_listing_page()?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Tag { name } => {
            print_html(open()?.render_tag_page(&name)?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Posts { latest } => {
            let pipeline = open()?;
            let posts = match latest {
                None => pipeline.list_posts(),
                Some(limit) => {
                    let default = i64::try_from(pipeline.config().latest_limit).unwrap_or(i64::MAX);
                    pipeline.latest_posts(limit.unwrap_or(default))
                }
            };
            print_json(&posts)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Tags { json } => {
            let tags = open()?.tags();
            if json {
                print_json(&tags)?;
            } else {
                output::print_tag_index(&tags);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check => {
            let pipeline = open()?;
            let source_dir = pipeline.source_dir();
            println!("==> Checking {}", source_dir.display());
            let report = pipeline.check();
            output::print_check_output(&report, &source_dir);
            if !report.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
            println!("==> Site is valid");
            Ok(ExitCode::SUCCESS)
        }
        Command::Build { output: out } => {
            let pipeline = open()?;
            println!("==> Building {} \u{2192} {}", pipeline.root().display(), out.display());
            let report = generate::generate(&pipeline, &out)?;
            output::print_generate_output(&report);
            println!("==> Build complete: {}", out.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Map a lookup result onto the exit status: not found is 2, with the
/// message on stderr.
fn found<T>(result: Result<T, PipelineError>, show: impl FnOnce(T) -> CliResult<()>) -> CliResult<ExitCode> {
    match result {
        Ok(value) => {
            show(value)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_not_found() => {
            eprintln!("{e}");
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(e.into()),
    }
}

fn print_html(html: String) -> CliResult<()> {
    print!("{html}");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Log to stderr so stdout stays clean for HTML and JSON.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Size the global rayon pool that loads posts in parallel.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
