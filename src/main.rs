use chrono::Utc;
use clap::{Parser, Subcommand};
use notepress::config::{self, CliOverrides};
use notepress::import::{ImportContext, run_import};
use notepress::output::ConsoleReporter;
use notepress::post::{AlwaysOverwrite, NeverOverwrite, OverwritePolicy, PromptOverwrite};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("NOTEPRESS_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("NOTEPRESS_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "notepress")]
#[command(about = "Import a Markdown notes export into blog posts")]
#[command(long_about = "\
Import a Markdown notes export into blog posts

Each note becomes <slug>.mdx in the posts directory, with a generated
header (title, description, tags, category, hero image) and a cleaned-up
body. Images the note references are copied into the assets directory and
their references rewritten.

Where things come from (first available wins):
  Title:        first '# heading' → file name (My_Trip.md → \"My Trip\")
  Description:  first plain line after the title → fixed fallback text
  Tags:         #tags in the note (up to 10) + --tags
  Category:     CATEGORY_MAP entry for a note tag → --category → Journal
  Hero image:   first image in the note → random image in the assets dir
                → --hero-image

Images are looked up next to the note, in an assets/ folder beside it, in
an assets/ folder one level up, then in ../assets.

Settings are read from ./notepress.conf when present. Run
'notepress gen-config' to generate a documented one.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ImportArgs {
    /// Note file or export directory
    input: PathBuf,

    /// Category for imported posts (Journal, Coding, Music, Photography, Crypto, History)
    #[arg(long)]
    category: Option<String>,

    /// Mark imported posts as drafts
    #[arg(long)]
    draft: bool,

    /// Hero image used when no other image is available
    #[arg(long)]
    hero_image: Option<String>,

    /// Comma-separated tags added to every post
    #[arg(long)]
    tags: Option<String>,

    /// Only import notes whose file name matches this regex
    #[arg(long)]
    include: Option<String>,

    /// Skip notes whose file name matches this regex
    #[arg(long)]
    exclude: Option<String>,

    /// Show what would be written without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Show debug output
    #[arg(short, long)]
    verbose: bool,

    /// Config file (default: ./notepress.conf)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory posts are written to
    #[arg(long)]
    posts_dir: Option<PathBuf>,

    /// Directory images are copied to
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Overwrite existing posts without asking
    #[arg(long, conflicts_with = "skip_existing")]
    force: bool,

    /// Never overwrite existing posts
    #[arg(long)]
    skip_existing: bool,
}

impl ImportArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            category: self.category.clone(),
            draft: self.draft,
            hero_image: self.hero_image.clone(),
            tags: self.tags.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            dry_run: self.dry_run,
            verbose: self.verbose,
            posts_dir: self.posts_dir.clone(),
            assets_dir: self.assets_dir.clone(),
        }
    }

    fn policy(&self) -> Box<dyn OverwritePolicy> {
        if self.force {
            Box::new(AlwaysOverwrite)
        } else if self.skip_existing {
            Box::new(NeverOverwrite)
        } else {
            Box::new(PromptOverwrite::stdio())
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Import notes into the blog
    Import(ImportArgs),
    /// Print a stock notepress.conf with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Import(args) => {
            let run_config = config::load_config(args.config.as_deref(), &args.overrides())?;
            let mut policy = args.policy();
            let mut reporter = ConsoleReporter::new(run_config.verbose);
            let mut rng = rand::thread_rng();
            let mut ctx = ImportContext {
                policy: policy.as_mut(),
                reporter: &mut reporter,
                rng: &mut rng,
                clock: &Utc::now,
            };
            run_import(&run_config, &args.input, &mut ctx)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config());
        }
    }

    Ok(())
}
