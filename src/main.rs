use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use treeforge::fs::{Filesystem, MemFs, OsFs, TraceFs};
use treeforge::{Tree, config, dump, logging, manifest, output};

fn version_string() -> &'static str {
    let on_tag = env!("TREEFORGE_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("TREEFORGE_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "treeforge")]
#[command(about = "Render a content tree onto the filesystem")]
#[command(long_about = "\
Render a content tree onto the filesystem

A manifest describes the tree as JSON: directories, text files, JSON
documents, and symlinks. Any node can carry a link ID; symlinks point at a
link ID and are written as relative links, so shared content is stored once.

  {
    \"type\": \"dir\",
    \"children\": [
      {\"type\": \"dir\", \"name\": \"4\", \"link_id\": \"author:4\", \"children\": [
        {\"type\": \"file\", \"name\": \"index.html\", \"content\": \"...\"}
      ]},
      {\"type\": \"symlink\", \"name\": \"latest\", \"target\": \"author:4\"}
    ]
  }

Run 'treeforge gen-config' to generate a documented render.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Log at debug level (overridden by TREEFORGE_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a manifest into the output directory
    Build {
        /// Manifest JSON file
        manifest: PathBuf,
        /// Output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,
        /// Render config file
        #[arg(long, default_value = "render.toml")]
        config: PathBuf,
    },
    /// Validate a manifest and show the tree without writing anything
    Check {
        /// Manifest JSON file
        manifest: PathBuf,
        /// Render config file
        #[arg(long, default_value = "render.toml")]
        config: PathBuf,
    },
    /// List a rendered directory with modes and link targets
    Ls {
        /// Directory to list
        #[arg(default_value = "dist")]
        dir: PathBuf,
    },
    /// Print a stock render.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Command::Build {
            manifest: manifest_path,
            output: output_dir,
            config: config_path,
        } => {
            let render_config = config::load_config(&config_path)?;
            let root = manifest::load_manifest(&manifest_path)?;

            println!(
                "==> Building {} → {}",
                manifest_path.display(),
                output_dir.display()
            );
            let fs = output_fs(&output_dir, render_config.trace_fs);
            let tree = Tree::with_options(&*fs, "/", &root, &render_config)?;
            output::print_tree(&tree);
            tree.render()?;
            println!("==> {}", output::format_render_summary(&tree, &output_dir));
        }
        Command::Check {
            manifest: manifest_path,
            config: config_path,
        } => {
            let render_config = config::load_config(&config_path)?;
            let root = manifest::load_manifest(&manifest_path)?;

            println!("==> Checking {}", manifest_path.display());
            let fs = MemFs::new();
            let tree = Tree::with_options(&fs, "/", &root, &render_config)?;
            output::print_tree(&tree);
            println!("==> Manifest is valid");
        }
        Command::Ls { dir } => {
            let fs = OsFs::new(&dir);
            let listing = dump::dump(&fs, Path::new("/"))?;
            output::print_dump(&listing);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// The filesystem a build writes to, optionally wrapped in call tracing.
fn output_fs(dir: &Path, trace: bool) -> Box<dyn Filesystem> {
    let fs = OsFs::new(dir);
    if trace {
        Box::new(TraceFs::new(fs))
    } else {
        Box::new(fs)
    }
}
