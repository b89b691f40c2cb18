use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format for releases: "v0.3.0"
/// Format for dev builds: "v0.3.0\ndev: abc1234 2024-01-15 14:30"
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            format!("v{}", VERSION)
        } else {
            format!("v{}\ndev: {} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "mathnotes",
    bin_name = "mathnotes",
    version = get_version(),
    disable_help_subcommand = true,
    after_help = "Data lives in the platform data dir, or in $MATHNOTES_HOME when set."
)]
#[command(about = "Folders of handwritten, multi-page notes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output (debug logs on stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List folders and their files
    #[command(alias = "ls", display_order = 1)]
    List,

    /// Create a new folder
    #[command(alias = "nf", display_order = 2)]
    NewFolder {
        /// Folder name
        name: String,
    },

    /// Create a new file inside a folder
    #[command(alias = "n", display_order = 3)]
    NewFile {
        /// Folder (name or uuid)
        folder: String,

        /// File name
        name: String,
    },

    /// Rename a folder
    #[command(display_order = 4)]
    RenameFolder {
        /// Folder (name or uuid)
        folder: String,

        /// New name
        name: String,
    },

    /// Rename a file
    #[command(alias = "mv", display_order = 5)]
    RenameFile {
        /// File (Folder/File or uuid)
        file: String,

        /// New name
        name: String,
    },

    /// Add a stroke to a page
    #[command(alias = "d", display_order = 10)]
    Draw {
        /// File (Folder/File or uuid)
        file: String,

        /// Page number, starting at 0
        #[arg(long, short = 'p')]
        page: usize,

        /// Stroke points, e.g. "0,0 10,5 20,10"
        #[arg(long, allow_hyphen_values = true)]
        points: String,

        /// Stroke color
        #[arg(long)]
        color: Option<String>,

        /// Stroke width
        #[arg(long)]
        width: Option<f32>,
    },

    /// Clear a page
    #[command(display_order = 11)]
    Erase {
        /// File (Folder/File or uuid)
        file: String,

        /// Page number, starting at 0
        #[arg(long, short = 'p')]
        page: usize,
    },

    /// List the pages of a file
    #[command(display_order = 12)]
    Pages {
        /// File (Folder/File or uuid)
        file: String,
    },

    /// Print a page as JSON (defaults to the page handed to recognition)
    #[command(alias = "v", display_order = 13)]
    Show {
        /// File (Folder/File or uuid)
        file: String,

        /// Page number, starting at 0
        #[arg(long, short = 'p')]
        page: Option<usize>,
    },

    /// Get or set configuration
    #[command(display_order = 30)]
    Config {
        /// Configuration key (debounce-ms, page-file-ext, default-collections)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

impl Commands {
    /// Whether the command changes the notebook and so must flush before exit.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Commands::NewFolder { .. }
                | Commands::NewFile { .. }
                | Commands::RenameFolder { .. }
                | Commands::RenameFile { .. }
                | Commands::Draw { .. }
                | Commands::Erase { .. }
        )
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
