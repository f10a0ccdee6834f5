use clap::Parser;
use log::LevelFilter;

use crate::options::{ArchiveLimits, ArchiveOptions};

#[derive(Parser, Debug)]
#[command(name = "storezip")]
#[command(version)]
#[command(about = "Bundle media files into an uncompressed ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  storezip a.jpg b.mp4 -o media.zip   store two files in media.zip\n  \
  storezip -j -D photos shots/*.png   flatten paths and add an empty photos/ entry\n  \
  storezip -v media.zip               list media.zip verbosely\n  \
  storezip -t media.zip               test CRCs of every entry in media.zip")]
pub struct Cli {
    /// Files to add, or the archive to inspect with -l, -v or -t
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<String>,

    /// Write the archive to ZIPFILE (default: download_<millis>.zip)
    #[arg(short = 'o', value_name = "ZIPFILE")]
    pub output: Option<String>,

    /// Junk paths (store base names only)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Add an empty directory entry
    #[arg(short = 'D', value_name = "DIR")]
    pub directories: Vec<String>,

    /// Refuse files that are not JPEG, PNG, GIF, WebP or MP4
    #[arg(long)]
    pub require_media: bool,

    /// Maximum number of entries
    #[arg(long, value_name = "N")]
    pub max_files: Option<usize>,

    /// Maximum size of a single entry
    #[arg(long, value_name = "BYTES")]
    pub max_file_size: Option<u64>,

    /// Only enforce the limits of the ZIP format itself
    #[arg(long, conflicts_with_all = ["max_files", "max_file_size"])]
    pub no_limits: bool,

    /// List archive contents (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List archive contents verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Test archive entries against their CRCs
    #[arg(short = 't')]
    pub test: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    /// Whether FILES names an existing archive to read rather than inputs to pack.
    pub fn is_inspect(&self) -> bool {
        self.list || self.verbose || self.test
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    /// Default log level, overridden by `RUST_LOG`.
    pub fn log_level(&self) -> LevelFilter {
        match self.quiet {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Error,
            _ => LevelFilter::Off,
        }
    }

    pub fn options(&self) -> ArchiveOptions {
        let limits = if self.no_limits {
            ArchiveLimits::unbounded()
        } else {
            let defaults = ArchiveLimits::default();
            ArchiveLimits {
                max_entries: self.max_files.unwrap_or(defaults.max_entries),
                max_entry_size: self.max_file_size.unwrap_or(defaults.max_entry_size),
                ..defaults
            }
        };

        ArchiveOptions {
            limits,
            require_media: self.require_media,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_arguments() {
        let cli = Cli::try_parse_from([
            "storezip", "-o", "out.zip", "-j", "--max-files", "5", "a.jpg", "b.mp4",
        ])
        .unwrap();
        assert_eq!(cli.files, vec!["a.jpg", "b.mp4"]);
        assert_eq!(cli.output.as_deref(), Some("out.zip"));
        assert!(cli.junk_paths);
        assert!(!cli.is_inspect());

        let options = cli.options();
        assert_eq!(options.limits.max_entries, 5);
        assert_eq!(options.limits.max_entry_size, ArchiveLimits::DEFAULT_MAX_ENTRY_SIZE);
    }

    #[test]
    fn test_inspect_arguments() {
        let cli = Cli::try_parse_from(["storezip", "-t", "-qq", "media.zip"]).unwrap();
        assert!(cli.is_inspect());
        assert_eq!(cli.log_level(), LevelFilter::Off);
    }

    #[test]
    fn test_no_limits_conflicts() {
        assert!(Cli::try_parse_from(["storezip", "--no-limits", "--max-files", "3", "a"]).is_err());
        let cli = Cli::try_parse_from(["storezip", "--no-limits", "a"]).unwrap();
        assert_eq!(cli.options().limits, ArchiveLimits::unbounded());
    }

    #[test]
    fn test_files_required() {
        assert!(Cli::try_parse_from(["storezip"]).is_err());
    }
}
