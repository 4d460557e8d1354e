//! Command line interface definition

use arcdl_config::ColorChoice;
use arcdl_hash::{Hash, HashAlgorithm};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// arcdl - resumable downloads, safe zip extraction and desktop shortcuts
#[derive(Parser)]
#[command(name = "arcdl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resumable downloads, safe zip extraction and desktop shortcuts")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Write JSON debug logs to the log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Download a file, resuming a previous partial transfer
    #[command(alias = "get")]
    Fetch {
        /// URL to download
        url: String,

        /// Destination file (defaults to the URL's file name in the download directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Expected digest, hex (prefix with `blake3:` for BLAKE3)
        #[arg(long, value_name = "HEX")]
        sha256: Option<Hash>,

        /// Discard any partial download and start over
        #[arg(long)]
        no_resume: bool,
    },

    /// Extract a zip archive, rejecting entries that escape the destination
    #[command(alias = "x")]
    Extract {
        /// Archive to extract
        archive: PathBuf,

        /// Destination directory
        dest: PathBuf,

        /// Remove the destination before extracting
        #[arg(long)]
        overwrite: bool,
    },

    /// Download and extract an application, then link it on the desktop
    #[command(alias = "i")]
    Install {
        /// URL of the zip archive
        url: String,

        /// Installation directory
        #[arg(long = "to", value_name = "DIR")]
        install_dir: PathBuf,

        /// Where to keep the downloaded archive
        #[arg(long, value_name = "FILE")]
        download_to: Option<PathBuf>,

        /// Expected digest of the archive, hex
        #[arg(long, value_name = "HEX")]
        sha256: Option<Hash>,

        /// Remove the installation directory before extracting
        #[arg(long)]
        overwrite: bool,

        /// Glob locating the executable in the extracted tree
        #[arg(long, value_name = "GLOB")]
        executable: Option<String>,

        /// Shortcut name (defaults to the executable's file stem)
        #[arg(long, value_name = "NAME")]
        shortcut_name: Option<String>,

        /// Arguments passed to the executable by the shortcut
        #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
        shortcut_args: Option<String>,

        /// Do not create a desktop shortcut
        #[arg(long)]
        no_shortcut: bool,
    },

    /// Find files under a directory by glob
    Find {
        /// Directory to search
        root: PathBuf,

        /// Glob matched against file names, or relative paths when it contains `/`
        pattern: String,
    },

    /// Print the digest of a local file
    Hash {
        /// File to hash
        file: PathBuf,

        /// Digest algorithm (sha256 or blake3)
        #[arg(long, short, default_value = "sha256")]
        algorithm: HashAlgorithm,
    },

    /// Serve files over HTTP for download
    Serve {
        /// Artifact to serve, as `<name>=<path>`; repeatable
        #[arg(long = "file", value_name = "NAME=PATH", required = true)]
        files: Vec<String>,

        /// Address to listen on (defaults to `[serve] bind`)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
}

impl Commands {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Fetch { .. } => "fetch",
            Commands::Extract { .. } => "extract",
            Commands::Install { .. } => "install",
            Commands::Find { .. } => "find",
            Commands::Hash { .. } => "hash",
            Commands::Serve { .. } => "serve",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_install() {
        let cli = Cli::try_parse_from([
            "arcdl",
            "install",
            "http://127.0.0.1:5000/zip",
            "--to",
            "apps/M_PLUS",
            "--executable",
            "M_PLUS.exe",
            "--shortcut-args",
            "--fullscreen",
            "--json",
        ])
        .unwrap();

        assert!(cli.global.json);
        match cli.command {
            Commands::Install {
                url,
                install_dir,
                executable,
                shortcut_args,
                no_shortcut,
                ..
            } => {
                assert_eq!(url, "http://127.0.0.1:5000/zip");
                assert_eq!(install_dir, PathBuf::from("apps/M_PLUS"));
                assert_eq!(executable.as_deref(), Some("M_PLUS.exe"));
                assert_eq!(shortcut_args.as_deref(), Some("--fullscreen"));
                assert!(!no_shortcut);
            }
            _ => panic!("expected install"),
        }
    }

    #[test]
    fn test_parse_fetch_checksum() {
        let digest = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        let cli = Cli::try_parse_from(["arcdl", "fetch", "http://host/a.zip", "--sha256", digest])
            .unwrap();
        match cli.command {
            Commands::Fetch { sha256, .. } => {
                assert_eq!(sha256.unwrap().to_hex(), digest);
            }
            _ => panic!("expected fetch"),
        }

        assert!(Cli::try_parse_from(["arcdl", "fetch", "http://host/a.zip", "--sha256", "zz"]).is_err());
    }

    #[test]
    fn test_parse_hash_algorithm() {
        let cli = Cli::try_parse_from(["arcdl", "hash", "file.zip", "--algorithm", "blake3"]).unwrap();
        match cli.command {
            Commands::Hash { algorithm, .. } => assert_eq!(algorithm, HashAlgorithm::Blake3),
            _ => panic!("expected hash"),
        }
    }

    #[test]
    fn test_serve_requires_file() {
        assert!(Cli::try_parse_from(["arcdl", "serve"]).is_err());
        let cli =
            Cli::try_parse_from(["arcdl", "serve", "--file", "zip=M_PLUS.zip", "--file", "tool=t.exe"])
                .unwrap();
        assert_eq!(cli.command.name(), "serve");
    }
}
