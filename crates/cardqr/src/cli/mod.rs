//! Command-line interface for cardqr.
//!
//! This module provides the CLI structure for the `cardqr` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, EditCommand, FormatArg, ProfileCommand, ProfileFields, QrCommand, ScanCommand,
    ThemeArg, ThemeCommand, VcardCommand,
};

/// cardqr - Digital business cards as QR codes
///
/// Keep several contact profiles, turn any of them into a vCard QR code for
/// the terminal or an image file, and read QR codes back from images.
#[derive(Debug, Parser)]
#[command(name = "cardqr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage profiles
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Print a profile as vCard text
    Vcard(VcardCommand),

    /// Show or export a profile's QR code
    #[command(subcommand)]
    Qr(QrCommand),

    /// Decode a QR code from image files
    Scan(ScanCommand),

    /// View or change the theme
    #[command(subcommand)]
    Theme(ThemeCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "cardqr");
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(
            parse(&["cardqr", "-q", "vcard"]).verbosity(),
            crate::logging::Verbosity::Quiet
        );
        assert_eq!(
            parse(&["cardqr", "vcard"]).verbosity(),
            crate::logging::Verbosity::Normal
        );
        assert_eq!(
            parse(&["cardqr", "-v", "vcard"]).verbosity(),
            crate::logging::Verbosity::Verbose
        );
        assert_eq!(
            parse(&["cardqr", "-vv", "vcard"]).verbosity(),
            crate::logging::Verbosity::Trace
        );
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["cardqr", "-c", "/custom/config.toml", "theme", "show"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_profile_edit() {
        let cli = parse(&[
            "cardqr",
            "profile",
            "edit",
            "--full-name",
            "Jane Doe",
            "--email",
            "jane@example.com",
        ]);
        let Command::Profile(ProfileCommand::Edit(edit)) = cli.command else {
            panic!("expected profile edit");
        };
        assert!(edit.id.is_none());
        assert_eq!(edit.fields.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(edit.fields.email.as_deref(), Some("jane@example.com"));
        assert!(edit.fields.company.is_none());
    }

    #[test]
    fn test_photo_conflicts_with_clear() {
        let result = Cli::try_parse_from([
            "cardqr",
            "profile",
            "edit",
            "--photo",
            "me.png",
            "--clear-photo",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_profile_delete() {
        let cli = parse(&["cardqr", "profile", "delete", "profile_1", "--yes"]);
        assert!(matches!(
            cli.command,
            Command::Profile(ProfileCommand::Delete { yes: true, .. })
        ));
    }

    #[test]
    fn test_parse_qr_export() {
        let cli = parse(&["cardqr", "qr", "export", "--format", "png", "--out", "/tmp"]);
        let Command::Qr(QrCommand::Export { id, format, out }) = cli.command else {
            panic!("expected qr export");
        };
        assert!(id.is_none());
        assert_eq!(format, FormatArg::Png);
        assert_eq!(out, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_scan_requires_files() {
        assert!(Cli::try_parse_from(["cardqr", "scan"]).is_err());

        let cli = parse(&["cardqr", "scan", "a.png", "b.png"]);
        let Command::Scan(scan) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(scan.files.len(), 2);
    }

    #[test]
    fn test_parse_theme_set() {
        let cli = parse(&["cardqr", "theme", "set", "dark"]);
        assert!(matches!(
            cli.command,
            Command::Theme(ThemeCommand::Set {
                theme: ThemeArg::Dark
            })
        ));
    }
}
