//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::export::ExportFormat;
use crate::profile::Profile;
use crate::theme::Theme;

/// Profile management commands.
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// List all profiles
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show a profile (the active one by default)
    Show {
        /// Profile id
        id: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add a blank profile and make it active
    Add,

    /// Make a profile active
    Select {
        /// Profile id
        id: String,
    },

    /// Delete a profile
    Delete {
        /// Profile id
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Edit profile fields
    Edit(EditCommand),
}

/// Profile edit arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Profile id (the active one by default)
    pub id: Option<String>,

    /// Fields to change.
    #[command(flatten)]
    pub fields: ProfileFields,

    /// Embed an image file (PNG, JPEG or GIF) as the photo
    #[arg(long, value_name = "FILE", conflicts_with = "clear_photo")]
    pub photo: Option<PathBuf>,

    /// Remove the photo
    #[arg(long)]
    pub clear_photo: bool,
}

/// Text fields settable from the command line.
#[derive(Debug, Default, Args)]
pub struct ProfileFields {
    /// Profile label
    #[arg(long)]
    pub name: Option<String>,

    /// Full name
    #[arg(long)]
    pub full_name: Option<String>,

    /// Job title
    #[arg(long)]
    pub job_title: Option<String>,

    /// Company
    #[arg(long)]
    pub company: Option<String>,

    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Website
    #[arg(long)]
    pub website: Option<String>,

    /// Postal address; use "\n" in the shell string for line breaks
    #[arg(long)]
    pub address: Option<String>,

    /// Short tagline (shown on the card, never encoded)
    #[arg(long)]
    pub tagline: Option<String>,
}

impl ProfileFields {
    /// Check if no field was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            &self.name,
            &self.full_name,
            &self.job_title,
            &self.company,
            &self.phone,
            &self.email,
            &self.website,
            &self.address,
            &self.tagline,
        ]
        .iter()
        .all(|field| field.is_none())
    }

    /// Copy the given fields onto `profile`.
    pub fn apply(self, profile: &mut Profile) {
        let targets = [
            (self.name, &mut profile.name),
            (self.full_name, &mut profile.full_name),
            (self.job_title, &mut profile.job_title),
            (self.company, &mut profile.company),
            (self.phone, &mut profile.phone),
            (self.email, &mut profile.email),
            (self.website, &mut profile.website),
            (self.address.map(|a| a.replace("\\n", "\n")), &mut profile.address),
            (self.tagline, &mut profile.tagline),
        ];
        for (value, target) in targets {
            if let Some(value) = value {
                *target = value;
            }
        }
    }
}

/// vCard command arguments.
#[derive(Debug, Args)]
pub struct VcardCommand {
    /// Profile id (the active one by default)
    pub id: Option<String>,
}

/// QR code commands.
#[derive(Debug, Subcommand)]
pub enum QrCommand {
    /// Print the QR code to the terminal
    Show {
        /// Profile id (the active one by default)
        id: Option<String>,
    },

    /// Save the QR code as an image file
    Export {
        /// Profile id (the active one by default)
        id: Option<String>,

        /// Image format
        #[arg(short, long, value_enum, default_value = "svg")]
        format: FormatArg,

        /// Output directory (overrides the configured one)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Image files to read as successive frames
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Theme commands.
#[derive(Debug, Subcommand)]
pub enum ThemeCommand {
    /// Show the current theme
    Show,

    /// Switch between light and dark
    Toggle,

    /// Set the theme
    Set {
        /// Theme to use
        #[arg(value_enum)]
        theme: ThemeArg,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Export format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    /// Vector image
    #[default]
    Svg,
    /// Raster image at twice the nominal size
    Png,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Svg => Self::Svg,
            FormatArg::Png => Self::Png,
        }
    }
}

/// Theme argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    /// Light background
    Light,
    /// Dark background
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Self::Light,
            ThemeArg::Dark => Self::Dark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_arg_conversion() {
        assert_eq!(ExportFormat::from(FormatArg::Svg), ExportFormat::Svg);
        assert_eq!(ExportFormat::from(FormatArg::Png), ExportFormat::Png);
        assert_eq!(FormatArg::default(), FormatArg::Svg);
    }

    #[test]
    fn test_theme_arg_conversion() {
        assert_eq!(Theme::from(ThemeArg::Light), Theme::Light);
        assert_eq!(Theme::from(ThemeArg::Dark), Theme::Dark);
    }

    #[test]
    fn test_fields_empty() {
        assert!(ProfileFields::default().is_empty());

        let fields = ProfileFields {
            tagline: Some("hi".to_string()),
            ..ProfileFields::default()
        };
        assert!(!fields.is_empty());
    }

    #[test]
    fn test_fields_apply_only_given() {
        let mut profile = Profile::new("Work");
        profile.email = "old@example.com".to_string();

        ProfileFields {
            full_name: Some("Jane Doe".to_string()),
            address: Some("1 Main St\\nSuite 4".to_string()),
            ..ProfileFields::default()
        }
        .apply(&mut profile);

        assert_eq!(profile.name, "Work");
        assert_eq!(profile.full_name, "Jane Doe");
        assert_eq!(profile.email, "old@example.com");
        assert_eq!(profile.address, "1 Main St\nSuite 4");
    }

    #[test]
    fn test_fields_apply_can_clear() {
        let mut profile = Profile::new("Work");
        profile.company = "Acme".to_string();

        ProfileFields {
            company: Some(String::new()),
            ..ProfileFields::default()
        }
        .apply(&mut profile);

        assert!(profile.company.is_empty());
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
