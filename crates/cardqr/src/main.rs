//! `cardqr` - CLI for digital business cards
//!
//! This binary manages the profile book and turns profiles into vCard QR
//! codes, or reads QR codes back from image files.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use clap::Parser;

use cardqr::cli::{
    Cli, Command, ConfigCommand, EditCommand, ProfileCommand, QrCommand, ScanCommand,
    ThemeCommand, VcardCommand,
};
use cardqr::export::{DirectorySink, ExportSettings};
use cardqr::scan::{FrameScanner, ImageFileSource, ScanConstraints};
use cardqr::{
    init_logging, photo, vcard, Config, Profile, ProfileBook, ProfileId, QrExporter, ScanSession,
    ScanState, SqliteStore, Theme,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Profile(profile_cmd) => handle_profile(&config, profile_cmd),
        Command::Vcard(vcard_cmd) => handle_vcard(&config, &vcard_cmd),
        Command::Qr(qr_cmd) => handle_qr(&config, qr_cmd).await,
        Command::Scan(scan_cmd) => handle_scan(&config, scan_cmd).await,
        Command::Theme(theme_cmd) => handle_theme(&config, &theme_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_book(config: &Config) -> Result<ProfileBook<SqliteStore>, Box<dyn std::error::Error>> {
    let store = SqliteStore::open(config.database_path())?;
    Ok(ProfileBook::load(store)?)
}

fn handle_profile(config: &Config, cmd: ProfileCommand) -> CliResult {
    let mut book = open_book(config)?;

    match cmd {
        ProfileCommand::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(book.profiles())?);
            } else {
                let active = book.active().id.clone();
                for profile in book.profiles() {
                    let marker = if profile.id == active { "*" } else { " " };
                    println!("{marker} {}  {}", profile.id, profile.name);
                    let headline = profile.headline();
                    if !profile.full_name.is_empty() || !headline.is_empty() {
                        println!("    {}  {}", profile.full_name, headline);
                    }
                }
            }
        }
        ProfileCommand::Show { id, json } => {
            let profile = book.resolve(id.map(ProfileId::from).as_ref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(profile)?);
            } else {
                print_profile(profile);
            }
        }
        ProfileCommand::Add => {
            let profile = book.add()?;
            println!("Added {} ({})", profile.name, profile.id);
        }
        ProfileCommand::Select { id } => {
            let id = ProfileId::from(id);
            book.select(&id)?;
            println!("Active profile: {}", book.active().name);
        }
        ProfileCommand::Delete { id, yes } => {
            let id = ProfileId::from(id);
            let name = book.resolve(Some(&id))?.name.clone();
            if !yes {
                println!("This will delete profile '{name}' ({id}).");
                println!("Use --yes to confirm.");
                return Ok(());
            }
            match book.delete(&id) {
                Ok(()) => {
                    println!("Deleted '{name}'.");
                    println!("Active profile: {}", book.active().name);
                }
                Err(e) if e.is_last_profile() => {
                    println!("'{name}' is the only profile and can't be deleted.");
                }
                Err(e) => return Err(e.into()),
            }
        }
        ProfileCommand::Edit(edit_cmd) => handle_edit(config, &mut book, edit_cmd)?,
    }
    Ok(())
}

fn handle_edit(config: &Config, book: &mut ProfileBook<SqliteStore>, cmd: EditCommand) -> CliResult {
    let EditCommand {
        id,
        fields,
        photo,
        clear_photo,
    } = cmd;

    if fields.is_empty() && photo.is_none() && !clear_photo {
        println!("Nothing to change.");
        return Ok(());
    }

    let mut profile = book.resolve(id.map(ProfileId::from).as_ref())?.clone();
    fields.apply(&mut profile);
    if let Some(path) = photo {
        profile.photo = Some(photo::load_photo(path, config.profile.photo_max_bytes)?);
    } else if clear_photo {
        profile.photo = None;
    }

    let label = format!("{} ({})", profile.name, profile.id);
    book.save(profile)?;
    println!("Saved {label}");
    Ok(())
}

fn print_profile(profile: &Profile) {
    let rows = [
        ("Name", profile.name.as_str()),
        ("Full name", profile.full_name.as_str()),
        ("Job title", profile.job_title.as_str()),
        ("Company", profile.company.as_str()),
        ("Phone", profile.phone.as_str()),
        ("Email", profile.email.as_str()),
        ("Website", profile.website.as_str()),
        ("Tagline", profile.tagline.as_str()),
    ];

    println!("Profile {}", profile.id);
    println!("{}", "=".repeat(8 + profile.id.as_str().len()));
    for (label, value) in rows {
        if !value.is_empty() {
            println!("  {label:<12}{value}");
        }
    }
    for (i, line) in profile.address.lines().enumerate() {
        let label = if i == 0 { "Address" } else { "" };
        println!("  {label:<12}{line}");
    }
    if let Some(photo) = &profile.photo {
        match photo::parse_photo(photo) {
            Some(photo) => println!(
                "  {:<12}{} ({} base64 chars)",
                "Photo",
                photo.kind.vcard_type(),
                photo.payload.len()
            ),
            None => println!("  {:<12}(not embedded)", "Photo"),
        }
    }
}

fn handle_vcard(config: &Config, cmd: &VcardCommand) -> CliResult {
    let book = open_book(config)?;
    let profile = book.resolve(cmd.id.clone().map(ProfileId::from).as_ref())?;
    println!("{}", vcard::encode(profile));
    Ok(())
}

async fn handle_qr(config: &Config, cmd: QrCommand) -> CliResult {
    let book = open_book(config)?;

    match cmd {
        QrCommand::Show { id } => {
            let profile = book.resolve(id.map(ProfileId::from).as_ref())?;
            let sink = Arc::new(DirectorySink::new(config.output_dir()));
            let mut exporter = QrExporter::new(sink, ExportSettings::from(config));
            let rendered = exporter.render(profile)?;

            println!("{}", rendered.terminal_preview());
            if !profile.full_name.is_empty() {
                println!("{}", profile.full_name);
            }
            let headline = profile.headline();
            if !headline.is_empty() {
                println!("{headline}");
            }
            if !profile.tagline.is_empty() {
                println!("\"{}\"", profile.tagline);
            }
        }
        QrCommand::Export { id, format, out } => {
            let profile = book.resolve(id.map(ProfileId::from).as_ref())?;
            let dir = out.unwrap_or_else(|| config.output_dir());
            let mut exporter =
                QrExporter::new(Arc::new(DirectorySink::new(dir)), ExportSettings::from(config));
            exporter.render(profile)?;

            match exporter
                .export(&profile.qr_id(), format.into(), &profile.full_name)
                .await?
            {
                Some(saved) => println!("Saved {} ({} bytes)", saved.location.display(), saved.size),
                None => println!("Nothing exported."),
            }
        }
    }
    Ok(())
}

async fn handle_scan(config: &Config, cmd: ScanCommand) -> CliResult {
    let scanner = FrameScanner::new(Arc::new(ImageFileSource::new(cmd.files)));
    let mut session = ScanSession::new(Arc::new(scanner), ScanConstraints::from(config));

    session.enter().await;
    let state = session.wait().await?;
    session.leave();

    match state {
        ScanState::Decoded(text) => {
            println!("{text}");
            Ok(())
        }
        ScanState::Failed(message) => Err(format!("scan failed: {message}").into()),
        ScanState::Idle | ScanState::Scanning => Err("scan did not run".into()),
    }
}

fn handle_theme(config: &Config, cmd: &ThemeCommand) -> CliResult {
    let store = SqliteStore::open(config.database_path())?;

    match cmd {
        ThemeCommand::Show => println!("{}", Theme::load(&store)?),
        ThemeCommand::Toggle => println!("{}", Theme::toggle(&store)?),
        ThemeCommand::Set { theme } => {
            let theme = Theme::from(*theme);
            theme.save(&store)?;
            println!("{theme}");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Export]");
                println!("  Output directory:   {}", config.output_dir().display());
                println!("  QR size (px):       {}", config.export.qr_size);
                println!("  Quiet zone:         {}", config.export.include_margin);
                println!("  Error correction:   {}", config.export.error_correction);
                println!("  Raster scale:       {}", config.export.raster_scale);
                println!("  Raster timeout:     {:?}", config.raster_timeout());
                println!();
                println!("[Scan]");
                println!("  Frames per second:  {}", config.scan.fps);
                println!("  Scan box (px):      {}", config.scan.qrbox);
                println!("  Facing mode:        {}", config.scan.facing_mode);
                println!();
                println!("[Profile]");
                println!("  Photo limit (bytes): {}", config.profile.photo_max_bytes);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
