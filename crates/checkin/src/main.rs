//! `checkin` - CLI for event attendance registration
//!
//! This binary drives the attendee workflow and the admin console against the
//! local registration database.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use url::Url;

use checkin::admin::{report, AdminConsole};
use checkin::cli::{
    Cli, Command, ConfigCommand, LinksCommand, OutputFormat, RegisterCommand,
    RegistrationsCommand, RouteCommand,
};
use checkin::signature::InputEvent;
use checkin::store::{share, Store};
use checkin::validate::{ContactForm, ValidationErrors};
use checkin::workflow::{self, StepKind, Workflow};
use checkin::{init_logging, Config, Router, SqliteStore};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Execute the command
    match cli.command {
        Command::Links(cmd) => handle_links(&config, cmd),
        Command::Registrations(cmd) => handle_registrations(&config, cmd),
        Command::Register(cmd) => handle_register(&config, &cmd),
        Command::Route(cmd) => handle_route(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config, share_token: Option<&str>) -> anyhow::Result<Store<SqliteStore>> {
    let path = config.database_path();
    let backend = SqliteStore::open(&path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;
    Ok(Store::load(backend, share_token))
}

fn handle_links(config: &Config, cmd: LinksCommand) -> anyhow::Result<()> {
    let mut store = open_store(config, None)?;
    let mut admin = AdminConsole::new(&mut store, config);

    match cmd {
        LinksCommand::Add { links, file } => {
            let mut text = links.join("\n");
            if let Some(path) = file {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                text.push('\n');
                text.push_str(&contents);
            }
            let added = admin.add_links(&text);
            println!("Added {added} link(s); {} in total.", admin.links().len());
        }
        LinksCommand::List => {
            if admin.links().is_empty() {
                println!("No document links.");
            }
            for (position, link) in admin.links().iter().enumerate() {
                println!("{position:>3}  {link}");
            }
        }
        LinksCommand::Remove { position } => match admin.remove_link(position) {
            Some(link) => println!("Removed {link}"),
            None => bail!(
                "no link at position {position} ({} link(s) stored)",
                admin.links().len()
            ),
        },
        LinksCommand::Clear => {
            admin.clear_links();
            println!("Document links cleared.");
        }
        LinksCommand::Share => match admin.share_link()? {
            Some(url) => {
                println!("Copie y envíe este enlace a los participantes para que se registren.");
                println!("{url}");
            }
            None => println!("No links to share."),
        },
    }
    Ok(())
}

fn handle_registrations(config: &Config, cmd: RegistrationsCommand) -> anyhow::Result<()> {
    let mut store = open_store(config, None)?;
    let mut admin = AdminConsole::new(&mut store, config);

    match cmd {
        RegistrationsCommand::Count => {
            println!("{}", admin.registration_summary());
        }
        RegistrationsCommand::List { format } => print_registrations(&admin, format)?,
        RegistrationsCommand::Export { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from(admin.report_file_name()));
            admin
                .export_report(&path)
                .with_context(|| format!("failed to export report to {}", path.display()))?;
            println!("{}", admin.registration_summary());
            println!("Report written to {}", path.display());
        }
        RegistrationsCommand::Clear { yes } => {
            let cleared = admin.clear_registrations(|prompt| yes || confirm(prompt));
            if cleared {
                println!("Registrations cleared.");
            } else {
                println!("Nothing was deleted.");
            }
        }
    }
    Ok(())
}

fn print_registrations(
    admin: &AdminConsole<'_, SqliteStore>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let registrations = admin.registrations();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(registrations)?);
        }
        OutputFormat::Plain => {
            if registrations.is_empty() {
                println!("{}", admin.registration_summary());
            }
            for registration in registrations {
                println!("{}", registration.report_row().join(" | "));
            }
        }
        OutputFormat::Table => {
            let rows: Vec<[&str; 6]> = registrations.iter().map(|r| r.report_row()).collect();
            let mut widths = report::HEADERS.map(|h| h.chars().count());
            for row in &rows {
                for (width, cell) in widths.iter_mut().zip(row) {
                    *width = (*width).max(cell.chars().count());
                }
            }
            print_table_row(&report::HEADERS, &widths);
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            println!("{}", rule.join("-+-"));
            for row in &rows {
                print_table_row(row, &widths);
            }
        }
    }
    Ok(())
}

fn print_table_row(cells: &[&str; 6], widths: &[usize; 6]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    println!("{}", padded.join(" | ").trim_end());
}

fn handle_register(config: &Config, cmd: &RegisterCommand) -> anyhow::Result<()> {
    let events = read_signature_events(&cmd.signature)?;

    let share_token = match &cmd.url {
        Some(address) => {
            let url = Url::parse(address).with_context(|| format!("invalid URL: {address}"))?;
            share::token_from_url(&url, &config.share.query_param)
        }
        None => None,
    };
    let mut store = open_store(config, share_token.as_deref())?;
    let mut session = Workflow::from_config(config);

    if let Err(errors) = session.pre_register(&cmd.name, &store)? {
        return Err(rejected(&errors));
    }

    if session.kind() == StepKind::DocumentReview {
        println!(
            "{}, por favor, revise los siguientes documentos antes de continuar.",
            session.full_name().unwrap_or_default()
        );
        let total = session.review().map_or(0, checkin::ReviewTracker::total);
        for position in 0..total {
            if let Some(url) = session.open_document(position)? {
                println!("  Documento {}: {url}", position + 1);
                if !cmd.yes {
                    wait_for_enter()?;
                }
            }
        }
        if !session.finish_review()? {
            bail!("not every document was opened");
        }
    }

    let form = ContactForm {
        company: cmd.company.clone(),
        document_number: cmd.dni.clone(),
        phone: cmd.phone.clone(),
        email: cmd.email.clone(),
    };
    if let Err(errors) = session.submit_contact(form)? {
        return Err(rejected(&errors));
    }

    for event in &events {
        session.handle_signature_event(event)?;
    }
    if !session.save_signature(&mut store)? {
        bail!(
            "the signature in {} draws nothing",
            cmd.signature.display()
        );
    }

    if let Some(record) = session.completed() {
        println!("{}", workflow::COMPLETED_TITLE);
        println!("{}", workflow::COMPLETED_MESSAGE);
        println!("  {} ({})", record.full_name, record.registration_date);
    }
    Ok(())
}

fn read_signature_events(path: &Path) -> anyhow::Result<Vec<InputEvent>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read signature events from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a list of input events", path.display()))
}

fn rejected(errors: &ValidationErrors) -> anyhow::Error {
    for (field, error) in errors.iter() {
        eprintln!("  {}: {}", field.label(), error.message());
    }
    anyhow::anyhow!("registration rejected: {} field(s) need correction", errors.len())
}

fn handle_route(config: &Config, cmd: &RouteCommand) -> anyhow::Result<()> {
    let url = Url::parse(&cmd.url).with_context(|| format!("invalid URL: {}", cmd.url))?;
    let router = Router::from_url(&config.router, &url);
    let view = router.view();

    println!("View:      {view}");
    println!("Title:     {}", view.title());
    println!("Subtitle:  {}", view.subtitle());
    println!("Footer:    {}", view.footer_link_label());

    if let Some(token) = share::token_from_url(&url, &config.share.query_param) {
        match share::decode_links(&token) {
            Ok(links) => println!("Shared documents: {}", links.len()),
            Err(e) => println!("Shared documents: ignored ({e})"),
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
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
                println!("[Share]");
                println!("  Base URL:           {}", config.share.base_url);
                println!("  Query parameter:    {}", config.share.query_param);
                println!();
                println!("[Router]");
                println!("  Admin fragment:     #{}", config.router.admin_fragment);
                println!();
                println!("[Signature]");
                println!(
                    "  Surface:            {}x{}",
                    config.signature.width, config.signature.height
                );
                println!(
                    "  Stroke:             {} ({} px)",
                    config.signature.stroke_color, config.signature.line_width
                );
                println!("  Stamp colour:       {}", config.signature.stamp_color);
                println!();
                println!("[Report]");
                println!("  Title:              {}", config.report.title);
                println!("  File name:          {}", config.report.file_name);
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

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [s/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    )
}

fn wait_for_enter() -> anyhow::Result<()> {
    print!("    (Enter para continuar) ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}
