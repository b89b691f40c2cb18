//! # CLI Layer
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Handles argument parsing
//! - Formats output for human consumption
//!
//! ## Flow
//!
//! 1. **Argument Parsing**: clap turns the shell arguments into [`Commands`]
//! 2. **Context Setup**: [`initialize`] loads config and opens the coordinator
//! 3. **Dispatch**: each handler resolves selectors and calls the coordinator
//! 4. **Flush**: mutating handlers run inside a [`SuspendGuard`]; its drop flushes
//! 5. **Output**: the handler's string is printed only after the flush
//!
//! Handlers return the text to print instead of printing it, so the order above holds
//! even when a handler fails halfway.

use super::render::{render_pages, render_success, render_tree};
use super::setup::{init_logging, Cli, Commands};
use chrono::Utc;
use clap::Parser;
use mathnotesapp::config::MathNotesConfig;
use mathnotesapp::drawing::{InkDrawing, Point, Stroke};
use mathnotesapp::error::{MathNotesError, Result};
use mathnotesapp::init::{default_data_dir, initialize, FsCoordinator, MathNotesContext};
use mathnotesapp::lifecycle::SuspendGuard;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let data_dir = default_data_dir()?;
    let mut ctx = initialize(&data_dir)?;

    // Naked mathnotes lists
    let command = cli.command.unwrap_or(Commands::List);
    debug!(?command, "dispatching");

    let output = match command {
        Commands::Config { key, value } => {
            handle_config(&mut ctx, key.as_deref(), value.as_deref())?
        }
        command if command.is_mutating() => {
            let mut guard = SuspendGuard::new(&mut ctx.coordinator);
            dispatch(guard.target(), command)?
        }
        command => dispatch(&mut ctx.coordinator, command)?,
    };

    print!("{}", output);
    Ok(())
}

fn dispatch(coordinator: &mut FsCoordinator, command: Commands) -> Result<String> {
    match command {
        Commands::List => handle_list(coordinator),
        Commands::NewFolder { name } => handle_new_folder(coordinator, name),
        Commands::NewFile { folder, name } => handle_new_file(coordinator, &folder, name),
        Commands::RenameFolder { folder, name } => {
            handle_rename_folder(coordinator, &folder, name)
        }
        Commands::RenameFile { file, name } => handle_rename_file(coordinator, &file, name),
        Commands::Draw {
            file,
            page,
            points,
            color,
            width,
        } => {
            let mut stroke = Stroke::new(parse_points(&points)?);
            if let Some(color) = color {
                stroke.color = color;
            }
            if let Some(width) = width {
                stroke.width = width;
            }
            stroke.validate()?;
            handle_draw(coordinator, &file, page, stroke)
        }
        Commands::Erase { file, page } => handle_erase(coordinator, &file, page),
        Commands::Pages { file } => handle_pages(coordinator, &file),
        Commands::Show { file, page } => handle_show(coordinator, &file, page),
        Commands::Config { .. } => Err(MathNotesError::Api(
            "config is handled before dispatch".to_string(),
        )),
    }
}

// --- Selectors ---

fn resolve_folder(coordinator: &FsCoordinator, selector: &str) -> Result<Uuid> {
    coordinator
        .index()
        .find_collection(selector)
        .map(|c| c.id)
        .ok_or_else(|| MathNotesError::Api(format!("No folder matches '{}'", selector)))
}

fn resolve_file(coordinator: &FsCoordinator, selector: &str) -> Result<Uuid> {
    coordinator
        .index()
        .find_document(selector)
        .map(|d| d.id())
        .ok_or_else(|| {
            MathNotesError::Api(format!(
                "No file matches '{}' (use Folder/File or a uuid)",
                selector
            ))
        })
}

/// `Folder/File` for messages.
fn display_path(coordinator: &FsCoordinator, document_id: Uuid) -> Result<String> {
    let folder = coordinator.index().owner_of(document_id)?;
    let document = coordinator.document(document_id)?;
    Ok(format!("{}/{}", folder.name, document.name()))
}

/// Parse `"x,y x,y ..."` into stroke points.
pub fn parse_points(input: &str) -> Result<Vec<Point>> {
    let points = input
        .split_whitespace()
        .map(|pair| -> Result<Point> {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| MathNotesError::Api(format!("Bad point '{}', expected x,y", pair)))?;
            let coord = |v: &str| {
                v.trim()
                    .parse::<f32>()
                    .ok()
                    .filter(|c| c.is_finite())
                    .ok_or_else(|| MathNotesError::Api(format!("Bad coordinate '{}' in '{}'", v, pair)))
            };
            Ok(Point {
                x: coord(x)?,
                y: coord(y)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if points.is_empty() {
        return Err(MathNotesError::Api("A stroke needs at least one point".to_string()));
    }
    Ok(points)
}

// --- Handlers ---

fn handle_list(coordinator: &FsCoordinator) -> Result<String> {
    Ok(render_tree(coordinator.index(), Utc::now()))
}

fn handle_new_folder(coordinator: &mut FsCoordinator, name: String) -> Result<String> {
    let message = format!("Created folder {}", name);
    let id = coordinator.add_collection(name);
    debug!(%id, "folder created");
    Ok(render_success(&message))
}

fn handle_new_file(coordinator: &mut FsCoordinator, folder: &str, name: String) -> Result<String> {
    let folder_id = resolve_folder(coordinator, folder)?;
    let id = coordinator.add_document(folder_id, name)?;
    Ok(render_success(&format!(
        "Created file {}",
        display_path(coordinator, id)?
    )))
}

fn handle_rename_folder(
    coordinator: &mut FsCoordinator,
    folder: &str,
    name: String,
) -> Result<String> {
    let id = resolve_folder(coordinator, folder)?;
    let message = format!("Renamed folder {} to {}", folder, name);
    coordinator.rename_collection(id, name)?;
    Ok(render_success(&message))
}

fn handle_rename_file(coordinator: &mut FsCoordinator, file: &str, name: String) -> Result<String> {
    let id = resolve_file(coordinator, file)?;
    let before = display_path(coordinator, id)?;
    coordinator.rename_document(id, name)?;
    Ok(render_success(&format!(
        "Renamed file {} to {}",
        before,
        display_path(coordinator, id)?
    )))
}

fn handle_draw(
    coordinator: &mut FsCoordinator,
    file: &str,
    page: usize,
    stroke: Stroke,
) -> Result<String> {
    let id = resolve_file(coordinator, file)?;
    let document = coordinator.document(id)?;
    let current = document
        .page(page)
        .cloned()
        .ok_or_else(|| MathNotesError::PageNotFound {
            key: document.meta().storage_key.to_string(),
            index: page,
        })?;

    let point_count = stroke.points.len();
    let mutation = coordinator.on_page_mutated(id, page, current.try_with_stroke(stroke)?)?;

    let mut message = format!(
        "Drew {} point{} on page {} of {}",
        point_count,
        if point_count == 1 { "" } else { "s" },
        page,
        display_path(coordinator, id)?
    );
    if mutation.appended_page {
        message.push_str(&format!(
            "\nAdded blank page {}",
            coordinator.document(id)?.page_count() - 1
        ));
    }
    Ok(render_success(&message))
}

fn handle_erase(coordinator: &mut FsCoordinator, file: &str, page: usize) -> Result<String> {
    let id = resolve_file(coordinator, file)?;
    coordinator.on_page_mutated(id, page, InkDrawing::default())?;
    Ok(render_success(&format!(
        "Erased page {} of {}",
        page,
        display_path(coordinator, id)?
    )))
}

fn handle_pages(coordinator: &FsCoordinator, file: &str) -> Result<String> {
    let id = resolve_file(coordinator, file)?;
    Ok(render_pages(coordinator.document(id)?))
}

fn handle_show(coordinator: &FsCoordinator, file: &str, page: Option<usize>) -> Result<String> {
    let id = resolve_file(coordinator, file)?;
    let document = coordinator.document(id)?;
    let index = page.unwrap_or_else(|| document.recognition_index());
    let payload = document
        .page(index)
        .ok_or_else(|| MathNotesError::PageNotFound {
            key: document.meta().storage_key.to_string(),
            index,
        })?;
    Ok(format!("{}\n", serde_json::to_string_pretty(payload)?))
}

// --- Config ---

const CONFIG_KEYS: [&str; 3] = ["debounce-ms", "page-file-ext", "default-collections"];

fn config_value(config: &MathNotesConfig, key: &str) -> Result<String> {
    match key {
        "debounce-ms" => Ok(config.debounce_ms.to_string()),
        "page-file-ext" => Ok(config.get_page_file_ext().to_string()),
        "default-collections" => Ok(config.default_collections.join(",")),
        _ => Err(unknown_key(key)),
    }
}

fn unknown_key(key: &str) -> MathNotesError {
    MathNotesError::Api(format!(
        "Unknown config key '{}' (expected one of: {})",
        key,
        CONFIG_KEYS.join(", ")
    ))
}

fn set_config_value(config: &mut MathNotesConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "debounce-ms" => {
            config.debounce_ms = value.trim().parse().map_err(|_| {
                MathNotesError::Api(format!("debounce-ms must be a whole number, got '{}'", value))
            })?;
        }
        "page-file-ext" => {
            if value.trim_start_matches('.').is_empty() {
                return Err(MathNotesError::Api(
                    "page-file-ext cannot be empty".to_string(),
                ));
            }
            config.set_page_file_ext(value);
        }
        "default-collections" => {
            config.default_collections = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        _ => return Err(unknown_key(key)),
    }
    Ok(())
}

fn handle_config(
    ctx: &mut MathNotesContext,
    key: Option<&str>,
    value: Option<&str>,
) -> Result<String> {
    match (key, value) {
        (None, _) => {
            let mut out = String::new();
            for key in CONFIG_KEYS {
                out.push_str(&format!("{} = {}\n", key, config_value(&ctx.config, key)?));
            }
            Ok(out)
        }
        (Some(key), None) => Ok(format!("{}\n", config_value(&ctx.config, key)?)),
        (Some("page-file-ext"), Some(value)) => {
            let mut staged = ctx.config.clone();
            set_config_value(&mut staged, "page-file-ext", value)?;
            let renamed = ctx.set_page_file_ext(staged.get_page_file_ext())?;
            debug!(renamed, "page files renamed");
            Ok(render_success(&format!(
                "page-file-ext = {}",
                ctx.config.get_page_file_ext()
            )))
        }
        (Some(key), Some(value)) => {
            set_config_value(&mut ctx.config, key, value)?;
            save_config(&ctx.config, &ctx.data_dir)?;
            Ok(render_success(&format!(
                "{} = {}",
                key,
                config_value(&ctx.config, key)?
            )))
        }
    }
}

fn save_config(config: &MathNotesConfig, data_dir: &Path) -> Result<()> {
    config.save(data_dir)?;
    debug!(data_dir = %data_dir.display(), "config saved");
    Ok(())
}
