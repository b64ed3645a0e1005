/*!
Savepoint CLI - Command-line interface for savepoint save directories.

This CLI provides utilities for inspecting, verifying and repairing the
save slots of a local save directory without launching the game.
*/

use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use savepoint_core::{SaveConfig, SaveManager, SlotSummary};
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "savepoint")]
#[command(about = "CLI for inspecting, verifying and repairing save directories")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Save directory to operate on
    #[arg(short, long, global = true, default_value = "./saves")]
    path: PathBuf,

    /// Engine configuration file; falls back to <path>/savepoint.json,
    /// then to built-in defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all save slots
    List,
    /// Show details of one slot
    Show {
        /// Slot index
        slot: usize,
    },
    /// Check that a slot's artifact decodes cleanly
    Verify {
        /// Slot index
        slot: usize,
    },
    /// Restore a corrupt slot from its newest valid backup
    Repair {
        /// Slot index
        slot: usize,
    },
    /// Delete a slot with its metadata, screenshot and backups
    Delete {
        /// Slot index
        slot: usize,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// List the retained backups for a slot
    Backups {
        /// Slot index
        slot: usize,
    },
}

#[derive(Tabled)]
struct SlotRow {
    #[tabled(rename = "Slot")]
    slot: usize,
    #[tabled(rename = "Saved")]
    saved: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Scene")]
    scene: String,
    #[tabled(rename = "Play time")]
    play_time: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Valid")]
    valid: String,
    #[tabled(rename = "Backups")]
    backups: usize,
}

#[derive(Tabled)]
struct BackupRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Size")]
    size: String,
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let mut manager = SaveManager::new(&cli.path, config)?;

    match cli.command {
        Commands::List => list_slots(&manager)?,
        Commands::Show { slot } => show_slot(&manager, slot)?,
        Commands::Verify { slot } => verify_slot(&manager, slot)?,
        Commands::Repair { slot } => repair_slot(&mut manager, slot)?,
        Commands::Delete { slot, force } => delete_slot(&mut manager, slot, force)?,
        Commands::Backups { slot } => list_backups(&manager, slot)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"))
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<SaveConfig, anyhow::Error> {
    if let Some(path) = &cli.config {
        return Ok(SaveConfig::load(path)?);
    }

    let in_dir = cli.path.join("savepoint.json");
    if in_dir.exists() {
        info!("Using configuration from {}", in_dir.display());
        return Ok(SaveConfig::load(in_dir)?);
    }

    Ok(SaveConfig::default())
}

fn list_slots(manager: &SaveManager) -> Result<(), anyhow::Error> {
    let rows: Vec<SlotRow> = manager
        .list_slots()?
        .into_iter()
        .filter_map(slot_row)
        .collect();

    if rows.is_empty() {
        println!("No saves found in {}", manager.layout().root().display());
    } else {
        println!("{}", Table::new(rows));
    }

    Ok(())
}

fn slot_row(summary: SlotSummary) -> Option<SlotRow> {
    let metadata = summary.metadata?;
    Some(SlotRow {
        slot: summary.slot,
        saved: format_timestamp(&metadata.saved_at),
        level: metadata
            .player_level
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string()),
        scene: metadata.scene.unwrap_or_else(|| "-".to_string()),
        play_time: format_play_time(metadata.play_time_seconds),
        size: format_size(metadata.file_size),
        valid: if metadata.valid { "yes" } else { "?" }.to_string(),
        backups: summary.backup_count,
    })
}

fn show_slot(manager: &SaveManager, slot: usize) -> Result<(), anyhow::Error> {
    let Some(metadata) = manager.metadata(slot)? else {
        println!("Slot {slot} is empty");
        return Ok(());
    };

    println!("Slot {slot}:");
    println!("  Saved: {}", format_timestamp(&metadata.saved_at));
    println!("  Play time: {}", format_play_time(metadata.play_time_seconds));
    println!("  Size: {}", format_size(metadata.file_size));
    if let Some(level) = metadata.player_level {
        println!("  Player level: {level}");
    }
    if let Some(scene) = &metadata.scene {
        println!("  Scene: {scene}");
    }
    if let Some(hash) = &metadata.content_hash {
        println!("  Content hash: {hash}");
    }
    if !metadata.valid {
        println!("  (summary synthesized from file attributes)");
    }

    match manager.read_record(slot) {
        Ok(record) => {
            println!("  Format version: {}", record.format_version);
            println!("  Save id: {}", record.save_id);
            println!(
                "  Sections: {}",
                record
                    .sections
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Err(e) => {
            warn!("Primary artifact does not decode: {e}");
            println!("  Primary artifact is corrupt; try `savepoint repair {slot}`");
        }
    }

    Ok(())
}

fn verify_slot(manager: &SaveManager, slot: usize) -> Result<(), anyhow::Error> {
    if !manager.slot_exists(slot) {
        return Err(anyhow::anyhow!("slot {slot} is empty"));
    }
    if manager.validate_slot(slot) {
        println!("✓ Slot {slot} decodes cleanly");
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "slot {slot} failed validation; try `savepoint repair {slot}`"
        ))
    }
}

fn repair_slot(manager: &mut SaveManager, slot: usize) -> Result<(), anyhow::Error> {
    if manager.validate_slot(slot) {
        println!("Slot {slot} is already healthy, nothing to repair");
        return Ok(());
    }

    if manager.repair_slot(slot)? {
        println!("✓ Slot {slot} restored from its newest valid backup");
        Ok(())
    } else {
        Err(anyhow::anyhow!("no decodable backup found for slot {slot}"))
    }
}

fn delete_slot(manager: &mut SaveManager, slot: usize, force: bool) -> Result<(), anyhow::Error> {
    if !force {
        print!("Are you sure you want to delete slot {slot} and its backups? (y/N): ");
        use std::io::{self, Write};
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().to_lowercase().starts_with('y') {
            println!("Deletion cancelled");
            return Ok(());
        }
    }

    manager.delete_slot(slot)?;
    println!("✓ Slot {slot} deleted");
    Ok(())
}

fn list_backups(manager: &SaveManager, slot: usize) -> Result<(), anyhow::Error> {
    let backups = manager.backups(slot)?;
    if backups.is_empty() {
        println!("No backups for slot {slot}");
        return Ok(());
    }

    let rows: Vec<BackupRow> = backups
        .into_iter()
        .map(|entry| {
            let size = std::fs::metadata(&entry.path)
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|_| "?".to_string());
            BackupRow {
                file: entry
                    .path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string(),
                created: format_timestamp(&entry.created_at),
                size,
            }
        })
        .collect();

    println!("{}", Table::new(rows));
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn format_play_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs:02}s")
    } else {
        format!("{secs}s")
    }
}
