use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vet_records::config::DEFAULT_CONFIG_FILE;
use vet_records::{Clinic, ClinicConfig, VERSION};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vet_records=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("report");
    let config_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let config = ClinicConfig::load(&config_path)?;
    info!("vet-records v{} using data dir {}", VERSION, config.data_dir.display());

    match command {
        "import" => run_import(&config),
        "report" => run_report(&config),
        "export" => run_export(&config),
        other => {
            eprintln!("❌ Unknown command: {}", other);
            eprintln!("   Usage: vet-records [import|report|export] [config.toml]");
            std::process::exit(2);
        }
    }
}

/// CSV files → snapshots
fn run_import(config: &ClinicConfig) -> Result<()> {
    println!("📥 Import: CSV → snapshots");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut clinic = Clinic::new();

    println!("\n📂 Loading CSV from {}...", config.data_dir.display());
    let summary = clinic
        .import_csv(config)
        .context("Failed to import CSV files")?;
    println!("✓ {} animals, {} owners", clinic.animals().len(), clinic.owners().len());
    if !summary.owners_all_added {
        println!("⚠️  Some owner rows were skipped (duplicate username or id)");
    }

    println!("\n💾 Saving snapshots...");
    clinic.save_state(config).context("Failed to save snapshots")?;
    println!("✓ Wrote {}", config.animals_snapshot_path().display());
    println!("✓ Wrote {}", config.owners_snapshot_path().display());

    Ok(())
}

fn run_report(config: &ClinicConfig) -> Result<()> {
    let clinic = restore(config)?;

    print_section("🐾 Animals", clinic.animals().animal_names());
    print_section("💉 Vaccines per animal", clinic.animals().vaccine_count_report());
    print_section("🏷️  Brands in use", clinic.animals().unique_brands_report());
    print_section("⏰ Expired vaccines", clinic.animals().expired_vaccines_report());
    print_section("👤 Owners", clinic.owners_report()?);
    print_section("🔗 Animals and owners", clinic.animals_and_owners_report()?);

    Ok(())
}

/// Snapshots → CSV files + expired-vaccine report
fn run_export(config: &ClinicConfig) -> Result<()> {
    let clinic = restore(config)?;

    println!("📤 Export: snapshots → CSV");
    clinic.export_csv(config).context("Failed to export CSV files")?;
    println!("✓ Wrote {}", config.animals_csv_path().display());
    println!("✓ Wrote {}", config.vaccines_csv_path().display());
    println!("✓ Wrote {}", config.owners_csv_path().display());

    let expired = clinic
        .write_expired_report(config)
        .context("Failed to write expired-vaccine report")?;
    println!("✓ {} expired vaccines → {}", expired, config.expired_report_path().display());

    Ok(())
}

fn restore(config: &ClinicConfig) -> Result<Clinic> {
    let mut clinic = Clinic::new();
    if !snapshots_exist(config) {
        eprintln!("❌ Snapshots not found in {}", config.data_dir.display());
        eprintln!("   Run: vet-records import");
        std::process::exit(1);
    }

    clinic.load_state(config).context("Failed to load snapshots")?;
    Ok(clinic)
}

fn snapshots_exist(config: &ClinicConfig) -> bool {
    [config.animals_snapshot_path(), config.owners_snapshot_path()]
        .iter()
        .all(|p| p.exists())
}

fn print_section(title: &str, lines: Vec<String>) {
    println!("\n{}", title);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if lines.is_empty() {
        println!("(none)");
    }
    for line in lines {
        println!("{}", line);
    }
}
