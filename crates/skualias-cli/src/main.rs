use clap::{Parser, Subcommand};
use colored::Colorize;
use skualias_canon::canonicalize;
use skualias_model::BatchReport;
use skualias_plan::{plan_additions, plan_removals};
use skualias_store::{Catalog, StoreError};
use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;
use std::process;

mod store_file;

use store_file::JsonStore;

/// skualias — search products and manage alternate SKU codes.
///
/// Exit codes: 0 success, 1 policy or per-code failure, 2 usage/store error.
#[derive(Parser)]
#[command(name = "skualias", version, about, long_about = None)]
struct Cli {
    /// Path to the JSON product store (default: $SKUALIAS_STORE)
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products, optionally filtered by a name substring
    Search {
        /// Case-insensitive substring of the product name
        query: Option<String>,
    },

    /// Show one product's primary SKU and aliases
    Show {
        /// Primary SKU of the product
        primary: String,
    },

    /// Add aliases from a freeform block (commas, semicolons, newlines)
    Add {
        /// Primary SKU of the product
        primary: String,
        /// SKU block; scientific notation like 5.6061E+11 is supported
        codes: Vec<String>,
    },

    /// Remove selected aliases (the primary SKU is never removable)
    Remove {
        /// Primary SKU of the product
        primary: String,
        /// Aliases to remove
        codes: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            2
        }
    };
    process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32, StoreError> {
    let path = store_path(&cli)?;
    let store = JsonStore::open(&path)?;
    let mut catalog = Catalog::new(store);

    match cli.command {
        Commands::Search { query } => {
            let rows = catalog.search(query.as_deref())?;
            if rows.is_empty() {
                println!("{}", "No products match.".yellow());
                return Ok(0);
            }
            for p in &rows {
                println!(
                    "{}  {}  ({} aliases)",
                    p.primary_sku.bold(),
                    p.name,
                    p.aliases().len()
                );
            }
            Ok(0)
        }

        Commands::Show { primary } => {
            let Some(p) = catalog.find_by_primary(&canonicalize(&primary))? else {
                eprintln!("{} no product with primary SKU `{primary}`", "error:".red().bold());
                return Ok(2);
            };
            println!("Name:    {}", p.name);
            println!("Primary: {}", p.primary_sku.bold());
            let aliases = p.aliases();
            if aliases.is_empty() {
                println!("Aliases: {}", "none".yellow());
            } else {
                println!("Aliases: {}", aliases.join(", "));
            }
            Ok(0)
        }

        Commands::Add { primary, codes } => {
            let Some(p) = catalog.find_by_primary(&canonicalize(&primary))? else {
                eprintln!("{} no product with primary SKU `{primary}`", "error:".red().bold());
                return Ok(2);
            };
            let raw = codes.join("\n");
            let plan = plan_additions(
                &p.primary_sku,
                p.all_skus.iter().map(String::as_str),
                &raw,
            );
            if plan.is_empty() {
                println!(
                    "{}",
                    "Nothing to add: every SKU is already associated.".yellow()
                );
                return Ok(0);
            }
            println!("Adding {} alias(es)...", plan.len());
            let report = catalog.add_aliases(&p.product_id, &plan);
            print_report(&report);
            Ok(if report.failed.is_empty() { 0 } else { 1 })
        }

        Commands::Remove { primary, codes } => {
            let Some(p) = catalog.find_by_primary(&canonicalize(&primary))? else {
                eprintln!("{} no product with primary SKU `{primary}`", "error:".red().bold());
                return Ok(2);
            };
            let requested: BTreeSet<String> = codes
                .iter()
                .map(|c| canonicalize(c))
                .filter(|c| !c.is_empty())
                .collect();
            let plan = match plan_removals(&p.primary_sku, &requested) {
                Ok(plan) => plan,
                Err(err) => {
                    eprintln!("{} {err}", "refused:".red().bold());
                    return Ok(1);
                }
            };
            let report = catalog.remove_aliases(&p.product_id, &plan);
            print_report(&report);
            Ok(if report.failed.is_empty() { 0 } else { 1 })
        }
    }
}

fn store_path(cli: &Cli) -> Result<PathBuf, StoreError> {
    cli.store
        .clone()
        .or_else(|| env::var_os("SKUALIAS_STORE").map(PathBuf::from))
        .ok_or_else(|| {
            StoreError::Storage("no store configured: pass --store or set SKUALIAS_STORE".into())
        })
}

fn print_report(report: &BatchReport) {
    if !report.succeeded.is_empty() {
        println!("{} {}", "ok:".green().bold(), report.succeeded.join(", "));
    }
    for skip in &report.skipped {
        println!("{} {} ({})", "skipped:".yellow().bold(), skip.code, skip.reason);
    }
    if !report.failed.is_empty() {
        eprintln!("{}", "failed:".red().bold());
        for fail in &report.failed {
            eprintln!("  {}: {}", fail.code, fail.detail);
        }
    }
}
