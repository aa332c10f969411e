use std::path::{Path, PathBuf};

use anyhow::Context;

use tally_core::{categorize, summarize, CategoryTotal, Flow, UNCATEGORISED};
use tally_import::{download_export, load_export_file, BlobLocation, CsvError};
use tally_storage::RuleStore;

use crate::{STORAGE_ACCOUNT_URL_VAR, STORAGE_SAS_TOKEN_VAR};

pub fn default_rules_path() -> anyhow::Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "tally", "Tally")
        .context("could not determine the user data directory")?;
    Ok(dirs.data_dir().join("categories.json"))
}

pub async fn report(
    rules_path: &Path,
    file: Option<PathBuf>,
    container: &str,
    blob: &str,
) -> anyhow::Result<()> {
    let export = match file {
        Some(path) => path,
        None => match fetch_export(container, blob).await? {
            Some(path) => path,
            None => return Ok(()),
        },
    };

    let mut transactions = match load_export_file(&export) {
        Ok(txs) => txs,
        Err(CsvError::NoDataRows) => {
            println!("Export is empty; nothing to categorise.");
            return Ok(());
        }
        Err(e) => return Err(e).context(format!("could not load {}", export.display())),
    };

    let store = RuleStore::load(rules_path);
    categorize(&mut transactions, store.rules());

    let expenses = transactions.iter().filter(|t| t.is_expense()).count();
    let payments = transactions.iter().filter(|t| t.is_payment()).count();
    let uncategorised = transactions
        .iter()
        .filter(|t| t.category == UNCATEGORISED)
        .count();
    println!(
        "{} transactions loaded ({expenses} expenses, {payments} payments), {uncategorised} uncategorised",
        transactions.len()
    );

    print_summary("Expenses (Debits)", &summarize(&transactions, Flow::Debit));
    print_summary("Payments (Credits)", &summarize(&transactions, Flow::Credit));
    Ok(())
}

pub fn add_category(rules_path: &Path, name: &str) -> anyhow::Result<()> {
    let mut store = RuleStore::load(rules_path);
    if store.create_category(name)? {
        println!("Created category '{}'", name.trim());
    } else {
        println!("Category '{}' already exists", name.trim());
    }
    Ok(())
}

pub fn list_categories(rules_path: &Path) -> anyhow::Result<()> {
    let store = RuleStore::load(rules_path);
    for (name, keywords) in store.rules().categories() {
        if keywords.is_empty() {
            println!("{name}");
        } else {
            println!("{name}: {}", keywords.join(", "));
        }
    }
    Ok(())
}

pub fn learn(rules_path: &Path, category: &str, narrative: &str) -> anyhow::Result<()> {
    let mut store = RuleStore::load(rules_path);
    if store.record_correction(category, narrative)? {
        println!("Learned '{}' for '{category}'", narrative.trim().to_lowercase());
    } else {
        println!("Nothing to learn; rule already covered");
    }
    Ok(())
}

/// Resolves the blob store from the environment and downloads the export
/// into the system temp dir. Returns `None` (after telling the user) when
/// the store is unconfigured or unreachable: no data is not an error.
async fn fetch_export(container: &str, blob: &str) -> anyhow::Result<Option<PathBuf>> {
    let account_url = match std::env::var(STORAGE_ACCOUNT_URL_VAR) {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            println!(
                "No export file given and {STORAGE_ACCOUNT_URL_VAR} is not set; \
                 nothing to categorise."
            );
            return Ok(None);
        }
    };

    let location = BlobLocation {
        account_url,
        container: container.to_string(),
        blob: blob.to_string(),
        sas_token: std::env::var(STORAGE_SAS_TOKEN_VAR).ok(),
    };

    let dest = std::env::temp_dir().join(blob);
    match download_export(&location, &dest).await {
        Ok(path) => Ok(Some(path)),
        Err(e) => {
            tracing::warn!("Export download failed: {e}");
            println!("No transaction data available.");
            Ok(None)
        }
    }
}

fn print_summary(title: &str, rows: &[CategoryTotal]) {
    println!("\n{title}");
    for row in rows {
        println!("  {:<24} {:>12}", row.category, row.total.to_string());
    }
}
