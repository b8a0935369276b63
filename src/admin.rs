//! Admin replace pipeline: dry-run validation of an uploaded products file,
//! backup of the current file, atomic swap, cache invalidation.
//!
//! Validation here is deliberately stricter than load-time parsing: the
//! loader coerces `is_active` (anything but "1" reads as inactive) and skips
//! bad rows, while the validator rejects anything but a literal "0"/"1" and
//! reports every violation. The two paths stay separate.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Local;
use rust_decimal::Decimal;
use tempfile::NamedTempFile;
use tracing::info;

use crate::codec::{self, Header};
use crate::store::ProductStore;
use crate::{Result, StorefrontError};

/// Columns an uploaded products file must carry. `images` is optional: image
/// paths are resolved from the SKU by the asset layer, not the upload.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "sku", "title", "price", "old_price", "category", "volume_ml", "color", "stock", "is_active",
    "description",
];

/// Dry-run validation of uploaded products content.
///
/// Parses `content` as a products file without touching the live store or
/// the backing file, and collects every violation rather than stopping at
/// the first. An empty result means the content is safe to swap in.
pub fn validate_products_csv(content: &str) -> Vec<String> {
    let mut errors = Vec::new();
    let mut lines = content.lines();

    let header = match lines.next().map(Header::parse) {
        Some(Ok(header)) => header,
        Some(Err(_)) | None => {
            errors.push("file is empty or has no header row".to_string());
            return errors;
        }
    };

    let missing = header.missing(&REQUIRED_COLUMNS);
    if !missing.is_empty() {
        errors.push(format!("missing required columns: {}", missing.join(", ")));
    }

    let mut seen_skus = std::collections::HashSet::new();
    let mut row_num = 1;
    for line in lines {
        row_num += 1;
        if line.trim().is_empty() {
            continue;
        }
        let cells = match codec::split_row(line) {
            Ok(cells) => cells,
            Err(err) => {
                errors.push(format!("row {row_num}: {err}"));
                continue;
            }
        };

        let sku = header.field(&cells, "sku").trim();
        if sku.is_empty() {
            errors.push(format!("row {row_num}: sku must not be empty"));
        } else if !seen_skus.insert(sku.to_string()) {
            errors.push(format!("row {row_num}: duplicate sku {sku:?}"));
        }

        if header.field(&cells, "title").trim().is_empty() {
            errors.push(format!("row {row_num}: title must not be empty"));
        }

        check_price(&mut errors, row_num, "price", header.field(&cells, "price"), true);
        check_price(&mut errors, row_num, "old_price", header.field(&cells, "old_price"), false);

        let stock = header.field(&cells, "stock").trim();
        if !stock.is_empty() && stock.parse::<u32>().is_err() {
            errors.push(format!(
                "row {row_num}: stock must be a non-negative integer, got {stock:?}"
            ));
        }

        let is_active = header.field(&cells, "is_active").trim();
        if is_active != "0" && is_active != "1" {
            errors.push(format!(
                "row {row_num}: is_active must be exactly \"0\" or \"1\", got {is_active:?}"
            ));
        }
    }

    if seen_skus.is_empty() {
        errors.push("file contains no product rows".to_string());
    }
    errors
}

fn check_price(errors: &mut Vec<String>, row_num: usize, column: &str, raw: &str, required: bool) {
    let raw = raw.trim();
    if raw.is_empty() {
        if required {
            errors.push(format!("row {row_num}: {column} is required"));
        }
        return;
    }
    match raw.parse::<Decimal>() {
        Ok(value) if value < Decimal::ZERO => {
            errors.push(format!("row {row_num}: {column} must not be negative"));
        }
        Ok(_) => {}
        Err(_) => errors.push(format!("row {row_num}: {column} is not a number: {raw:?}")),
    }
}

/// Validates, backs up, swaps in and reloads an uploaded products file.
///
/// On any validation violation the live store and backing file are left
/// completely untouched and the full violation list is returned. The swap
/// itself stages the new content in a temp file on the same volume and
/// renames it over the canonical path; the backup taken beforehand means a
/// failure after that point loses no data.
pub fn replace_products(store: &ProductStore, new_content: &str) -> Result<()> {
    let violations = validate_products_csv(new_content);
    if !violations.is_empty() {
        return Err(StorefrontError::Validation(violations));
    }

    let path = store.path();
    if path.exists() {
        let backup = backup_path(path);
        fs::copy(path, &backup).map_err(StorefrontError::StoreUnavailable)?;
        info!(backup = %backup.display(), "backed up current products file");
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(StorefrontError::StoreUnavailable)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(StorefrontError::StoreUnavailable)?;
    tmp.write_all(new_content.as_bytes())
        .map_err(StorefrontError::StoreUnavailable)?;
    tmp.flush().map_err(StorefrontError::StoreUnavailable)?;
    tmp.persist(path)
        .map_err(|err| StorefrontError::StoreUnavailable(err.error))?;

    store.load()?;
    info!(products = store.count(), "products file replaced and cache reloaded");
    Ok(())
}

fn backup_path(path: &Path) -> std::path::PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".backup.{stamp}"));
    std::path::PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GOOD: &str = "sku,title,price,old_price,category,volume_ml,color,stock,is_active,description\n\
                        TEA-001,Green tea,450,520,tea,250,green,12,1,loose leaf\n\
                        CUP-9,Cup,150,,cups,,white,3,0,\n";

    #[test]
    fn good_content_passes() {
        assert!(validate_products_csv(GOOD).is_empty());
    }

    #[test]
    fn missing_column_is_reported() {
        let content = "sku,title,old_price,category,volume_ml,color,stock,is_active,description\n\
                       TEA-001,Tea,,tea,,,1,1,\n";
        let errors = validate_products_csv(content);
        assert!(errors.iter().any(|e| e.contains("missing required columns") && e.contains("price")));
    }

    #[test]
    fn all_violations_are_collected() {
        let content = "sku,title,price,old_price,category,volume_ml,color,stock,is_active,description\n\
                       ,No sku,10,,,,,1,1,\n\
                       TEA-001,,abc,-5,,,,many,yes,\n\
                       TEA-001,Dup,10,,,,,1,1,\n";
        let errors = validate_products_csv(content);
        assert!(errors.iter().any(|e| e.contains("sku must not be empty")));
        assert!(errors.iter().any(|e| e.contains("title must not be empty")));
        assert!(errors.iter().any(|e| e.contains("price is not a number")));
        assert!(errors.iter().any(|e| e.contains("old_price must not be negative")));
        assert!(errors.iter().any(|e| e.contains("stock must be a non-negative integer")));
        assert!(errors.iter().any(|e| e.contains("is_active must be exactly")));
        assert!(errors.iter().any(|e| e.contains("duplicate sku")));
    }

    #[test]
    fn validator_is_stricter_than_loader_for_is_active() {
        // "true" loads as inactive without complaint, but is rejected here.
        let content = "sku,title,price,old_price,category,volume_ml,color,stock,is_active,description\n\
                       TEA-001,Tea,10,,,,,1,true,\n";
        let errors = validate_products_csv(content);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("is_active"));
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(!validate_products_csv("").is_empty());
        let header_only = "sku,title,price,old_price,category,volume_ml,color,stock,is_active,description\n";
        let errors = validate_products_csv(header_only);
        assert!(errors.iter().any(|e| e.contains("no product rows")));
    }

    #[test]
    fn rejected_upload_leaves_store_and_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.csv");
        fs::write(&path, GOOD).unwrap();
        let store = ProductStore::open(&path).unwrap();
        assert!(store.get("TEA-001").is_some());

        let bad = "sku,title,old_price,category,volume_ml,color,stock,is_active,description\n\
                   NEW-1,New,,,,,1,1,\n";
        let err = replace_products(&store, bad).unwrap_err();
        match err {
            StorefrontError::Validation(violations) => {
                assert!(violations.iter().any(|v| v.contains("price")));
            }
            other => panic!("expected validation failure, got {other}"),
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), GOOD);
        assert!(store.get("TEA-001").is_some());
        assert!(store.get("NEW-1").is_none());
    }

    #[test]
    fn successful_replace_swaps_backs_up_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.csv");
        fs::write(&path, GOOD).unwrap();
        let store = ProductStore::open(&path).unwrap();

        let replacement = "sku,title,price,old_price,category,volume_ml,color,stock,is_active,description\n\
                           POT-7,Teapot,900,,teaware,,,2,1,cast iron\n";
        replace_products(&store, replacement).unwrap();

        // Live cache observes the new data, old SKU is gone.
        assert!(store.get("TEA-001").is_none());
        assert_eq!(store.get("POT-7").unwrap().title, "Teapot");
        assert_eq!(fs::read_to_string(&path).unwrap(), replacement);

        // A timestamped backup of the previous file exists.
        let backups: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| {
                let name = entry.unwrap().file_name().into_string().unwrap();
                name.contains(".backup.").then_some(name)
            })
            .collect();
        assert_eq!(backups.len(), 1);
        let backup_content = fs::read_to_string(dir.path().join(&backups[0])).unwrap();
        assert_eq!(backup_content, GOOD);
    }

    #[test]
    fn replace_into_missing_file_works_without_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.csv");
        let store = ProductStore::open(&path).unwrap();
        assert_eq!(store.count(), 0);

        replace_products(&store, GOOD).unwrap();
        assert_eq!(store.count(), 2);
        assert_eq!(store.active_count(), 1);
    }
}
