use anyhow::{Context, Result};
use prodsim_core::ProductRecord;
use std::fs;
use std::path::Path;
use tracing::info;

/// Read a product catalog.
///
/// Accepts either a JSON array of records or JSON Lines with one record per
/// non-empty line.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<ProductRecord>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;

    let records = parse_catalog(&content)
        .with_context(|| format!("Failed to parse catalog {}", path.display()))?;
    info!("Loaded {} products from {:?}", records.len(), path);
    Ok(records)
}

/// Parse catalog text in either supported layout.
pub fn parse_catalog(content: &str) -> Result<Vec<ProductRecord>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Invalid JSON array of product records");
    }

    let mut records = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: ProductRecord = serde_json::from_str(line)
            .with_context(|| format!("Invalid product record on line {}", line_no + 1))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodsim_core::ProductId;
    use std::io::Write;

    #[test]
    fn test_parse_json_array() {
        let records = parse_catalog(
            r#"[
                {"id": 1, "name": "Face Cream", "brand": "CeraVe", "features": {"size": "50ml"}},
                {"id": "sku-2", "name": "Serum", "price": 12.5}
            ]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, ProductId::Integer(1));
        assert_eq!(records[1].id, ProductId::String("sku-2".to_string()));
        assert_eq!(records[1].price, Some(12.5));
    }

    #[test]
    fn test_parse_json_lines() {
        let records = parse_catalog(
            "{\"id\": 1, \"name\": \"Lipstick\"}\n\n{\"id\": 2, \"name\": \"Lip Gloss\"}\n",
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name.as_deref(), Some("Lip Gloss"));
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let err = parse_catalog("{\"id\": 1}\n{not json}\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_empty_file_is_empty_catalog() {
        assert!(parse_catalog("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_load_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"id\": 7, \"name\": \"Running Shoes\"}}").unwrap();
        let records = load_catalog(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(load_catalog("/definitely/not/here.json").is_err());
    }
}
