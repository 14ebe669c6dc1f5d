//! Validation utilities for the Pharmacy Inventory Management Platform

use uuid::Uuid;

// ============================================================================
// Catalog validations
// ============================================================================

/// Validate SKU format (3-32 chars, uppercase alphanumeric with dashes)
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.len() < 3 {
        return Err("SKU must be at least 3 characters");
    }
    if sku.len() > 32 {
        return Err("SKU must be at most 32 characters");
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("SKU must be uppercase alphanumeric with dashes only");
    }
    Ok(())
}

/// Validate a batch number (non-empty, printable, at most 64 chars)
pub fn validate_batch_number(batch_number: &str) -> Result<(), &'static str> {
    let trimmed = batch_number.trim();
    if trimmed.is_empty() {
        return Err("Batch number cannot be empty");
    }
    if trimmed.len() > 64 {
        return Err("Batch number must be at most 64 characters");
    }
    Ok(())
}

/// Validate a reorder level (non-negative)
pub fn validate_reorder_level(level: i64) -> Result<(), &'static str> {
    if level < 0 {
        return Err("Reorder level cannot be negative");
    }
    Ok(())
}

/// Generate a SKU for an imported medicine that arrived without one
///
/// Takes the first three alphanumeric characters of the name (padded with
/// `X`) plus a name-keyed digest, e.g. `PAR-9F2C41AB` for "Paracetamol".
/// Deterministic: the same name always yields the same SKU, so re-importing
/// a file whose rows carry no SKU resolves to the existing medicines instead
/// of minting duplicates.
pub fn generate_sku(name: &str) -> String {
    let mut prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase();
    while prefix.len() < 3 {
        prefix.push('X');
    }

    let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes());
    let suffix: String = digest
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_ascii_uppercase();

    format!("{}-{}", prefix, suffix)
}

// ============================================================================
// Import field normalization
// ============================================================================

/// Detect a numeric cell mangled into scientific notation by spreadsheet
/// tools (e.g. a 13-digit barcode rendered as `8.90103E+12`)
pub fn is_scientific_notation(value: &str) -> bool {
    let trimmed = value.trim();
    let Some(pos) = trimmed.find(['e', 'E']) else {
        return false;
    };
    // Mantissa and exponent must both be numeric for this to be a mangled
    // number rather than an alphanumeric code containing a letter E.
    let (mantissa, exponent) = trimmed.split_at(pos);
    let exponent = &exponent[1..];
    let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
    !mantissa.is_empty()
        && !exponent.is_empty()
        && mantissa.parse::<f64>().is_ok()
        && exponent.chars().all(|c| c.is_ascii_digit())
}

/// Normalize a raw barcode cell, discarding malformed values
pub fn normalize_barcode(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_scientific_notation(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku_valid() {
        assert!(validate_sku("PCM-500").is_ok());
        assert!(validate_sku("AMX-250-B2").is_ok());
        assert!(validate_sku("ABC").is_ok());
    }

    #[test]
    fn test_validate_sku_invalid() {
        assert!(validate_sku("ab").is_err()); // too short, lowercase
        assert!(validate_sku("pcm-500").is_err()); // lowercase
        assert!(validate_sku("PCM 500").is_err()); // space
        assert!(validate_sku(&"A".repeat(33)).is_err()); // too long
    }

    #[test]
    fn test_validate_batch_number() {
        assert!(validate_batch_number("BN-2024-001").is_ok());
        assert!(validate_batch_number("  ").is_err());
        assert!(validate_batch_number(&"B".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_reorder_level() {
        assert!(validate_reorder_level(0).is_ok());
        assert!(validate_reorder_level(100).is_ok());
        assert!(validate_reorder_level(-1).is_err());
    }

    #[test]
    fn test_generate_sku_shape() {
        let sku = generate_sku("Paracetamol 500mg");
        assert!(sku.starts_with("PAR-"));
        assert_eq!(sku.len(), 12);
        assert!(validate_sku(&sku).is_ok());
    }

    #[test]
    fn test_generate_sku_short_name_padded() {
        let sku = generate_sku("B6");
        assert!(sku.starts_with("B6X-"));
        assert!(validate_sku(&sku).is_ok());
    }

    #[test]
    fn test_generate_sku_stable_for_same_name() {
        // Re-imports of a SKU-less row must resolve to the same medicine
        assert_eq!(generate_sku("Aspirin"), generate_sku("Aspirin"));
        assert_eq!(
            generate_sku("Paracetamol 500mg"),
            generate_sku("Paracetamol 500mg")
        );
    }

    #[test]
    fn test_generate_sku_distinct_per_name() {
        assert_ne!(generate_sku("Aspirin"), generate_sku("Aspirin 75mg"));
    }

    #[test]
    fn test_scientific_notation_detected() {
        assert!(is_scientific_notation("8.90103E+12"));
        assert!(is_scientific_notation("1.23e11"));
        assert!(is_scientific_notation("5E-3"));
    }

    #[test]
    fn test_scientific_notation_not_flagged() {
        assert!(!is_scientific_notation("8901030865187"));
        assert!(!is_scientific_notation("CODE-E12")); // letter E in a code
        assert!(!is_scientific_notation("EAN"));
        assert!(!is_scientific_notation(""));
    }

    #[test]
    fn test_normalize_barcode() {
        assert_eq!(
            normalize_barcode(" 8901030865187 "),
            Some("8901030865187".to_string())
        );
        assert_eq!(normalize_barcode("8.90103E+12"), None);
        assert_eq!(normalize_barcode(""), None);
    }
}
