use crate::domain::model::{BottleSizeDescriptor, STANDARD_BOTTLE_ID};
use crate::utils::error::{EnrichError, Result};
use std::collections::HashSet;

// (id, display name, volume label, ml, standard-bottle equivalent, description)
const BUILTIN_SIZES: &[(&str, &str, &str, f64, f64, &str)] = &[
    ("piccolo", "Piccolo / Split", "187.5ml", 187.5, 0.25, "Quarter bottle, single glass serving"),
    ("half", "Half / Demi", "375ml", 375.0, 0.5, "Half bottle"),
    ("standard", "Standard", "750ml", 750.0, 1.0, "Regular bottle"),
    ("magnum", "Magnum", "1.5L", 1500.0, 2.0, "2 standard bottles"),
    ("double_magnum", "Double Magnum / Jeroboam", "3L", 3000.0, 4.0, "4 standard bottles (Jeroboam for Bordeaux)"),
    ("rehoboam", "Rehoboam", "4.5L", 4500.0, 6.0, "6 standard bottles"),
    ("imperial", "Imperial / Methuselah", "6L", 6000.0, 8.0, "8 standard bottles (Methuselah for Champagne)"),
    ("salmanazar", "Salmanazar", "9L", 9000.0, 12.0, "12 standard bottles (1 case)"),
    ("balthazar", "Balthazar", "12L", 12000.0, 16.0, "16 standard bottles"),
    ("nebuchadnezzar", "Nebuchadnezzar", "15L", 15000.0, 20.0, "20 standard bottles"),
    ("solomon", "Solomon", "18L", 18000.0, 24.0, "24 standard bottles (2 cases)"),
    ("melchizedek", "Melchizedek / Midas", "30L", 30000.0, 40.0, "40 standard bottles"),
];

/// Immutable table of bottle formats, built once and shared.
#[derive(Debug, Clone)]
pub struct BottleSizeCatalog {
    sizes: Vec<BottleSizeDescriptor>,
}

impl BottleSizeCatalog {
    pub fn builtin() -> Self {
        let sizes = BUILTIN_SIZES
            .iter()
            .map(|&(id, name, volume, ml, equivalent, description)| BottleSizeDescriptor {
                id: id.to_string(),
                display_name: name.to_string(),
                volume_label: volume.to_string(),
                volume_ml: ml,
                standard_bottle_equivalent: equivalent,
                description: description.to_string(),
            })
            .collect();
        Self { sizes }
    }

    /// Builds a catalog from custom descriptors, rejecting tables without a
    /// single `standard` entry at equivalent 1.
    pub fn from_descriptors(sizes: Vec<BottleSizeDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for size in &sizes {
            if !seen.insert(size.id.as_str()) {
                return Err(EnrichError::ConfigValidationError {
                    field: "bottle_sizes".to_string(),
                    message: format!("duplicate bottle size id '{}'", size.id),
                });
            }
            if !(size.standard_bottle_equivalent > 0.0) {
                return Err(EnrichError::ConfigValidationError {
                    field: "bottle_sizes".to_string(),
                    message: format!("bottle size '{}' must have a positive equivalent", size.id),
                });
            }
        }

        let standard = sizes.iter().find(|s| s.id == STANDARD_BOTTLE_ID);
        match standard {
            Some(s) if s.standard_bottle_equivalent == 1.0 => Ok(Self { sizes }),
            Some(_) => Err(EnrichError::ConfigValidationError {
                field: "bottle_sizes".to_string(),
                message: "the standard bottle size must have an equivalent of 1".to_string(),
            }),
            None => Err(EnrichError::ConfigValidationError {
                field: "bottle_sizes".to_string(),
                message: "a 'standard' bottle size is required".to_string(),
            }),
        }
    }

    pub fn lookup(&self, id: &str) -> Option<&BottleSizeDescriptor> {
        self.sizes.iter().find(|s| s.id == id)
    }

    pub fn standard(&self) -> Option<&BottleSizeDescriptor> {
        self.lookup(STANDARD_BOTTLE_ID)
    }

    pub fn all(&self) -> &[BottleSizeDescriptor] {
        &self.sizes
    }

    /// Phrase appended to a marketplace search, empty for standard or unknown sizes.
    pub fn search_modifier(&self, id: &str) -> String {
        let size = match self.lookup(id) {
            Some(size) if !size.is_standard() => size,
            _ => return String::new(),
        };

        match size.id.as_str() {
            "half" => "half bottle 375ml".to_string(),
            "magnum" => "magnum 1.5L".to_string(),
            "double_magnum" => "double magnum 3L".to_string(),
            "imperial" => "imperial 6L".to_string(),
            _ => format!("{} {}", size.display_name, size.volume_label),
        }
    }

    pub fn format_bottle_size(&self, id: &str) -> String {
        match self.lookup(id) {
            Some(size) => format!("{} ({})", size.display_name, size.volume_label),
            None => "750ml".to_string(),
        }
    }
}

impl Default for BottleSizeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_equivalents_are_positive_with_single_standard() {
        let catalog = BottleSizeCatalog::builtin();
        assert!(catalog
            .all()
            .iter()
            .all(|s| s.standard_bottle_equivalent > 0.0));

        let unit: Vec<&str> = catalog
            .all()
            .iter()
            .filter(|s| s.standard_bottle_equivalent == 1.0)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(unit, vec!["standard"]);

        // the builtin table passes its own validation
        assert!(BottleSizeCatalog::from_descriptors(catalog.all().to_vec()).is_ok());
    }

    #[test]
    fn test_lookup() {
        let catalog = BottleSizeCatalog::builtin();
        let magnum = catalog.lookup("magnum").unwrap();
        assert_eq!(magnum.volume_ml, 1500.0);
        assert_eq!(magnum.standard_bottle_equivalent, 2.0);
        assert!(catalog.lookup("bucket").is_none());
    }

    #[test]
    fn test_search_modifier() {
        let catalog = BottleSizeCatalog::builtin();
        assert_eq!(catalog.search_modifier("standard"), "");
        assert_eq!(catalog.search_modifier("unknown"), "");
        assert_eq!(catalog.search_modifier("magnum"), "magnum 1.5L");
        assert_eq!(catalog.search_modifier("half"), "half bottle 375ml");
        assert_eq!(catalog.search_modifier("rehoboam"), "Rehoboam 4.5L");
    }

    #[test]
    fn test_format_bottle_size() {
        let catalog = BottleSizeCatalog::builtin();
        assert_eq!(catalog.format_bottle_size("magnum"), "Magnum (1.5L)");
        assert_eq!(catalog.format_bottle_size("nope"), "750ml");
    }

    #[test]
    fn test_from_descriptors_rejects_missing_standard() {
        let sizes: Vec<_> = BottleSizeCatalog::builtin()
            .all()
            .iter()
            .filter(|s| s.id != "standard")
            .cloned()
            .collect();
        assert!(BottleSizeCatalog::from_descriptors(sizes).is_err());
    }

    #[test]
    fn test_from_descriptors_rejects_duplicates_and_bad_equivalents() {
        let mut sizes = BottleSizeCatalog::builtin().all().to_vec();
        sizes.push(sizes[0].clone());
        assert!(BottleSizeCatalog::from_descriptors(sizes).is_err());

        let mut sizes = BottleSizeCatalog::builtin().all().to_vec();
        sizes[0].standard_bottle_equivalent = 0.0;
        assert!(BottleSizeCatalog::from_descriptors(sizes).is_err());
    }
}
