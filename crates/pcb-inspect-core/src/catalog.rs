//! Static descriptions and remedies for known PCB defect classes.
//!
//! Lookup is case-insensitive and total: a class the catalog does not
//! know resolves to [`DefectEntry::UNKNOWN`] instead of an error, so a
//! model whose vocabulary is larger than the catalog still renders.

/// Description and suggested remedy for one defect class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefectEntry {
    pub description: &'static str,
    pub remedy: &'static str,
}

impl DefectEntry {
    /// Fallback for classes missing from the catalog.
    pub const UNKNOWN: Self = Self {
        description: "N/A",
        remedy: "N/A",
    };
}

/// Entries shipped with the application, keyed by lower-case class name.
const BUILTIN: &[(&str, DefectEntry)] = &[
    (
        "spurious_copper",
        DefectEntry {
            description: "Unwanted copper traces present on the PCB surface.",
            remedy: "Remove using precision cutting tools or chemical etching.",
        },
    ),
    (
        "spur",
        DefectEntry {
            description: "Small, thin copper projections extending from traces.",
            remedy: "Scrape off carefully with a precision knife or rework station.",
        },
    ),
    (
        "short",
        DefectEntry {
            description: "Unintended connection between two conductors.",
            remedy: "Cut the bridging material or use desoldering tools to separate.",
        },
    ),
    (
        "open_circuit",
        DefectEntry {
            description: "Broken trace causing disconnection in the circuit path.",
            remedy: "Bridge the gap with solder or conductive ink/wire.",
        },
    ),
    (
        "mouse_bite",
        DefectEntry {
            description: "Small semicircular cutouts along the edge of traces.",
            remedy: "If severe, repair with conductive epoxy or replace the board.",
        },
    ),
    (
        "missing_hole",
        DefectEntry {
            description: "Required drill hole absent from the PCB.",
            remedy: "Drill manually with appropriate sized bit if possible.",
        },
    ),
];

/// Read-only mapping from defect-class name to [`DefectEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefectCatalog {
    entries: &'static [(&'static str, DefectEntry)],
}

impl DefectCatalog {
    /// A catalog over caller-provided entries. Keys should be lower case.
    #[must_use]
    pub const fn new(entries: &'static [(&'static str, DefectEntry)]) -> Self {
        Self { entries }
    }

    /// The six defect classes of the reference PCB defect dataset.
    #[must_use]
    pub const fn builtin() -> Self {
        Self::new(BUILTIN)
    }

    /// Look up a class name, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, class_name: &str) -> Option<&DefectEntry> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(class_name))
            .map(|(_, entry)| entry)
    }

    /// Look up a class name, falling back to [`DefectEntry::UNKNOWN`].
    #[must_use]
    pub fn lookup(&self, class_name: &str) -> DefectEntry {
        self.get(class_name).copied().unwrap_or(DefectEntry::UNKNOWN)
    }

    /// Class names known to the catalog, in declaration order.
    pub fn class_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DefectCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_six_classes() {
        let catalog = DefectCatalog::builtin();
        assert_eq!(catalog.len(), 6);
        let names: Vec<_> = catalog.class_names().collect();
        assert_eq!(
            names,
            [
                "spurious_copper",
                "spur",
                "short",
                "open_circuit",
                "mouse_bite",
                "missing_hole"
            ]
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = DefectCatalog::builtin();
        let lower = catalog.lookup("mouse_bite");
        assert_eq!(catalog.lookup("Mouse_Bite"), lower);
        assert_eq!(catalog.lookup("MOUSE_BITE"), lower);
        assert_eq!(
            lower.description,
            "Small semicircular cutouts along the edge of traces."
        );
    }

    #[test]
    fn spur_and_spurious_copper_are_distinct() {
        let catalog = DefectCatalog::builtin();
        assert_ne!(catalog.lookup("spur"), catalog.lookup("spurious_copper"));
    }

    #[test]
    fn unknown_class_falls_back_to_na() {
        let catalog = DefectCatalog::builtin();
        assert!(catalog.get("solder_bridge").is_none());
        assert_eq!(catalog.lookup("solder_bridge"), DefectEntry::UNKNOWN);
        assert_eq!(catalog.lookup(""), DefectEntry::UNKNOWN);
    }

    #[test]
    fn custom_catalog() {
        static ENTRIES: &[(&str, DefectEntry)] = &[(
            "scratch",
            DefectEntry {
                description: "Surface scratch.",
                remedy: "Polish.",
            },
        )];
        let catalog = DefectCatalog::new(ENTRIES);
        assert_eq!(catalog.lookup("SCRATCH").remedy, "Polish.");
        assert_eq!(catalog.lookup("short"), DefectEntry::UNKNOWN);
    }
}
