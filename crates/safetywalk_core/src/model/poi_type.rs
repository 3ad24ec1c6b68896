//! POI type handles and the resolved type catalog.
//!
//! # Responsibility
//! - Represent host POI types with localized names.
//! - Map host types onto `RecordKind` for partitioning.
//!
//! # Invariants
//! - A catalog always holds all three required types.
//! - Classification is a pure function of type id and localized name.

use crate::config::TypeNames;
use crate::model::record::RecordKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Locale used when a type is built from a single name.
pub const DEFAULT_LOCALE: &str = "en";

/// Opaque POI type handle with localized display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoiType {
    pub id: String,
    /// Locale code -> display name.
    pub names: BTreeMap<String, String>,
}

impl PoiType {
    /// Creates a type carrying one name under the default locale.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut names = BTreeMap::new();
        names.insert(DEFAULT_LOCALE.to_string(), name.into());
        Self {
            id: id.into(),
            names,
        }
    }

    pub fn name(&self, locale: &str) -> Option<&str> {
        self.names.get(locale).map(String::as_str)
    }
}

/// Required type handles resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCatalog {
    deferred: PoiType,
    resolved: PoiType,
    instruction: PoiType,
    locale: String,
    names: TypeNames,
}

impl TypeCatalog {
    /// Picks the required types out of a directory listing.
    ///
    /// Returns the display names of every missing type on failure, in
    /// deferred/resolved/instruction order.
    pub fn from_types(
        types: &[PoiType],
        locale: &str,
        names: &TypeNames,
    ) -> Result<Self, Vec<String>> {
        let find = |wanted: &str| {
            types
                .iter()
                .find(|poi_type| poi_type.name(locale) == Some(wanted))
                .cloned()
        };

        let deferred = find(&names.deferred);
        let resolved = find(&names.resolved);
        let instruction = find(&names.instruction);

        match (deferred, resolved, instruction) {
            (Some(deferred), Some(resolved), Some(instruction)) => Ok(Self {
                deferred,
                resolved,
                instruction,
                locale: locale.to_string(),
                names: names.clone(),
            }),
            (deferred, resolved, instruction) => {
                let mut missing = Vec::new();
                if deferred.is_none() {
                    missing.push(names.deferred.clone());
                }
                if resolved.is_none() {
                    missing.push(names.resolved.clone());
                }
                if instruction.is_none() {
                    missing.push(names.instruction.clone());
                }
                Err(missing)
            }
        }
    }

    /// Type handle used when persisting a record of `kind`.
    pub fn handle(&self, kind: RecordKind) -> &PoiType {
        match kind {
            RecordKind::Deferred => &self.deferred,
            RecordKind::Resolved => &self.resolved,
            RecordKind::Instruction => &self.instruction,
        }
    }

    /// Classifies a host type; `None` means the record is not ours.
    ///
    /// Id match wins; otherwise the localized name is compared, including
    /// legacy deferred names.
    pub fn classify(&self, poi_type: &PoiType) -> Option<RecordKind> {
        if poi_type.id == self.deferred.id {
            return Some(RecordKind::Deferred);
        }
        if poi_type.id == self.resolved.id {
            return Some(RecordKind::Resolved);
        }
        if poi_type.id == self.instruction.id {
            return Some(RecordKind::Instruction);
        }

        let name = poi_type.name(&self.locale)?;
        if name == self.names.deferred || self.names.legacy_deferred.iter().any(|n| n == name) {
            Some(RecordKind::Deferred)
        } else if name == self.names.resolved {
            Some(RecordKind::Resolved)
        } else if name == self.names.instruction {
            Some(RecordKind::Instruction)
        } else {
            None
        }
    }

    /// Whether the type id is one of the three resolved handles.
    pub fn is_managed(&self, poi_type: &PoiType) -> bool {
        [&self.deferred, &self.resolved, &self.instruction]
            .iter()
            .any(|handle| handle.id == poi_type.id)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}

#[cfg(test)]
mod tests {
    use super::{PoiType, TypeCatalog};
    use crate::config::TypeNames;
    use crate::model::record::RecordKind;

    fn directory() -> Vec<PoiType> {
        vec![
            PoiType::new("a", "Maintenance Resolved"),
            PoiType::new("b", "Maintenance Deferred"),
            PoiType::new("c", "Instruction"),
            PoiType::new("d", "Fire Exit"),
        ]
    }

    #[test]
    fn resolves_all_required_types() {
        let catalog = TypeCatalog::from_types(&directory(), "en", &TypeNames::default())
            .expect("all types present");
        assert_eq!(catalog.handle(RecordKind::Deferred).id, "b");
        assert_eq!(catalog.handle(RecordKind::Resolved).id, "a");
        assert_eq!(catalog.handle(RecordKind::Instruction).id, "c");
    }

    #[test]
    fn reports_every_missing_type() {
        let types = vec![PoiType::new("c", "Instruction")];
        let missing = TypeCatalog::from_types(&types, "en", &TypeNames::default())
            .expect_err("deferred and resolved are missing");
        assert_eq!(missing, vec!["Maintenance Deferred", "Maintenance Resolved"]);
    }

    #[test]
    fn classifies_by_id_then_name() {
        let catalog =
            TypeCatalog::from_types(&directory(), "en", &TypeNames::default()).expect("catalog");
        assert_eq!(
            catalog.classify(&PoiType::new("a", "renamed")),
            Some(RecordKind::Resolved)
        );
        assert_eq!(
            catalog.classify(&PoiType::new("zz", "Safety Walks")),
            Some(RecordKind::Deferred)
        );
        assert_eq!(catalog.classify(&PoiType::new("d", "Fire Exit")), None);
        assert!(!catalog.is_managed(&PoiType::new("zz", "Safety Walks")));
    }

    #[test]
    fn name_lookup_respects_locale() {
        let catalog = TypeCatalog::from_types(&directory(), "de", &TypeNames::default());
        assert!(catalog.is_err());
    }
}
