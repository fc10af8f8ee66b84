//! Database Object Types
//!
//! Objects offered by the object catalog, their presentation-level type and
//! the normalized class used to look up grantable privileges.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Object type ──────────────────────────────────────────────

/// Presentation-level object type, as labelled by the object catalog.
///
/// Unknown labels are preserved in `Other` so that a catalog carrying a type
/// this crate does not know about still loads; such objects normalize to
/// [`NormalizedObjectClass::Unmapped`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectType {
    Table,
    View,
    MaterializedView,
    Sequence,
    Function,
    TriggerFunction,
    Procedure,
    ForeignTable,
    Package,
    Other(String),
}

impl ObjectType {
    /// Display label used on the wire and in the object list.
    pub fn label(&self) -> &str {
        match self {
            Self::Table => "Table",
            Self::View => "View",
            Self::MaterializedView => "Materialized View",
            Self::Sequence => "Sequence",
            Self::Function => "Function",
            Self::TriggerFunction => "Trigger Function",
            Self::Procedure => "Procedure",
            Self::ForeignTable => "Foreign Table",
            Self::Package => "Package",
            Self::Other(label) => label,
        }
    }

    /// Parse a display label. Never fails.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Table" => Self::Table,
            "View" => Self::View,
            "Materialized View" => Self::MaterializedView,
            "Sequence" => Self::Sequence,
            "Function" => Self::Function,
            "Trigger Function" => Self::TriggerFunction,
            "Procedure" => Self::Procedure,
            "Foreign Table" => Self::ForeignTable,
            "Package" => Self::Package,
            other => Self::Other(other.to_string()),
        }
    }

    /// Total mapping onto the class used for capability lookup.
    pub fn normalized_class(&self) -> NormalizedObjectClass {
        match self {
            Self::Table | Self::View | Self::MaterializedView => NormalizedObjectClass::Table,
            Self::Sequence => NormalizedObjectClass::Sequence,
            Self::Function | Self::TriggerFunction => NormalizedObjectClass::Function,
            Self::Procedure => NormalizedObjectClass::Procedure,
            Self::ForeignTable => NormalizedObjectClass::ForeignTable,
            Self::Package => NormalizedObjectClass::Package,
            Self::Other(_) => NormalizedObjectClass::Unmapped,
        }
    }

    /// Whether the object carries an argument signature in its label.
    ///
    /// Trigger functions and procedures are included alongside plain
    /// functions: all three can be overloaded, and the signature is what
    /// names one overload in a `GRANT ... ON FUNCTION|PROCEDURE` target.
    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            Self::Function | Self::TriggerFunction | Self::Procedure
        )
    }
}

impl From<String> for ObjectType {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<ObjectType> for String {
    fn from(ty: ObjectType) -> Self {
        ty.label().to_string()
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ─── Normalized class ─────────────────────────────────────────

/// Coarse category keyed into the capability catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizedObjectClass {
    Table,
    Sequence,
    Function,
    Procedure,
    ForeignTable,
    Package,
    /// Fallback for object types with no catalog entry.
    Unmapped,
}

impl NormalizedObjectClass {
    /// Key of this class in the capability catalog, if it has one.
    pub fn catalog_key(&self) -> Option<&'static str> {
        match self {
            Self::Table => Some("table"),
            Self::Sequence => Some("sequence"),
            Self::Function => Some("function"),
            Self::Procedure => Some("procedure"),
            Self::ForeignTable => Some("foreign_table"),
            Self::Package => Some("package"),
            Self::Unmapped => None,
        }
    }

    /// SQL object keyword used in `GRANT ... ON <kind>`.
    pub fn sql_kind(&self) -> Option<&'static str> {
        match self {
            Self::Table => Some("TABLE"),
            Self::Sequence => Some("SEQUENCE"),
            Self::Function => Some("FUNCTION"),
            Self::Procedure => Some("PROCEDURE"),
            Self::ForeignTable => Some("FOREIGN TABLE"),
            Self::Package => Some("PACKAGE"),
            Self::Unmapped => None,
        }
    }
}

// ─── Database object ──────────────────────────────────────────

/// Opaque catalog identifier (the object's OID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A grantable object, as returned by the object catalog.
///
/// Identity is `id`; objects are immutable once loaded and shared by
/// reference between the catalog and the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseObject {
    pub object_type: ObjectType,
    #[serde(rename = "nspname")]
    pub schema: String,
    pub name: String,
    #[serde(rename = "proargs", default, skip_serializing_if = "Option::is_none")]
    pub arg_signature: Option<String>,
    #[serde(rename = "oid")]
    pub id: ObjectId,
}

impl DatabaseObject {
    pub fn new(
        object_type: ObjectType,
        schema: impl Into<String>,
        name: impl Into<String>,
        id: u64,
    ) -> Self {
        Self {
            object_type,
            schema: schema.into(),
            name: name.into(),
            arg_signature: None,
            id: ObjectId(id),
        }
    }

    pub fn with_args(mut self, args: impl Into<String>) -> Self {
        self.arg_signature = Some(args.into());
        self
    }

    pub fn normalized_class(&self) -> NormalizedObjectClass {
        self.object_type.normalized_class()
    }

    /// Label shown in the object list: `name(args)` for function-like
    /// objects, the bare name otherwise.
    pub fn name_with_args(&self) -> String {
        if self.object_type.is_function_like() {
            format!(
                "{}({})",
                self.name,
                self.arg_signature.as_deref().unwrap_or_default()
            )
        } else {
            self.name.clone()
        }
    }

    /// Case-insensitive substring match against the display label.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty()
            || self
                .name_with_args()
                .to_lowercase()
                .contains(&query.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_is_total() {
        let cases = [
            (ObjectType::Table, NormalizedObjectClass::Table),
            (ObjectType::View, NormalizedObjectClass::Table),
            (ObjectType::MaterializedView, NormalizedObjectClass::Table),
            (ObjectType::Sequence, NormalizedObjectClass::Sequence),
            (ObjectType::Function, NormalizedObjectClass::Function),
            (ObjectType::TriggerFunction, NormalizedObjectClass::Function),
            (ObjectType::Procedure, NormalizedObjectClass::Procedure),
            (ObjectType::ForeignTable, NormalizedObjectClass::ForeignTable),
            (ObjectType::Package, NormalizedObjectClass::Package),
            (
                ObjectType::Other("Collation".into()),
                NormalizedObjectClass::Unmapped,
            ),
        ];
        for (ty, class) in cases {
            assert_eq!(ty.normalized_class(), class, "{}", ty);
        }
    }

    #[test]
    fn test_label_round_trip() {
        for label in [
            "Table",
            "View",
            "Materialized View",
            "Sequence",
            "Function",
            "Trigger Function",
            "Procedure",
            "Foreign Table",
            "Package",
            "Domain",
        ] {
            assert_eq!(ObjectType::from_label(label).label(), label);
        }
    }

    #[test]
    fn test_name_with_args() {
        let func = DatabaseObject::new(ObjectType::Function, "public", "add", 1)
            .with_args("int, text");
        assert_eq!(func.name_with_args(), "add(int, text)");

        let no_args = DatabaseObject::new(ObjectType::Function, "public", "now_utc", 2);
        assert_eq!(no_args.name_with_args(), "now_utc()");

        let table = DatabaseObject::new(ObjectType::Table, "public", "accounts", 3);
        assert_eq!(table.name_with_args(), "accounts");

        let trigger = DatabaseObject::new(ObjectType::TriggerFunction, "audit", "log_change", 4);
        assert_eq!(trigger.name_with_args(), "log_change()");

        let procedure = DatabaseObject::new(ObjectType::Procedure, "billing", "close_period", 5)
            .with_args("period date");
        assert_eq!(procedure.name_with_args(), "close_period(period date)");

        let view = DatabaseObject::new(ObjectType::View, "public", "v", 6).with_args("ignored");
        assert_eq!(view.name_with_args(), "v");
    }

    #[test]
    fn test_deserialize_catalog_row() {
        let row = serde_json::json!({
            "object_type": "Materialized View",
            "nspname": "reporting",
            "name": "daily_totals",
            "oid": 16402,
            "icon": "icon-mview"
        });
        let obj: DatabaseObject = serde_json::from_value(row).unwrap();
        assert_eq!(obj.object_type, ObjectType::MaterializedView);
        assert_eq!(obj.schema, "reporting");
        assert_eq!(obj.id, ObjectId(16402));
        assert_eq!(obj.arg_signature, None);
        assert_eq!(obj.normalized_class(), NormalizedObjectClass::Table);
    }

    #[test]
    fn test_matches_search() {
        let func = DatabaseObject::new(ObjectType::Function, "public", "Calc_Tax", 1)
            .with_args("numeric");
        assert!(func.matches_search("calc"));
        assert!(func.matches_search("NUMERIC"));
        assert!(func.matches_search("  "));
        assert!(!func.matches_search("accounts"));
    }
}
