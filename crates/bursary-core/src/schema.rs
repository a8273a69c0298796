//! Form field layout for each entity kind.
//!
//! The validator walks these specs to normalize a raw payload, and the store
//! uses them to map fields onto columns and association tables.

use crate::enums::EntityKind;

/// Association table linking an owner row to rows of another kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTable {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub target_column: &'static str,
    pub target: EntityKind,
}

/// Value shape accepted by a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line text with a character limit.
    Text { max_len: usize },
    LongText,
    Url,
    Email,
    /// Checkbox semantics: absent or empty means `false`.
    Boolean,
    /// Canonical `YYYY-MM-DD HH:MM:SS`; `bounded` applies the past/future limits.
    DateTime { bounded: bool },
    /// Comma-separated identifiers stored in an association table.
    Links(LinkTable),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind, required: bool) -> Self {
        Self {
            name,
            kind,
            required,
        }
    }

    /// Whether this field is stored as a column on the entity's own table.
    #[must_use]
    pub const fn is_column(&self) -> bool {
        !matches!(self.kind, FieldKind::Links(_))
    }
}

const STIPEND_TAGS: LinkTable = LinkTable {
    table: "stipend_tags",
    owner_column: "stipend_id",
    target_column: "tag_id",
    target: EntityKind::Tag,
};

const STIPEND_ORGANIZATIONS: LinkTable = LinkTable {
    table: "organization_stipends",
    owner_column: "stipend_id",
    target_column: "organization_id",
    target: EntityKind::Organization,
};

const STIPEND_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", FieldKind::Text { max_len: 100 }, true),
    FieldSpec::new("summary", FieldKind::LongText, true),
    FieldSpec::new("description", FieldKind::LongText, true),
    FieldSpec::new("homepage_url", FieldKind::Url, true),
    FieldSpec::new("application_procedure", FieldKind::LongText, false),
    FieldSpec::new("eligibility_criteria", FieldKind::LongText, false),
    FieldSpec::new(
        "application_deadline",
        FieldKind::DateTime { bounded: true },
        false,
    ),
    FieldSpec::new("open_for_applications", FieldKind::Boolean, false),
    FieldSpec::new("tags", FieldKind::Links(STIPEND_TAGS), false),
    FieldSpec::new("organizations", FieldKind::Links(STIPEND_ORGANIZATIONS), false),
];

const TAG_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", FieldKind::Text { max_len: 100 }, true),
    FieldSpec::new("category", FieldKind::Text { max_len: 50 }, false),
];

const ORGANIZATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", FieldKind::Text { max_len: 100 }, true),
    FieldSpec::new("description", FieldKind::LongText, false),
    FieldSpec::new("homepage_url", FieldKind::Url, false),
];

const USER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("username", FieldKind::Text { max_len: 80 }, true),
    FieldSpec::new("email", FieldKind::Email, true),
    FieldSpec::new("name", FieldKind::Text { max_len: 100 }, false),
    FieldSpec::new("is_admin", FieldKind::Boolean, false),
    FieldSpec::new("is_active", FieldKind::Boolean, false),
];

const BOT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", FieldKind::Text { max_len: 100 }, true),
    FieldSpec::new("tag", FieldKind::Text { max_len: 100 }, true),
    FieldSpec::new("description", FieldKind::LongText, false),
    FieldSpec::new("status", FieldKind::Text { max_len: 50 }, false),
    FieldSpec::new("is_active", FieldKind::Boolean, false),
];

impl EntityKind {
    /// Form fields accepted for this kind, in column order.
    #[must_use]
    pub const fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Stipend => STIPEND_FIELDS,
            Self::Tag => TAG_FIELDS,
            Self::Organization => ORGANIZATION_FIELDS,
            Self::User => USER_FIELDS,
            Self::Bot => BOT_FIELDS,
        }
    }

    /// Look up one field spec by name.
    #[must_use]
    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|spec| spec.name == name)
    }

    /// Fields stored as columns on the kind's own table.
    pub fn column_fields(self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields().iter().filter(|spec| spec.is_column())
    }

    /// Association tables owned by this kind.
    pub fn link_fields(self) -> impl Iterator<Item = (&'static FieldSpec, LinkTable)> {
        self.fields().iter().filter_map(|spec| match spec.kind {
            FieldKind::Links(link) => Some((spec, link)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_required_field() {
        for kind in EntityKind::ALL {
            assert!(
                kind.fields().iter().any(|f| f.required),
                "{kind} should have at least one required field"
            );
        }
    }

    #[test]
    fn stipend_links_are_not_columns() {
        let columns: Vec<_> = EntityKind::Stipend.column_fields().map(|f| f.name).collect();
        assert!(!columns.contains(&"tags"));
        assert!(!columns.contains(&"organizations"));

        let links: Vec<_> = EntityKind::Stipend
            .link_fields()
            .map(|(_, link)| link.table)
            .collect();
        assert_eq!(links, vec!["stipend_tags", "organization_stipends"]);
    }

    #[test]
    fn deadline_is_bounded() {
        let spec = EntityKind::Stipend.field("application_deadline").unwrap();
        assert_eq!(spec.kind, FieldKind::DateTime { bounded: true });
        assert!(!spec.required);
    }

    #[test]
    fn field_lookup_misses_unknown_names() {
        assert!(EntityKind::Tag.field("csrf_token").is_none());
    }
}
