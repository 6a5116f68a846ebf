//! Declarative entity descriptors
//!
//! One `EntityDescriptor` per domain drives the generic handler: which
//! collection it lives in, how its fields decode, how its identity maps to a
//! remote key and which child domains follow it.

use super::types::EntityKind;

/// Value type a field decodes to locally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Real,
    Bool,
    /// Stored locally as epoch millis
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Optional,
    /// Text that must not be blank
    NonBlank,
    /// Foreign key that must not be zero
    NonZero,
}

/// Value used when no alias is present in the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Null,
    Text(&'static str),
    Integer(i64),
    Real(f64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Canonical (camelCase) name, used locally and when pushing
    pub name: &'static str,
    /// Fallback names tried in order after `name`
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
    pub requirement: Requirement,
    pub default: FieldDefault,
}

impl FieldSpec {
    const fn new(name: &'static str, aliases: &'static [&'static str], kind: FieldKind) -> Self {
        Self {
            name,
            aliases,
            kind,
            requirement: Requirement::Optional,
            default: FieldDefault::Null,
        }
    }

    pub const fn text(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self::new(name, aliases, FieldKind::Text)
    }

    pub const fn integer(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self::new(name, aliases, FieldKind::Integer)
    }

    pub const fn real(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self::new(name, aliases, FieldKind::Real).or(FieldDefault::Real(0.0))
    }

    pub const fn boolean(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self::new(name, aliases, FieldKind::Bool).or(FieldDefault::Bool(false))
    }

    pub const fn timestamp(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self::new(name, aliases, FieldKind::Timestamp)
    }

    pub const fn required(mut self) -> Self {
        self.requirement = Requirement::NonBlank;
        self
    }

    pub const fn non_zero(mut self) -> Self {
        self.requirement = Requirement::NonZero;
        self
    }

    pub const fn or(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }

    /// Every name this field may appear under, canonical first
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

/// How a record's remote document key is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStrategy {
    /// Key is the local id
    Simple,
    /// Junction entity keyed `"{left}_{right}"` from two foreign keys
    Composite {
        left: &'static str,
        right: &'static str,
    },
    /// Simple key, synced right after its parent and filtered by it
    ParentScoped {
        parent: EntityKind,
        foreign_key: &'static [&'static str],
    },
}

#[derive(Debug)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    pub collection: &'static str,
    pub fields: &'static [FieldSpec],
    pub identity: IdentityStrategy,
    /// Business timestamp used for conflict resolution
    pub timestamp_field: Option<&'static str>,
    pub children: &'static [EntityKind],
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names the business timestamp may appear under
    pub fn timestamp_names(&self) -> Vec<&'static str> {
        match self.timestamp_field {
            Some(name) => match self.field(name) {
                Some(spec) => spec.names().collect(),
                None => vec![name],
            },
            None => Vec::new(),
        }
    }

    pub fn is_child(&self) -> bool {
        matches!(self.identity, IdentityStrategy::ParentScoped { .. })
    }
}
