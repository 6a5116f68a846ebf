//! Local id to remote document key correlation

use crate::error::DecodeError;
use crate::local::LocalRecord;
use crate::remote::FieldMap;

use super::decode::lookup;
use super::descriptor::{EntityDescriptor, IdentityStrategy};

/// Maps records of one domain to their remote document keys
#[derive(Debug, Clone, Copy)]
pub struct IdentityMapper {
    descriptor: &'static EntityDescriptor,
}

impl IdentityMapper {
    pub fn new(descriptor: &'static EntityDescriptor) -> Self {
        Self { descriptor }
    }

    /// Document key a local record is written under
    pub fn remote_key(&self, record: &LocalRecord) -> Result<String, DecodeError> {
        match self.descriptor.identity {
            IdentityStrategy::Composite { left, right } => self
                .composite_key(&record.fields)
                .ok_or_else(|| {
                    let missing = if self.foreign_key(&record.fields, left).is_none() { left } else { right };
                    DecodeError::MissingField(missing.to_string())
                }),
            IdentityStrategy::Simple | IdentityStrategy::ParentScoped { .. } => Ok(record.id.to_string()),
        }
    }

    /// `"{left}_{right}"` for junction domains, `None` when either side is
    /// missing or zero or the domain is not composite
    pub fn composite_key(&self, fields: &FieldMap) -> Option<String> {
        match self.descriptor.identity {
            IdentityStrategy::Composite { left, right } => {
                let a = self.foreign_key(fields, left)?;
                let b = self.foreign_key(fields, right)?;
                Some(format!("{}_{}", a, b))
            }
            _ => None,
        }
    }

    /// Parent id of a child-domain record
    pub fn parent_id(&self, fields: &FieldMap) -> Option<i64> {
        match self.descriptor.identity {
            IdentityStrategy::ParentScoped { foreign_key, .. } => lookup(fields, foreign_key.iter().copied())
                .and_then(|v| v.as_i64())
                .filter(|id| *id != 0),
            _ => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.descriptor.identity, IdentityStrategy::Composite { .. })
    }

    fn foreign_key(&self, fields: &FieldMap, name: &'static str) -> Option<i64> {
        let value = match self.descriptor.field(name) {
            Some(spec) => lookup(fields, spec.names()),
            None => fields.get(name),
        };
        value.and_then(|v| v.as_i64()).filter(|id| *id != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::EntityKind;

    #[test]
    fn test_simple_key_is_local_id() {
        let mapper = IdentityMapper::new(EntityKind::Routes.descriptor());
        let record = LocalRecord::new(7).with("name", "North");
        assert_eq!(mapper.remote_key(&record).unwrap(), "7");
        assert!(!mapper.is_composite());
    }

    #[test]
    fn test_composite_key_from_foreign_keys() {
        let mapper = IdentityMapper::new(EntityKind::CollaboratorRoutes.descriptor());
        let record = LocalRecord::new(42)
            .with("collaboratorId", 3i64)
            .with("routeId", 9i64);

        assert_eq!(mapper.remote_key(&record).unwrap(), "3_9");

        // same pair under another local id maps to the same document
        let other = LocalRecord::new(1).with("collaborator_id", 3i64).with("route_id", 9i64);
        assert_eq!(mapper.remote_key(&other).unwrap(), "3_9");
    }

    #[test]
    fn test_composite_key_requires_both_sides() {
        let mapper = IdentityMapper::new(EntityKind::ContractTables.descriptor());
        let record = LocalRecord::new(1).with("contractId", 5i64);
        assert_eq!(
            mapper.remote_key(&record),
            Err(DecodeError::MissingField("tableId".to_string()))
        );
    }

    #[test]
    fn test_parent_scoped_records() {
        let mapper = IdentityMapper::new(EntityKind::ContractAmendments.descriptor());
        let record = LocalRecord::new(11).with("contract_id", 4i64);

        assert_eq!(mapper.remote_key(&record).unwrap(), "11");
        assert_eq!(mapper.parent_id(&record.fields), Some(4));
    }
}
