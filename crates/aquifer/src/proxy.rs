//! Proxy creation for lazy to-one associations.
//!
//! When a to-one association is fetched lazily, the row carries only the
//! target's foreign key. The driver asks a `ProxyFactory` for a stand-in
//! holding that identifier, to be initialized on first real access by
//! whatever persistence layer sits above hydration.

use crate::entity::{EntityData, EntityRef};
use aquifer_core::Value;

/// Builds stand-in entities from an identifier alone.
pub trait ProxyFactory {
    /// Create a proxy of `entity_type` holding only its identifier fields.
    fn create_proxy(&self, entity_type: &str, identifier: Vec<(String, Value)>) -> EntityRef;
}

/// Default factory producing inert placeholder entities.
///
/// The placeholder carries the identifier and the `proxy` flag; it never
/// loads anything on its own.
#[derive(Debug, Default)]
pub struct UninitializedProxyFactory;

impl ProxyFactory for UninitializedProxyFactory {
    fn create_proxy(&self, entity_type: &str, identifier: Vec<(String, Value)>) -> EntityRef {
        let mut data = EntityData::new(entity_type);
        data.proxy = true;
        for (field, value) in identifier {
            data.fields.insert(field, value);
        }
        data.into_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_holds_identifier() {
        let factory = UninitializedProxyFactory;
        let proxy = factory.create_proxy("ECommerceShipping", vec![("id".into(), Value::Int(42))]);
        let data = proxy.read().unwrap();

        assert!(data.proxy);
        assert_eq!(data.entity_type, "ECommerceShipping");
        assert_eq!(data.field("id"), Some(&Value::Int(42)));
        assert!(data.fields.get("cost").is_none());
    }
}
