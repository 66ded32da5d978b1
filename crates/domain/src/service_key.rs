//! Service key value object

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a service type
///
/// Keys both the affected-service registry (one entry per contract) and the
/// service container. Works for unsized contracts such as `dyn Catalog`.
#[derive(Debug, Clone, Copy)]
pub struct ServiceKey {
    id: TypeId,
    name: &'static str,
}

impl ServiceKey {
    /// Key for the type `T`
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Fully qualified type name
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.name
    }

    /// Type name without module path, e.g. `dyn Catalog`
    #[must_use]
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }

    /// Whether this key identifies `T`
    #[must_use]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// Strip the module path from a `std::any::type_name` string
///
/// Keeps a leading `dyn ` marker and anything after the first path segment
/// boundary (generic arguments, extra trait bounds) intact.
pub(crate) fn short_type_name(full: &str) -> String {
    let (marker, rest) = full
        .strip_prefix("dyn ")
        .map_or(("", full), |rest| ("dyn ", rest));
    let path_end = rest.find(['<', ' ']).unwrap_or(rest.len());
    let start = rest[..path_end].rfind("::").map_or(0, |idx| idx + 2);
    format!("{marker}{}", &rest[start..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Catalog {}

    #[test]
    fn same_type_same_key() {
        assert_eq!(ServiceKey::of::<u32>(), ServiceKey::of::<u32>());
        assert_ne!(ServiceKey::of::<u32>(), ServiceKey::of::<u64>());
    }

    #[test]
    fn unsized_contracts_have_keys() {
        let key = ServiceKey::of::<dyn Catalog>();
        assert!(key.is::<dyn Catalog>());
        assert!(!key.is::<u32>());
        assert!(key.type_name().contains("Catalog"));
        assert_eq!(key.short_name(), "dyn Catalog");
    }

    #[test]
    fn keys_are_hashable() {
        let mut set = HashSet::new();
        set.insert(ServiceKey::of::<String>());
        set.insert(ServiceKey::of::<String>());
        set.insert(ServiceKey::of::<dyn Catalog>());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn short_name_strips_module_path() {
        assert_eq!(ServiceKey::of::<String>().short_name(), "String");
        assert_eq!(ServiceKey::of::<u32>().short_name(), "u32");
    }

    #[test]
    fn short_name_keeps_generic_arguments() {
        assert_eq!(short_type_name("alloc::vec::Vec<u32>"), "Vec<u32>");
        assert_eq!(
            short_type_name("dyn app::Catalog + core::marker::Send"),
            "dyn Catalog + core::marker::Send"
        );
    }

    #[test]
    fn display_uses_short_name() {
        assert_eq!(ServiceKey::of::<String>().to_string(), "String");
    }
}
