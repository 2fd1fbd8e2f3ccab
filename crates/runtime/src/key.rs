use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Identifies one injectable dependency: a type plus an optional qualifier.
///
/// Equality and hashing use the [`TypeId`] and the qualifier; the type name
/// is only kept for diagnostics.
#[derive(Clone)]
pub struct BindingKey {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Option<String>,
}

impl BindingKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            qualifier: None,
        }
    }

    pub fn named<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            ..Self::of::<T>()
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

impl PartialEq for BindingKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for BindingKey {}

impl Hash for BindingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{} @Named(\"{}\")", self.type_name, qualifier),
            None => f.write_str(self.type_name),
        }
    }
}

impl fmt::Debug for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindingKey({self})")
    }
}

/// Typed view of a [`BindingKey`], used by [`crate::Module::provide`] and
/// [`crate::Injector::get`].
pub struct Key<T: ?Sized> {
    raw: BindingKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ?Sized + 'static> Key<T> {
    pub fn of() -> Self {
        Self {
            raw: BindingKey::of::<T>(),
            _marker: PhantomData,
        }
    }

    pub fn named(qualifier: impl Into<String>) -> Self {
        Self {
            raw: BindingKey::named::<T>(qualifier),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Key<T> {
    pub fn raw(&self) -> &BindingKey {
        &self.raw
    }
}

impl<T: ?Sized> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.raw)
    }
}

impl<T: ?Sized> From<Key<T>> for BindingKey {
    fn from(key: Key<T>) -> Self {
        key.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_qualifier_distinguishes_keys() {
        let plain = BindingKey::of::<String>();
        let named = BindingKey::named::<String>("Child String");

        assert_ne!(plain, named);
        assert_eq!(named, Key::<String>::named("Child String").raw().clone());
        assert_eq!(named.qualifier(), Some("Child String"));

        let set: HashSet<_> = [plain.clone(), named, plain].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display() {
        let key = BindingKey::named::<u32>("port");
        assert_eq!(key.to_string(), "u32 @Named(\"port\")");
        assert_eq!(BindingKey::of::<u32>().to_string(), "u32");
    }
}
