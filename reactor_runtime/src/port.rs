//! Typed data ports, exposed to reactions as type-erased trait objects so
//! that a single arena (`TinyMap<PortKey, Box<dyn BasePort>>`) can hold ports
//! of every payload type a program declares.

use std::any::Any;
use std::fmt::{self, Debug, Display};

use downcast_rs::{impl_downcast, Downcast};

use reactor_core::PortKey;

use crate::error::RuntimeError;

/// Blanket bound for anything that can live inside a [`Port`] or [`crate::action::Action`].
///
/// Requires `Clone` so that a value written to a port can be copied into every
/// port it is connected to without the writer losing its own copy.
pub trait PortData: Debug + Clone + Send + Sync + 'static {}
impl<T: Debug + Clone + Send + Sync + 'static> PortData for T {}

/// Type-erased handle onto a single-valued, present/absent port slot.
pub trait BasePort: Debug + Display + Downcast + Send + Sync {
    fn name(&self) -> &str;
    fn key(&self) -> PortKey;
    fn is_set(&self) -> bool;
    fn clear(&mut self);
    fn type_name(&self) -> &'static str;

    /// Clones the current value out as a type-erased box, for propagation
    /// across a connection whose endpoint type is only known dynamically.
    fn clone_boxed_value(&self) -> Option<Box<dyn Any + Send>>;

    /// Downcasts `value` to this port's concrete type and stores it.
    fn set_boxed_value(&mut self, value: Box<dyn Any + Send>) -> Result<(), RuntimeError>;
}
impl_downcast!(BasePort);

pub struct Port<T: PortData = ()> {
    name: String,
    key: PortKey,
    value: Option<T>,
}

impl<T: PortData> Port<T> {
    pub fn new(name: impl Into<String>, key: PortKey) -> Self {
        Self {
            name: name.into(),
            key,
            value: None,
        }
    }

    pub fn get(&self) -> &Option<T> {
        &self.value
    }

    pub fn get_mut(&mut self) -> &mut Option<T> {
        &mut self.value
    }

    pub fn boxed(self) -> Box<dyn BasePort> {
        Box::new(self)
    }
}

impl<T: PortData> Debug for Port<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

impl<T: PortData> Display for Port<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl<T: PortData> BasePort for Port<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn key(&self) -> PortKey {
        self.key
    }

    fn is_set(&self) -> bool {
        self.value.is_some()
    }

    fn clear(&mut self) {
        self.value = None;
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn clone_boxed_value(&self) -> Option<Box<dyn Any + Send>> {
        self.value.clone().map(|v| Box::new(v) as Box<dyn Any + Send>)
    }

    fn set_boxed_value(&mut self, value: Box<dyn Any + Send>) -> Result<(), RuntimeError> {
        let value = value.downcast::<T>().map_err(|_| RuntimeError::TypeMismatch {
            what: format!("port {}", self.name),
            expected: self.type_name(),
            found: "<erased>",
        })?;
        self.value = Some(*value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let mut port = Port::<i32>::new("x", PortKey::from(0));
        assert!(!port.is_set());
        *port.get_mut() = Some(42);
        assert!(port.is_set());
        assert_eq!(*port.get(), Some(42));
        port.clear();
        assert!(!port.is_set());
    }

    #[test]
    fn test_boxed_value_roundtrip() {
        let mut src = Port::<i32>::new("src", PortKey::from(0));
        *src.get_mut() = Some(7);
        let boxed = src.clone_boxed_value().unwrap();

        let mut dst = Port::<i32>::new("dst", PortKey::from(1));
        dst.set_boxed_value(boxed).unwrap();
        assert_eq!(*dst.get(), Some(7));
    }

    #[test]
    fn test_boxed_value_type_mismatch() {
        let mut src = Port::<i32>::new("src", PortKey::from(0));
        *src.get_mut() = Some(7);
        let boxed = src.clone_boxed_value().unwrap();

        let mut dst = Port::<String>::new("dst", PortKey::from(1));
        assert!(dst.set_boxed_value(boxed).is_err());
    }
}
