/*!
Factory table mapping implementation class names to constructors.

Providers declare implementations by class name; the class name is a key into
a [`FactoryTable`] populated when the provider is built.
*/

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::error::{Error, Result};

/// A constructed service implementation
pub type SpiObject = Box<dyn Any + Send + Sync>;

type Constructor = Box<dyn Fn() -> Result<SpiObject> + Send + Sync>;
type ArgumentConstructor = Box<dyn Fn(&dyn Any) -> Result<SpiObject> + Send + Sync>;

/// Constructors for one implementation class
#[derive(Default)]
pub struct ServiceFactory {
    no_arg: Option<Constructor>,
    with_arg: HashMap<TypeId, (&'static str, ArgumentConstructor)>,
}

impl ServiceFactory {
    /// Factory with a no-argument constructor
    pub fn new<T, F>(constructor: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self {
            no_arg: Some(Box::new(move || constructor().map(|spi| Box::new(spi) as SpiObject))),
            with_arg: HashMap::new(),
        }
    }

    /// Factory with only argument-taking constructors
    pub fn without_default() -> Self {
        Self::default()
    }

    /// Add a constructor taking a single argument of type `A`
    pub fn with_argument<A, T, F>(mut self, constructor: F) -> Self
    where
        A: Any,
        T: Any + Send + Sync,
        F: Fn(&A) -> Result<T> + Send + Sync + 'static,
    {
        let name = std::any::type_name::<A>();
        let wrapped: ArgumentConstructor = Box::new(move |arg: &dyn Any| match arg.downcast_ref::<A>() {
            Some(arg) => constructor(arg).map(|spi| Box::new(spi) as SpiObject),
            None => Err(Error::InvalidParameter(format!("expected argument of type {}", name))),
        });
        self.with_arg.insert(TypeId::of::<A>(), (name, wrapped));
        self
    }

    /// Construct with the no-argument constructor
    pub fn construct(&self) -> Result<SpiObject> {
        match &self.no_arg {
            Some(constructor) => constructor(),
            None => Err(Error::Instantiation {
                class_name: String::new(),
                reason: "no public no-argument constructor".to_string(),
            }),
        }
    }

    /// Construct with the constructor registered for `parameter_type`
    pub fn construct_with(&self, parameter_type: TypeId, arg: &dyn Any) -> Result<SpiObject> {
        match self.with_arg.get(&parameter_type) {
            Some((_, constructor)) => constructor(arg),
            None => Err(Error::Instantiation {
                class_name: String::new(),
                reason: "no public constructor matching the argument type".to_string(),
            }),
        }
    }
}

impl fmt::Debug for ServiceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let argument_types: Vec<&str> = self.with_arg.values().map(|(name, _)| *name).collect();
        f.debug_struct("ServiceFactory")
            .field("no_arg", &self.no_arg.is_some())
            .field("argument_types", &argument_types)
            .finish()
    }
}

/// Class name to factory mapping shared by the records of a provider
#[derive(Debug, Default)]
pub struct FactoryTable {
    factories: HashMap<String, Arc<ServiceFactory>>,
}

impl FactoryTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for `class_name`, replacing any previous one
    pub fn register(mut self, class_name: impl Into<String>, factory: ServiceFactory) -> Self {
        self.factories.insert(class_name.into(), Arc::new(factory));
        self
    }

    /// Resolve a class name
    pub fn resolve(&self, class_name: &str) -> Option<Arc<ServiceFactory>> {
        self.factories.get(class_name).cloned()
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no class is registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
