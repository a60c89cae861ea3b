/*!
Engine lookup: resolve a (type, algorithm) request to an implementation.

Façades such as a message digest or signature wrapper call
[`EngineLookup::get_instance`] and wrap the returned SPI object. A lookup miss
is reported as [`Error::NoSuchAlgorithm`] naming the requested type and
algorithm.
*/

use std::any::{self, Any};
use std::fmt;
use std::sync::Arc;

use crate::core::error::{Error, Result};
use crate::core::provider::Provider;
use crate::core::registry::ProviderRegistry;
use crate::core::service::{ServiceRecord, SpiObject};
use crate::{invalid_argument_err, no_such_algorithm_err};

/// An instantiated service together with where it came from
pub struct Instance {
    provider: Arc<Provider>,
    service: Arc<ServiceRecord>,
    spi: SpiObject,
}

impl Instance {
    /// Provider that supplied the implementation
    pub fn provider(&self) -> &Arc<Provider> {
        &self.provider
    }

    /// Record the implementation was built from
    pub fn service(&self) -> &Arc<ServiceRecord> {
        &self.service
    }

    /// The implementation, type-erased
    pub fn spi(&self) -> &(dyn Any + Send + Sync) {
        self.spi.as_ref()
    }

    /// Take the implementation as its concrete type
    pub fn downcast<T: Any>(self) -> Result<T> {
        match self.spi.downcast::<T>() {
            Ok(spi) => Ok(*spi),
            Err(_) => invalid_argument_err!(
                "{} from provider {} is not a {}",
                self.service.class_name(),
                self.provider.name(),
                any::type_name::<T>()
            ),
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("provider", &self.provider.name())
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

/// Priority-ordered service lookup over a registry
#[derive(Debug, Clone, Copy)]
pub struct EngineLookup<'a> {
    registry: &'a ProviderRegistry,
}

impl<'a> EngineLookup<'a> {
    pub fn new(registry: &'a ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Instantiate the implementation from the highest-priority provider
    /// declaring `service_type` and `algorithm`.
    ///
    /// Only the first matching provider is tried; a failure to construct its
    /// implementation is returned as is.
    pub fn get_instance(&self, service_type: &str, algorithm: &str, arg: Option<&dyn Any>) -> Result<Instance> {
        check_request(service_type, algorithm)?;
        log::trace!("Looking up {}.{}", service_type, algorithm);
        match self.registry.find_service(service_type, algorithm) {
            Some((provider, service)) => instantiate(provider, service, arg),
            None => no_such_algorithm_err!(service_type, algorithm),
        }
    }

    /// Instantiate the implementation from the provider called `provider_name`
    pub fn get_instance_from(
        &self,
        service_type: &str,
        algorithm: &str,
        provider_name: &str,
        arg: Option<&dyn Any>,
    ) -> Result<Instance> {
        check_request(service_type, algorithm)?;
        if provider_name.is_empty() {
            return invalid_argument_err!("missing provider name");
        }
        let provider = self
            .registry
            .get_provider(provider_name)
            .ok_or_else(|| Error::NoSuchProvider(provider_name.to_string()))?;
        Self::get_instance_with(service_type, algorithm, &provider, arg)
    }

    /// Instantiate the implementation from `provider`, registered or not
    pub fn get_instance_with(
        service_type: &str,
        algorithm: &str,
        provider: &Arc<Provider>,
        arg: Option<&dyn Any>,
    ) -> Result<Instance> {
        check_request(service_type, algorithm)?;
        match provider.get_service(service_type, algorithm) {
            Some(service) => instantiate(provider.clone(), service, arg),
            None => no_such_algorithm_err!(service_type, algorithm, provider.name()),
        }
    }
}

fn check_request(service_type: &str, algorithm: &str) -> Result<()> {
    if service_type.is_empty() {
        return invalid_argument_err!("missing service type");
    }
    if algorithm.is_empty() {
        return invalid_argument_err!("missing algorithm name for {}", service_type);
    }
    Ok(())
}

fn instantiate(provider: Arc<Provider>, service: Arc<ServiceRecord>, arg: Option<&dyn Any>) -> Result<Instance> {
    let spi = service.instantiate(arg)?;
    Ok(Instance { provider, service, spi })
}
