//! Single-slot client reuse within one execution context.
use super::CatalogClient;
use crate::config::InstanceId;
use crate::transport::{TransportError, TransportFactory};
use std::rc::Rc;

/// Holds at most one current catalog client.
///
/// A scope is owned by a single call chain and dropped with it; clients are
/// handed out as `Rc` so the scope cannot cross threads.
pub struct ClientScope<'f, F: TransportFactory> {
    factory: &'f F,
    current: Option<Rc<CatalogClient<F::Transport>>>,
}

impl<'f, F: TransportFactory> ClientScope<'f, F> {
    /// Creates an empty scope drawing transports from `factory`.
    pub fn new(factory: &'f F) -> Self {
        Self {
            factory,
            current: None,
        }
    }

    /// Returns a client for `instance`, reusing the current one when it matches.
    pub fn acquire(
        &mut self,
        instance: InstanceId,
    ) -> Result<Rc<CatalogClient<F::Transport>>, TransportError> {
        if let Some(current) = &self.current {
            if current.instance() == instance {
                return Ok(Rc::clone(current));
            }
        }
        self.acquire_fresh(instance)
    }

    /// Builds a new client for `instance` and makes it the current one.
    pub fn acquire_fresh(
        &mut self,
        instance: InstanceId,
    ) -> Result<Rc<CatalogClient<F::Transport>>, TransportError> {
        let transport = self.factory.connect(instance)?;
        let client = Rc::new(CatalogClient::new(instance, transport));
        self.current = Some(Rc::clone(&client));
        Ok(client)
    }
}
