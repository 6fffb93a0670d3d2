//! The mail registry
//!
//! A [`MailRegistry`] is the process-wide directory of named, in-flight
//! message builders plus the shared default parameters. It is an explicit
//! context object: the composition root owns one instance and hands it
//! around; tests build their own. The registry also owns the transport
//! factory (with an optional post-configuration callback) and the queue
//! every builder delegates to.
//!
//! The registry is unsynchronized mutable state; multithreaded hosts must
//! serialize access externally.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::message::builder::MessageBuilder;
use crate::message::params::MessageParams;
use crate::queue::{MailQueue, NullQueue};
use crate::template::MailTemplates;
use crate::transport::stub::StubTransport;
use crate::transport::MailTransport;

/// Ways to designate the message a registry operation applies to.
#[derive(Debug)]
pub enum MailableDef {
    /// The current builder; a fresh one seeded with the registry defaults is
    /// created when none is current.
    Current,
    /// An already-registered builder, looked up by name. Unknown names are
    /// fatal.
    Named(String),
    /// A new builder created from the given parameter bag.
    Params(MessageParams),
    /// An existing builder instance, adopted by the registry.
    Builder(MessageBuilder),
}

impl From<&str> for MailableDef {
    fn from(name: &str) -> Self {
        MailableDef::Named(name.to_string())
    }
}

impl From<String> for MailableDef {
    fn from(name: String) -> Self {
        MailableDef::Named(name)
    }
}

impl From<MessageParams> for MailableDef {
    fn from(params: MessageParams) -> Self {
        MailableDef::Params(params)
    }
}

impl From<MessageBuilder> for MailableDef {
    fn from(builder: MessageBuilder) -> Self {
        MailableDef::Builder(builder)
    }
}

/// Directory of named message builders plus shared default parameters.
pub struct MailRegistry {
    defaults: MessageParams,
    builders: HashMap<String, MessageBuilder>,
    current: Option<String>,
    templates: Option<Arc<dyn MailTemplates>>,
    transport_factory: Box<dyn Fn() -> Box<dyn MailTransport>>,
    transport_config: Option<Box<dyn Fn(&mut dyn MailTransport)>>,
    queue: Box<dyn MailQueue>,
    sequence: u64,
}

impl std::fmt::Debug for MailRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailRegistry")
            .field("defaults", &self.defaults)
            .field("builders", &self.builders.keys().collect::<Vec<_>>())
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl Default for MailRegistry {
    fn default() -> Self {
        MailRegistry {
            defaults: MessageParams::default(),
            builders: HashMap::new(),
            current: None,
            templates: None,
            transport_factory: Box::new(|| Box::new(StubTransport::new_positive())),
            transport_config: None,
            queue: Box::new(NullQueue),
            sequence: 0,
        }
    }
}

impl MailRegistry {
    /// Creates an empty registry backed by the stub transport and the
    /// storage-less queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the given shared default parameters.
    pub fn with_defaults(defaults: MessageParams) -> Self {
        MailRegistry {
            defaults,
            ..Self::default()
        }
    }

    /// The shared default parameter bag.
    pub fn defaults(&self) -> &MessageParams {
        &self.defaults
    }

    /// Mutable access to the shared default parameter bag. Builders snapshot
    /// the defaults at creation, so changes only affect builders resolved
    /// afterwards.
    pub fn defaults_mut(&mut self) -> &mut MessageParams {
        &mut self.defaults
    }

    /// Installs the factory producing a transport for every new builder.
    pub fn set_transport_factory<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn MailTransport> + 'static,
    {
        self.transport_factory = Box::new(factory);
        self
    }

    /// Installs a callback applied to every transport the factory produces,
    /// e.g. to switch environment or credentials.
    pub fn set_transport_config<F>(&mut self, config: F) -> &mut Self
    where
        F: Fn(&mut dyn MailTransport) + 'static,
    {
        self.transport_config = Some(Box::new(config));
        self
    }

    /// Builds a configured transport from the factory.
    pub fn transport(&self) -> Box<dyn MailTransport> {
        let mut transport = (self.transport_factory)();
        if let Some(config) = &self.transport_config {
            config(transport.as_mut());
        }
        transport
    }

    /// Installs the view engine handed to every new builder.
    pub fn set_templates(&mut self, templates: Arc<dyn MailTemplates>) -> &mut Self {
        self.templates = Some(templates);
        self
    }

    /// Installs the queue backend.
    pub fn set_queue(&mut self, queue: Box<dyn MailQueue>) -> &mut Self {
        self.queue = queue;
        self
    }

    /// The queue backend.
    pub fn queue(&mut self) -> &mut dyn MailQueue {
        self.queue.as_mut()
    }

    /// Stores a builder under its name, overwriting any previous entry with
    /// the same name. A builder without a name gets a generated one.
    /// Returns the registration name.
    pub fn register(&mut self, mut builder: MessageBuilder) -> String {
        let name = match builder.name() {
            Some(name) => name.to_string(),
            None => {
                let name = self.generate_name();
                builder.set_name(name.clone());
                name
            }
        };
        self.builders.insert(name.clone(), builder);
        name
    }

    /// Looks up a registered builder by name.
    pub fn get(&self, name: &str) -> Option<&MessageBuilder> {
        self.builders.get(name)
    }

    /// Looks up a registered builder by name, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut MessageBuilder> {
        self.builders.get_mut(name)
    }

    /// Name of the current builder, if any.
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The current builder, creating one from the registry defaults when
    /// none is current.
    pub fn current(&mut self) -> Result<&mut MessageBuilder, Error> {
        self.resolve(MailableDef::Current)
    }

    /// Removes a registered builder.
    pub fn remove(&mut self, name: &str) -> Option<MessageBuilder> {
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        self.builders.remove(name)
    }

    /// Iterates over the registered builders.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MessageBuilder)> {
        self.builders.iter().map(|(name, builder)| (name.as_str(), builder))
    }

    /// Number of registered builders.
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Whether no builder is registered.
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Resolves a designation into a registered builder and makes it the
    /// current one. Unknown names are fatal; parameter bags create a new
    /// builder seeded with the registry defaults.
    pub fn resolve<D: Into<MailableDef>>(&mut self, def: D) -> Result<&mut MessageBuilder, Error> {
        let name = self.resolve_name(def.into())?;
        self.builders
            .get_mut(&name)
            .ok_or(Error::UnknownMessage(name))
    }

    /// Resolves, builds and sends a message, returning the transport's
    /// verdict.
    pub fn send<D: Into<MailableDef>>(&mut self, def: D) -> Result<bool, Error> {
        let name = self.build_entry(def)?;
        self.builders
            .get_mut(&name)
            .ok_or(Error::UnknownMessage(name))?
            .send()
    }

    /// Resolves, builds and queues a message for deferred delivery.
    /// Returns the queue identifier; `0` means the message was not queued.
    pub fn queue_message<D: Into<MailableDef>>(
        &mut self,
        def: D,
        when: DateTime<Utc>,
        context: Map<String, Value>,
    ) -> Result<u64, Error> {
        let name = self.build_entry(def)?;
        let builder = self
            .builders
            .get_mut(&name)
            .ok_or(Error::UnknownMessage(name))?;
        builder.queue(self.queue.as_mut(), when, context)
    }

    /// Resolves, builds and renders the diagnostic view of a message.
    pub fn debug<D: Into<MailableDef>>(&mut self, def: D) -> Result<String, Error> {
        let name = self.build_entry(def)?;
        self.builders
            .get_mut(&name)
            .ok_or(Error::UnknownMessage(name))?
            .debug()
    }

    /// Resolves and builds a message, applying any registry rename its
    /// parameter bag requested. Returns the (possibly new) registration
    /// name.
    pub fn build_entry<D: Into<MailableDef>>(&mut self, def: D) -> Result<String, Error> {
        let name = self.resolve_name(def.into())?;
        let builder = self
            .builders
            .get_mut(&name)
            .ok_or_else(|| Error::UnknownMessage(name.clone()))?;
        builder.build()?;

        let new_name = builder.name().unwrap_or(name.as_str()).to_string();
        if new_name != name {
            if let Some(renamed) = self.builders.remove(&name) {
                self.builders.insert(new_name.clone(), renamed);
            }
            if self.current.as_deref() == Some(name.as_str()) {
                self.current = Some(new_name.clone());
            }
        }
        Ok(new_name)
    }

    fn resolve_name(&mut self, def: MailableDef) -> Result<String, Error> {
        match def {
            MailableDef::Current => {
                if let Some(name) = &self.current {
                    if self.builders.contains_key(name) {
                        return Ok(name.clone());
                    }
                }
                Ok(self.create(MessageParams::default()))
            }
            MailableDef::Named(name) => {
                if self.builders.contains_key(&name) {
                    self.current = Some(name.clone());
                    Ok(name)
                } else {
                    Err(Error::UnknownMessage(name))
                }
            }
            MailableDef::Params(params) => Ok(self.create(params)),
            MailableDef::Builder(builder) => {
                let name = self.register(builder);
                self.current = Some(name.clone());
                Ok(name)
            }
        }
    }

    fn create(&mut self, params: MessageParams) -> String {
        let mut builder = MessageBuilder::new(params);
        builder.set_defaults(self.defaults.clone());
        builder.set_transport(self.transport());
        if let Some(templates) = &self.templates {
            builder.set_templates(templates.clone());
        }

        let name = self.register(builder);
        self.current = Some(name.clone());
        name
    }

    fn generate_name(&mut self) -> String {
        loop {
            let name = format!("mailable-{}", self.sequence);
            self.sequence += 1;
            if !self.builders.contains_key(&name) {
                return name;
            }
        }
    }
}
