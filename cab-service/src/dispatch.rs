//! Request dispatch.
//!
//! Routes a decoded `call` document to a handler identified by
//! `(game, version, module, method)` and assembles the `response` wrapper.
//! The dispatcher holds no per-request state; handlers run concurrently on
//! whatever workers the HTTP front provides.

use cab_protocol::Node;
use hashbrown::HashMap;
use tracing::debug;

use crate::error::ServiceError;
use crate::registry::{GameRegistry, GameVersion, Model};

/// A request handler: takes the module child of the `call`, returns the
/// reply node that becomes the sole child of the `response`.
pub type Handler = Box<dyn Fn(&Node) -> Result<Node, ServiceError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HandlerKey {
    game: String,
    version: u32,
    module: String,
    method: String,
}

/// The `(game, version, module, method) → handler` map, built at startup.
#[derive(Default)]
pub struct HandlerTable {
    handlers: HashMap<HandlerKey, Handler>,
}

impl HandlerTable {
    pub fn new() -> HandlerTable {
        HandlerTable::default()
    }

    pub fn insert(
        &mut self,
        target: &GameVersion,
        module: &str,
        method: &str,
        handler: Handler,
    ) {
        self.handlers.insert(
            HandlerKey {
                game: target.game.clone(),
                version: target.version,
                module: module.to_owned(),
                method: method.to_owned(),
            },
            handler,
        );
    }

    fn get(&self, target: &GameVersion, module: &str, method: &str) -> Option<&Handler> {
        self.handlers.get(&HandlerKey {
            game: target.game.clone(),
            version: target.version,
            module: module.to_owned(),
            method: method.to_owned(),
        })
    }
}

/// Stateless router over an immutable registry and handler table.
pub struct Dispatcher {
    registry: GameRegistry,
    table: HandlerTable,
}

impl Dispatcher {
    pub fn new(registry: GameRegistry, table: HandlerTable) -> Dispatcher {
        Dispatcher { registry, table }
    }

    /// Dispatch a decoded `call` and build its `response`.
    ///
    /// Handler resolution walks the predecessor chain: the exact version
    /// first, then each earlier version in turn, first match wins. A miss
    /// across the whole chain is answered by the stub response - an empty
    /// void node named after the module - which is what the vendor network
    /// does for unknown endpoints.
    pub fn dispatch(&self, call: &Node) -> Result<Node, ServiceError> {
        if call.name() != "call" {
            return Err(ServiceError::call(format!(
                "root node is <{}>, expected <call>",
                call.name()
            )));
        }
        let model_attr = call
            .attribute("model")
            .ok_or_else(|| ServiceError::call("missing model attribute"))?;
        let resolved = self.registry.resolve_model(&Model::parse(model_attr)?)?;

        let module_node = match call.children() {
            [only] => only,
            children => {
                return Err(ServiceError::call(format!(
                    "expected exactly one module child, got {}",
                    children.len()
                )));
            }
        };
        let module = module_node.name();
        let method = module_node
            .attribute("method")
            .ok_or_else(|| ServiceError::call("module child has no method attribute"))?;
        debug!(
            game = %resolved.game,
            version = resolved.version,
            module,
            method,
            "dispatching call"
        );

        let reply = match self.resolve_handler(&resolved, module, method) {
            Some(handler) => handler(module_node)?,
            None => {
                debug!(module, method, "no handler in chain, stub response");
                Node::void(module)?
            }
        };

        let mut response = Node::void("response")?;
        response.append(reply);
        if let Some(tag) = call.attribute("tag") {
            response.set_attribute("tag", tag)?;
        }
        Ok(response)
    }

    fn resolve_handler(
        &self,
        start: &GameVersion,
        module: &str,
        method: &str,
    ) -> Option<&Handler> {
        let mut cursor = Some(start);
        while let Some(version) = cursor {
            if let Some(handler) = self.table.get(version, module, method) {
                return Some(handler);
            }
            cursor = self.registry.predecessor(version);
        }
        None
    }
}
