//! End-to-end request handling: envelope in, envelope out.
//!
//! This is the piece the HTTP front calls once per request body. It is a
//! pure function of the body bytes plus the immutable dispatcher, so the
//! front may run any number of these concurrently. The response mirrors
//! the request's codec and charset; compression is re-chosen per response
//! by payload size, which the protocol explicitly allows.

use cab_protocol::Node;
use tracing::{debug, warn};

use crate::dispatch::Dispatcher;
use crate::envelope;
use crate::error::ServiceError;

pub struct ProtocolService {
    dispatcher: Dispatcher,
}

impl ProtocolService {
    pub fn new(dispatcher: Dispatcher) -> ProtocolService {
        ProtocolService { dispatcher }
    }

    /// Handle one HTTP request body, producing the response body.
    ///
    /// Any error here is terminal for the exchange - the front answers
    /// with a transport-level rejection and the cabinet retries. Errors
    /// are never embedded in a document.
    pub fn handle_request(&self, body: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let request = envelope::decode(body).inspect_err(|err| {
            warn!(%err, len = body.len(), "rejecting malformed request body");
        })?;
        debug!(
            charset = ?request.charset,
            textual = request.textual,
            compressed = request.compressed,
            "decoded request envelope"
        );

        let response = self.dispatcher.dispatch(&request.document)?;
        self.encode_response(&response, &request)
    }

    fn encode_response(
        &self,
        response: &Node,
        request: &envelope::Envelope,
    ) -> Result<Vec<u8>, ServiceError> {
        envelope::encode_auto(response, request.charset, request.textual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::HandlerTable;
    use crate::envelope::decode;
    use crate::registry::{GameRegistry, GameVersion};
    use cab_protocol::{Charset, Node};

    fn service() -> ProtocolService {
        let mut registry = GameRegistry::new();
        let v1 = GameVersion::new("beatfest", 1);
        registry.register_model("M39", 2019010100, v1.clone());
        let mut table = HandlerTable::new();
        table.insert(
            &v1,
            "pc",
            "ping",
            Box::new(|_| {
                let mut reply = Node::void("pc").unwrap();
                reply.append(Node::with_value("status", 0u8).unwrap());
                Ok(reply)
            }),
        );
        ProtocolService::new(Dispatcher::new(registry, table))
    }

    fn request_doc(method: &str) -> Node {
        let mut call = Node::void("call").unwrap();
        call.set_attribute("model", "M39:J:B:A:2021042600").unwrap();
        call.set_attribute("tag", "T").unwrap();
        let mut pc = Node::void("pc").unwrap();
        pc.set_attribute("method", method).unwrap();
        call.append(pc);
        call
    }

    #[test]
    fn test_roundtrip_binary_request() {
        let body =
            envelope::encode(&request_doc("ping"), Charset::Utf8, false, false).unwrap();
        let reply_body = service().handle_request(&body).unwrap();
        let reply = decode(&reply_body).unwrap();
        assert!(!reply.textual);
        assert_eq!(reply.document.name(), "response");
        assert_eq!(reply.document.attribute("tag"), Some("T"));
        let pc = reply.document.child("pc").unwrap();
        assert_eq!(pc.child("status").unwrap().as_u8().unwrap(), 0);
    }

    #[test]
    fn test_textual_request_gets_textual_response() {
        let body = envelope::encode(&request_doc("ping"), Charset::Utf8, true, false).unwrap();
        let reply_body = service().handle_request(&body).unwrap();
        assert!(decode(&reply_body).unwrap().textual);
    }

    #[test]
    fn test_compressed_request_same_reply_tree() {
        let plain = envelope::encode(&request_doc("ping"), Charset::Utf8, false, false).unwrap();
        let packed = envelope::encode(&request_doc("ping"), Charset::Utf8, false, true).unwrap();
        let a = decode(&service().handle_request(&plain).unwrap()).unwrap();
        let b = decode(&service().handle_request(&packed).unwrap()).unwrap();
        assert_eq!(a.document, b.document);
    }

    #[test]
    fn test_unknown_method_stub_response() {
        let body =
            envelope::encode(&request_doc("quixotic"), Charset::Utf8, false, false).unwrap();
        let reply = decode(&service().handle_request(&body).unwrap()).unwrap();
        let pc = reply.document.child("pc").unwrap();
        assert!(pc.children().is_empty());
        assert!(!pc.has_attributes());
        assert_eq!(reply.document.attribute("tag"), Some("T"));
    }

    #[test]
    fn test_malformed_body_is_terminal() {
        assert!(service().handle_request(&[0x07, 0x00]).is_err());
    }
}
