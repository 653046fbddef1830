//! Scripted RPC transport
//!
//! Stands in for the portfolio platform. Replies are scripted per method and
//! every call is recorded with its payload.
//!
//! Reply resolution for a call, first match wins:
//!
//! 1. The next queued one-shot reply for the method
//! 2. The method's handler, given the payload
//! 3. The method's standing reply
//! 4. An application error naming the unscripted method
//!
//! ```rust,ignore
//! let transport = ScriptedTransport::happy_path()
//!     .fault_once("dokument.create");
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use infra_rpc::{check_call_arguments, RpcError, RpcResponse, RpcTransport, TransportError};

use crate::fixtures::{RemoteIds, ResponseFixtures};

/// A scripted reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Response(RpcResponse),
    /// Simulates a transport fault: the call yields no response
    Fault,
}

impl From<RpcResponse> for ScriptedReply {
    fn from(response: RpcResponse) -> Self {
        ScriptedReply::Response(response)
    }
}

type Handler = Arc<dyn Fn(&Value) -> ScriptedReply + Send + Sync>;

/// A call as seen by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub payload: Value,
}

#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<ScriptedReply>>>,
    handlers: Mutex<HashMap<String, Handler>>,
    standing: Mutex<HashMap<String, ScriptedReply>>,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A platform that accepts every stock transfer request
    pub fn happy_path() -> Self {
        Self::new()
            .always("partner.createPerson", ResponseFixtures::person_created(RemoteIds::PERSON))
            .handle("partner.createKommunikationsverbindung", |payload| {
                let id = match payload["KommunikationsverbindungDaten"]["ArtID"].as_str() {
                    Some("21") => RemoteIds::PHONE,
                    _ => RemoteIds::EMAIL,
                };
                ResponseFixtures::contact_created(id).into()
            })
            .always("dokument.create", ResponseFixtures::document_created(RemoteIds::DOCUMENT))
            .always("vertrag.create", ResponseFixtures::contract_created(RemoteIds::CONTRACT))
            .always(
                "vertrag.startBestandsuebertragung",
                ResponseFixtures::transfer_started(RemoteIds::CONTRACT),
            )
    }

    /// Answers `ereignis.getNext` from a fixed event log
    ///
    /// Each pull returns the first event whose `EreignisID` is greater than
    /// the requested cursor, or no event.
    pub fn event_stream(events: Vec<Value>) -> Self {
        Self::new().with_event_stream(events)
    }

    pub fn with_event_stream(self, events: Vec<Value>) -> Self {
        self.handle("ereignis.getNext", move |payload| {
            let cursor = payload["EreignisID"].as_i64().unwrap_or(0);
            events
                .iter()
                .find(|event| event["EreignisID"].as_i64().is_some_and(|id| id > cursor))
                .cloned()
                .map(ResponseFixtures::event_response)
                .unwrap_or_else(ResponseFixtures::no_event)
                .into()
        })
    }

    /// Delays every reply, widening race windows in concurrency tests
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Answers every call to `method` with `response`
    pub fn always(self, method: &str, response: RpcResponse) -> Self {
        self.standing
            .lock()
            .unwrap()
            .insert(method.to_string(), ScriptedReply::Response(response));
        self
    }

    /// Answers the next call to `method` with `reply`
    pub fn once(self, method: &str, reply: impl Into<ScriptedReply>) -> Self {
        self.queued
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(reply.into());
        self
    }

    /// Lets the next call to `method` fail with a transport fault
    pub fn fault_once(self, method: &str) -> Self {
        self.once(method, ScriptedReply::Fault)
    }

    /// Computes replies for `method` from the payload
    pub fn handle<F>(self, method: &str, handler: F) -> Self
    where
        F: Fn(&Value) -> ScriptedReply + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap()
            .insert(method.to_string(), Arc::new(handler));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Payloads of all calls to `method`
    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method)
            .map(|call| call.payload)
            .collect()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls_to(method).len()
    }

    /// Methods called, in call order
    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.method).collect()
    }

    fn reply_for(&self, method: &str, payload: &Value) -> ScriptedReply {
        if let Some(reply) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        let handler = self.handlers.lock().unwrap().get(method).cloned();
        if let Some(handler) = handler {
            return handler(payload);
        }
        if let Some(reply) = self.standing.lock().unwrap().get(method) {
            return reply.clone();
        }
        ScriptedReply::Response(RpcResponse::failure(RpcError::new(
            format!("no reply scripted for {}", method),
            -32601,
        )))
    }
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn call(&self, method: &str, payload: &Value) -> Result<Option<RpcResponse>, TransportError> {
        check_call_arguments(method, payload)?;

        self.calls.lock().unwrap().push(RecordedCall {
            method: method.to_string(),
            payload: payload.clone(),
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        Ok(match self.reply_for(method, payload) {
            ScriptedReply::Response(response) => Some(response),
            ScriptedReply::Fault => None,
        })
    }
}
