//! Label-suffix dispatch table.
//!
//! Each route owns one zone (`dice.`, `help.`, `.`). A query is handed to the
//! route owning the longest suffix of its name, found by walking the name
//! toward the root one label at a time; ownership is per label, so `dice.`
//! never matches `paradice.`. A root route acts as the catch-all.
//!
//! The router is built once at startup and is read-only afterwards; dispatch
//! takes `&self` and may run from any number of tasks at once.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::{LowerName, Name, Record};

use crate::error::{RegistryError, ServiceError};
use crate::service::{Service, ServiceRequest};
use crate::types::ServiceName;

/// Anything the router can hand a request to.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &ServiceRequest) -> Result<Vec<Record>, ServiceError>;
}

/// Adapts a registered [`Service`] to the router.
pub struct ServiceHandler {
    name: ServiceName,
    service: Arc<dyn Service>,
}

impl ServiceHandler {
    pub fn new(name: ServiceName, service: Arc<dyn Service>) -> Self {
        Self { name, service }
    }
}

impl Handler for ServiceHandler {
    fn handle(&self, request: &ServiceRequest) -> Result<Vec<Record>, ServiceError> {
        let result = self.service.query(request);
        if let Err(err) = &result {
            tracing::debug!(
                service = %self.name,
                subject = %request.subject,
                error = %err,
                "service rejected query",
            );
        }
        result
    }
}

/// Catch-all for names no service owns.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHandler;

impl Handler for DefaultHandler {
    fn handle(&self, _request: &ServiceRequest) -> Result<Vec<Record>, ServiceError> {
        Err(ServiceError::NotImplemented)
    }
}

struct Route {
    zone: Name,
    handler: Arc<dyn Handler>,
}

#[derive(Default)]
pub struct Router {
    routes: HashMap<LowerName, Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `zone` for `handler`. Fails if the zone is already owned.
    pub fn handle(&mut self, zone: Name, handler: Arc<dyn Handler>) -> Result<(), RegistryError> {
        let zone = zone.to_lowercase();
        let key = LowerName::from(&zone);
        if self.routes.contains_key(&key) {
            return Err(RegistryError::ZoneTaken {
                zone: zone.to_string(),
            });
        }
        tracing::debug!(zone = %zone, "route registered");
        self.routes.insert(key, Route { zone, handler });
        Ok(())
    }

    pub fn owns(&self, zone: &Name) -> bool {
        self.routes.contains_key(&LowerName::from(&zone.to_lowercase()))
    }

    /// Registered zones, sorted.
    pub fn zones(&self) -> Vec<Name> {
        let mut zones: Vec<Name> = self.routes.values().map(|r| r.zone.clone()).collect();
        zones.sort();
        zones
    }

    /// The zone that would answer `name`, if any.
    pub fn zone_for(&self, name: &Name) -> Option<&Name> {
        self.lookup(name).map(|r| &r.zone)
    }

    fn lookup(&self, name: &Name) -> Option<&Route> {
        let mut candidate = name.to_lowercase();
        loop {
            if let Some(route) = self.routes.get(&LowerName::from(&candidate)) {
                return Some(route);
            }
            if candidate.is_root() || candidate.num_labels() == 0 {
                return None;
            }
            candidate = candidate.base_name();
        }
    }

    /// Answer one decoded request. Never fails: every problem becomes a
    /// response code.
    pub fn dispatch(&self, request: &Message, client: SocketAddr) -> Message {
        if request.message_type() != MessageType::Query || request.op_code() != OpCode::Query {
            return reply(request, ResponseCode::NotImp, Vec::new());
        }
        let Some(query) = request.queries().first() else {
            return reply(request, ResponseCode::FormErr, Vec::new());
        };

        let name = query.name();
        let Some(route) = self.lookup(name) else {
            return reply(request, ResponseCode::NotImp, Vec::new());
        };

        let service_request = ServiceRequest {
            name: name.clone(),
            subject: subject(name, &route.zone),
            record_type: query.query_type(),
            client,
        };

        match route.handler.handle(&service_request) {
            Ok(answers) => reply(request, ResponseCode::NoError, answers),
            Err(err) => reply(request, err.response_code(), Vec::new()),
        }
    }
}

/// Labels of `name` left of `zone`, lowercased and dot-joined.
fn subject(name: &Name, zone: &Name) -> String {
    let total = name.iter().count();
    let owned = zone.iter().count();
    name.iter()
        .take(total.saturating_sub(owned))
        .map(|label| String::from_utf8_lossy(label).to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(".")
}

/// Build a response echoing the request header and question.
pub fn reply(request: &Message, code: ResponseCode, answers: Vec<Record>) -> Message {
    let mut response = Message::new();
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_authoritative(true)
        .set_recursion_desired(request.recursion_desired())
        .set_recursion_available(false)
        .set_response_code(code);
    response.add_queries(request.queries().iter().cloned());
    response.add_answers(answers);
    response
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
