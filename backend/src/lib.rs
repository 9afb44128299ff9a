//! Q&A board backend.
//!
//! Hexagonal layout: `domain` holds the entities, the engagement-core
//! services, and the ports; `inbound` adapts HTTP and WebSocket traffic
//! onto them; `outbound` implements the ports over PostgreSQL, the
//! in-process change feed, and the notification channel; `server` wires it
//! all together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use doc::ApiDoc;
pub use middleware::Trace;
