//! Resource kinds managed by this provider.

pub mod tcp_frontend;

use std::collections::BTreeMap;

use crate::reconciler::Resource;
use crate::schema::Schema;

pub use tcp_frontend::{TcpFrontend, TcpFrontendPayload};

/// Schema of every resource kind, keyed by type name.
pub fn schemas() -> BTreeMap<&'static str, Schema> {
    BTreeMap::from([(TcpFrontend::TYPE_NAME, TcpFrontend::schema())])
}
