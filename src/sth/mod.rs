//! STH History Fetcher
//!
//! Reads the most recent values of one entity attribute from a FIWARE
//! STH-Comet ("Short Term History") server.
//!
//! ## Data Flow
//!
//! 1. Build `.../contextEntities/type/{type}/id/{id}/attributes/{attr}?lastN={n}`
//! 2. Send with `fiware-service` and `fiware-servicepath` headers
//! 3. Unwrap `contextResponses[0].contextElement.attributes[0].values`
//!
//! Failures never propagate past [`SthClient::latest_values`]: a bad status
//! or a malformed envelope means "no new data this tick".

mod client;
mod types;

pub use client::{SthClient, SthError};
pub use types::{AttrValue, HistoryResponse};
