//! WebSocket Figure Push
//!
//! Pushes a re-rendered chart to every open dashboard page whenever the
//! poller changes the series store.
//!
//! ## Protocol
//!
//! Clients connect to `/ws`. The server sends `connected`, then the current
//! figure, then one `figure` message per store update. Clients may send
//! `{"type": "ping"}` and receive `{"type": "pong"}`.
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8050/ws');
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'figure') Plotly.react('chart', msg.figure.data || [], msg.figure.layout || {});
//! };
//! ```

mod handler;
mod messages;

pub use handler::websocket_handler;
pub use messages::{ClientMessage, ServerMessage};
