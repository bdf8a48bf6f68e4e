//! # logsink
//!
//! A minimal centralized log-ingestion service. Distributed client
//! processes that cannot (or should not) write logs locally open a TCP
//! connection, send one newline-terminated JSON record, and disconnect.
//! The server rate-limits chatty clients, stamps each record with the
//! receipt time and the peer's real address, and appends it to a JSON
//! Lines file.
//!
//! ## Wire protocol
//!
//! One UTF-8 line per connection; nothing is ever written back:
//!
//! ```text
//! {"clientTimestamp":"2025-02-24T14:30:00Z","level":"Info","message":"disk almost full"}
//! ```
//!
//! Stored as:
//!
//! ```text
//! {"clientTimestamp":"2025-02-24T14:30:00Z","serverTimestamp":"2025-02-24T09:30:02.114210-05:00","clientIp":"203.0.113.7","level":"Info","message":"disk almost full"}
//! ```
//!
//! `serverTimestamp` and `clientIp` are always server-authoritative;
//! values a client tries to supply for them are discarded. Success,
//! rate-limit rejection, and malformed input are indistinguishable to the
//! client: the connection simply closes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  accept   ┌─────────────────────┐
//! │  Ingest  ├──────────►│   connection task   │  (one per connection)
//! │  Server  │           │   read → admit →    │
//! └──────────┘           │   enrich → append   │
//!                        └──────┬───────┬──────┘
//!                               │       │
//!                     ┌─────────▼──┐ ┌──▼──────────┐
//!                     │ RateLimiter│ │ LogAppender │
//!                     │   actor    │ │   actor     │
//!                     └────────────┘ └─────────────┘
//! ```
//!
//! Both shared resources, the per-client admission map and the log file,
//! are owned by single actor tasks: per-key admission checks are atomic
//! and appended lines never interleave.
//!
//! ## Quick start
//!
//! ```bash
//! # defaults: 0.0.0.0:5000, logs.json, one record per client per 5s
//! logsink
//!
//! # explicit settings
//! logsink --port 13000 --log-file /var/log/fleet.json --rate-limit 10
//!
//! # or via environment variables / settings file
//! LOGSINK_PORT=13000 logsink --config /etc/logsink/settings.json
//! ```

pub mod actor;
pub mod appender;
pub mod config;
pub mod handler;
pub mod limiter;
pub mod server;
pub mod types;
