//! # Telemed client
//!
//! Client-side logic for the Telemed admin API:
//! - `ApiClient`: typed calls for every REST endpoint
//! - `Session`: the bearer token obtained from `/api/token/`
//! - `RequestSequencer`: drops responses overtaken by a newer request for the same resource
//! - `ResourceCache`: last fresh list per request path, invalidated on mutation

#![warn(rust_2018_idioms)]

pub mod cache;
pub mod client;
pub mod error;
pub mod sequence;
pub mod session;

pub use cache::ResourceCache;
pub use client::{ApiClient, DownloadedFile, ExportRequest, DEFAULT_API_URL};
pub use error::{ClientError, ClientResult};
pub use sequence::{Fetched, RequestSequencer, Ticket};
pub use session::Session;
