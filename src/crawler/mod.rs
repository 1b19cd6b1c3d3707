//! Crawler module: the Harvester and everything its hooks see
//!
//! This module contains:
//! - The [`Harvester`] facade, its builder and the visit pipeline
//! - HTTP fetching with cancellation
//! - The request, response and element types handed to hooks
//! - The HTML query layer behind element hooks

mod document;
mod fetcher;
mod harvester;
mod hooks;
mod pipeline;
mod request;
mod response;

pub use document::{CompiledSelector, Document, Element};
pub use fetcher::{build_http_client, FetchedBody, Fetcher};
pub use harvester::{Harvester, HarvesterBuilder};
pub use hooks::{ElementCallback, ElementHook, HookRegistry, RequestHook, ResponseHook};
pub use request::Request;
pub use response::Response;
