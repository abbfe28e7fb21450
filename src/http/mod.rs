//! Requests, responses and the fetchers that carry them.

mod fetcher;
#[cfg(test)]
mod scripted;
mod types;

pub use fetcher::{DynFetcher, Fetcher, HttpFetcher};
#[cfg(test)]
pub(crate) use scripted::ScriptedFetcher;
pub use types::{FormPart, Method, Request, RequestBody, RequestMode, Response, ResponseKind};
