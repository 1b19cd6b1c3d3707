//! Hook registries
//!
//! Each Harvester owns one [`HookRegistry`]. Registration appends under a write
//! lock; the pipeline takes a snapshot under a read lock and runs the hooks
//! with no lock held, so a hook may register more hooks or start nested visits.
//! Hooks registered while a visit is running apply from the next snapshot on.

use crate::crawler::document::CompiledSelector;
use crate::crawler::{Element, Request, Response};
use std::sync::{Arc, PoisonError, RwLock};

pub type RequestHook = Arc<dyn Fn(&mut Request) + Send + Sync>;
pub type ResponseHook = Arc<dyn Fn(&Response) + Send + Sync>;
pub type ElementCallback = Arc<dyn Fn(&Element<'_>) + Send + Sync>;

/// A selector paired with the callback run for each of its matches
#[derive(Clone)]
pub struct ElementHook {
    pub selector: CompiledSelector,
    pub callback: ElementCallback,
}

#[derive(Default)]
pub struct HookRegistry {
    request: RwLock<Vec<RequestHook>>,
    response: RwLock<Vec<ResponseHook>>,
    element: RwLock<Vec<ElementHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request(&self, hook: RequestHook) {
        push(&self.request, hook);
    }

    pub fn add_response(&self, hook: ResponseHook) {
        push(&self.response, hook);
    }

    pub fn add_element(&self, hook: ElementHook) {
        push(&self.element, hook);
    }

    /// Request hooks in registration order
    pub fn request_hooks(&self) -> Vec<RequestHook> {
        snapshot(&self.request)
    }

    /// Response hooks in registration order
    pub fn response_hooks(&self) -> Vec<ResponseHook> {
        snapshot(&self.response)
    }

    /// Element hooks in registration order
    pub fn element_hooks(&self) -> Vec<ElementHook> {
        snapshot(&self.element)
    }

    /// Number of registered (request, response, element) hooks
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            snapshot_len(&self.request),
            snapshot_len(&self.response),
            snapshot_len(&self.element),
        )
    }
}

fn push<T>(list: &RwLock<Vec<T>>, item: T) {
    list.write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(item);
}

fn snapshot<T: Clone>(list: &RwLock<Vec<T>>) -> Vec<T> {
    list.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn snapshot_len<T>(list: &RwLock<Vec<T>>) -> usize {
    list.read().unwrap_or_else(PoisonError::into_inner).len()
}
