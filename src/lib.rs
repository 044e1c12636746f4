//! RustyHTML - HTML5 parse trees to namespace-correct XML documents
//!
//! Entry points:
//! A: Native document (convert, to_xml, copy_document, get_root, document_info)
//! B: Host term tree through a node factory (convert_to_terms)
//! C: Parallel batch conversion (convert_many)

use rustler::{Encoder, Env, NifResult, ResourceArc, Term};

pub mod convert;
pub mod core;
pub mod dom;
pub mod error;
mod resource;
pub mod source;
pub mod strategy;
mod term;

use convert::{convert_with_factory, ConvertOptions};
use resource::{DocumentRef, DocumentResource};
use term::{decode_tree, node_to_term, HostOptions, TermFactory};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                let mut peak = PEAK_ALLOCATED.load(Ordering::Relaxed);
                while current > peak {
                    match PEAK_ALLOCATED.compare_exchange_weak(
                        peak,
                        current,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => break,
                        Err(p) => peak = p,
                    }
                }
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Memory Tracking NIFs
// ============================================================================

#[cfg(feature = "memory_tracking")]
use std::sync::atomic::Ordering;

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory() -> usize {
    tracking::ALLOCATED.load(Ordering::SeqCst)
}

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    tracking::PEAK_ALLOCATED.load(Ordering::SeqCst)
}

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    let current = tracking::ALLOCATED.load(Ordering::SeqCst);
    let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
    (current, peak)
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    (0, 0)
}

// ============================================================================
// Strategy A: Native Document
// ============================================================================

/// Convert a source tree term into a document
/// Returns {:ok, doc} or {:error, reason}
#[rustler::nif(name = "convert")]
fn convert_document<'a>(env: Env<'a>, tree: Term<'a>, opts: HostOptions) -> NifResult<Term<'a>> {
    let opts = ConvertOptions::from(opts);
    match decode_tree(tree).and_then(|tree| convert::convert(&tree, &opts)) {
        Ok(doc) => {
            let arc = ResourceArc::new(DocumentResource::from_document(doc));
            Ok((term::ok(), arc).encode(env))
        }
        Err(e) => Ok((term::error(), e.message()).encode(env)),
    }
}

/// Serialize a document to XML
#[rustler::nif]
fn to_xml<'a>(env: Env<'a>, doc_ref: DocumentRef) -> NifResult<Term<'a>> {
    match doc_ref.with_doc(dom::to_xml) {
        Ok(xml) => Ok(xml.encode(env)),
        Err(reason) => Ok((term::error(), reason).encode(env)),
    }
}

/// Deep-copy a document into a new, independent resource
#[rustler::nif]
fn copy_document<'a>(env: Env<'a>, doc_ref: DocumentRef) -> NifResult<Term<'a>> {
    match doc_ref.with_doc(|doc| doc.clone()) {
        Ok(copy) => {
            let arc = ResourceArc::new(DocumentResource::from_document(copy));
            Ok((term::ok(), arc).encode(env))
        }
        Err(reason) => Ok((term::error(), reason).encode(env)),
    }
}

/// Get root element of a document
#[rustler::nif]
fn get_root<'a>(env: Env<'a>, doc_ref: DocumentRef) -> NifResult<Term<'a>> {
    let result = doc_ref.with_doc(|doc| match doc.root_element_id() {
        Some(root_id) => node_to_term(env, doc, root_id),
        None => term::nil().encode(env),
    });

    match result {
        Ok(term) => Ok(term),
        Err(_) => Ok(term::nil().encode(env)),
    }
}

/// Summary of a document: {node_count, root_name | nil, has_doctype}
#[rustler::nif]
fn document_info<'a>(env: Env<'a>, doc_ref: DocumentRef) -> NifResult<Term<'a>> {
    let result = doc_ref.with_doc(|doc| {
        let root_name = doc
            .root_element()
            .and_then(|root| doc.qualified_name(root.name_id, root.ns));
        let root_name = match root_name {
            Some(name) => name.encode(env),
            None => term::nil().encode(env),
        };
        (doc.node_count(), root_name, doc.doctype().is_some()).encode(env)
    });

    match result {
        Ok(term) => Ok(term),
        Err(reason) => Ok((term::error(), reason).encode(env)),
    }
}

// ============================================================================
// Strategy B: Host Terms
// ============================================================================

/// Convert a source tree term straight into element/comment/text terms
/// Returns {:ok, root} or {:error, reason}
#[rustler::nif]
fn convert_to_terms<'a>(env: Env<'a>, tree: Term<'a>, opts: HostOptions) -> NifResult<Term<'a>> {
    let opts = ConvertOptions::from(opts);
    let mut factory = TermFactory::new();
    match decode_tree(tree).and_then(|tree| convert_with_factory(&tree, &opts, &mut factory)) {
        Ok(root) => Ok((term::ok(), factory.into_term(env, root)).encode(env)),
        Err(e) => Ok((term::error(), e.message()).encode(env)),
    }
}

// ============================================================================
// Strategy C: Parallel Batch Conversion
// ============================================================================

/// Convert a list of source tree terms in parallel
/// Returns one {:ok, doc} or {:error, reason} per tree, in input order
#[rustler::nif(schedule = "DirtyCpu")]
fn convert_many<'a>(env: Env<'a>, trees: Vec<Term<'a>>, opts: HostOptions) -> NifResult<Term<'a>> {
    let opts = ConvertOptions::from(opts);

    // Terms belong to this env, so decoding stays on the calling thread
    let mut valid = Vec::with_capacity(trees.len());
    let mut failures = Vec::with_capacity(trees.len());
    for tree in trees {
        match decode_tree(tree) {
            Ok(tree) => {
                valid.push(tree);
                failures.push(None);
            }
            Err(e) => failures.push(Some(e)),
        }
    }
    let mut converted = strategy::convert_many(&valid, &opts).into_iter();

    let mut results = Vec::with_capacity(failures.len());
    for failure in failures {
        let result = match failure {
            Some(e) => Err(e),
            None => converted
                .next()
                .unwrap_or(Err(error::ConvertError::Structure(crate::site!("Batch result went missing")))),
        };
        let term = match result {
            Ok(doc) => (term::ok(), ResourceArc::new(DocumentResource::from_document(doc))).encode(env),
            Err(e) => (term::error(), e.message()).encode(env),
        };
        results.push(term);
    }

    let mut list = Term::list_new_empty(env);
    for term in results.into_iter().rev() {
        list = list.list_prepend(term);
    }
    Ok(list)
}

// ============================================================================
// NIF Initialization
// ============================================================================

#[allow(non_local_definitions)]
fn load(_env: Env, _info: Term) -> bool {
    // DocumentResource is registered by #[rustler::resource_impl] in resource.rs.
    true
}

rustler::init!("Elixir.RustyHTML.Native", load = load);
