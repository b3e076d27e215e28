//! Identity and bookkeeping shared by every facade.
//!
//! Each facade embeds an [`ElementCore`]: a stable [`ElementId`] drawn from
//! the owning model's [`IdSequence`], a handle to the shared
//! [`SourceDocument`] and the update callback. The [`FacadeElement`] trait is
//! the generic surface on top of it.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use serde_json::{Map, Value};

use crate::data_structures::document::SourceDocument;

/// The document shared by every facade of one model.
pub type SharedDocument = Rc<RefCell<SourceDocument>>;

/// Zero-argument notification fired after every state-changing operation.
///
/// It is invoked once per public setter call and is never debounced here;
/// coalescing belongs to whatever schedules redraws.
pub type OnUpdate = Rc<dyn Fn()>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out element ids for one document session.
///
/// Clones share the same counter, so every facade built for a model draws
/// from one sequence while separate models never see each other's ids.
#[derive(Clone, Debug, Default)]
pub struct IdSequence {
    last: Rc<Cell<u64>>,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> ElementId {
        let next = self.last.get() + 1;
        self.last.set(next);
        ElementId(next)
    }
}

/// State every facade carries.
#[derive(Clone)]
pub struct ElementCore {
    id: ElementId,
    document: SharedDocument,
    on_update: OnUpdate,
}

impl ElementCore {
    pub fn new(ids: &IdSequence, document: SharedDocument, on_update: OnUpdate) -> Self {
        Self {
            id: ids.next_id(),
            document,
            on_update,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn on_update(&self) -> &OnUpdate {
        &self.on_update
    }

    /// Callers must not hold a borrow of the document while notifying, the
    /// callback is free to read or serialize it.
    pub(crate) fn notify(&self) {
        (self.on_update)();
    }
}

impl fmt::Debug for ElementCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementCore").field("id", &self.id).finish()
    }
}

/// Generic surface of every facade object.
pub trait FacadeElement {
    fn core(&self) -> &ElementCore;

    /// The id assigned at construction. Never reused or changed.
    fn id(&self) -> ElementId {
        self.core().id()
    }

    /// The name recorded in the source document, never a renderer default.
    fn name(&self) -> Option<String>;

    /// The document fragment this facade mirrors, as JSON.
    fn source_object(&self) -> Option<Value>;

    /// `{id, name?}`; facades with children add their summaries.
    fn to_json(&self) -> Value {
        base_json(self)
    }
}

/// The `{id, name?}` object every facade summary starts from.
pub(crate) fn base_json<E: FacadeElement + ?Sized>(element: &E) -> Value {
    let mut json = Map::new();
    json.insert("id".into(), Value::from(element.id().get()));
    if let Some(name) = element.name() {
        json.insert("name".into(), Value::from(name));
    }
    Value::Object(json)
}

/// Serialize a document record for [`FacadeElement::source_object`].
pub(crate) fn fragment<T: serde::Serialize>(record: Option<&T>) -> Option<Value> {
    record.and_then(|record| match serde_json::to_value(record) {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("Unable to serialize document fragment: {}", e);
            None
        }
    })
}
