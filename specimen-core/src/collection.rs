//! Type-checked collections and the template-to-collection registry.

use crate::data::{Kind, Seed, Value};
use crate::error::{Result, SpecimenError};
use crate::template::{Instance, Template};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Retry budget for predicate draws in [`Registry::any`].
///
/// An unsatisfiable predicate fails with
/// [`SpecimenError::PredicateExhausted`] instead of looping forever.
pub const PREDICATE_DRAW_LIMIT: usize = 1000;

/// One collection element: a bare value or a shared instance.
#[derive(Debug, Clone)]
pub enum Element {
    Value(Value),
    Instance(Rc<Instance>),
}

impl Element {
    /// Runtime type descriptor of this element.
    pub fn kind(&self) -> Kind {
        match self {
            Element::Value(value) => value.kind(),
            Element::Instance(instance) => Kind::Record(instance.template_name().to_string()),
        }
    }

    /// The instance inside, if this element is one.
    pub fn as_instance(&self) -> Option<&Rc<Instance>> {
        match self {
            Element::Instance(instance) => Some(instance),
            Element::Value(_) => None,
        }
    }

    /// The bare value inside, if this element is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Element::Value(value) => Some(value),
            Element::Instance(_) => None,
        }
    }
}

impl From<Value> for Element {
    fn from(value: Value) -> Self {
        Element::Value(value)
    }
}

macro_rules! element_from_value {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Element {
            fn from(value: $ty) -> Self {
                Element::Value(value.into())
            }
        })*
    };
}

element_from_value!(bool, i32, i64, f64, &str, String, Vec<Value>);

impl From<Rc<Instance>> for Element {
    fn from(instance: Rc<Instance>) -> Self {
        Element::Instance(instance)
    }
}

impl From<Instance> for Element {
    fn from(instance: Instance) -> Self {
        Element::Instance(Rc::new(instance))
    }
}

struct CollectionInner {
    kind: Option<Kind>,
    elements: Vec<Element>,
    template: Option<String>,
    field_names: Vec<String>,
}

/// An append-only, homogeneous, ordered sequence of elements.
///
/// The element kind is fixed at construction or inferred from the first
/// successful append; every later append is checked against it and a
/// mismatch leaves the collection untouched. Cloning yields another
/// handle onto the same sequence, which is how the registry and the
/// caller share one collection.
#[derive(Clone)]
pub struct Collection {
    inner: Rc<RefCell<CollectionInner>>,
}

impl Collection {
    /// An empty collection whose kind is inferred on first append.
    pub fn new() -> Self {
        Collection {
            inner: Rc::new(RefCell::new(CollectionInner {
                kind: None,
                elements: Vec::new(),
                template: None,
                field_names: Vec::new(),
            })),
        }
    }

    /// An empty collection with an explicit element kind.
    pub fn of(kind: Kind) -> Self {
        let collection = Collection::new();
        collection.inner.borrow_mut().kind = Some(kind);
        collection
    }

    pub(crate) fn for_template(template: &Template) -> Self {
        let collection = Collection::of(Kind::Record(template.name().to_string()));
        {
            let mut inner = collection.inner.borrow_mut();
            inner.template = Some(template.name().to_string());
            inner.field_names = template.field_names();
        }
        collection
    }

    /// Append one element, kind-checking first.
    ///
    /// All-or-nothing: on [`SpecimenError::KindMismatch`] the
    /// collection's length and contents are unchanged.
    pub fn append(&self, element: impl Into<Element>) -> Result<()> {
        let element = element.into();
        let mut inner = self.inner.borrow_mut();
        let found = element.kind();
        match &inner.kind {
            Some(expected) if *expected != found => {
                return Err(SpecimenError::KindMismatch {
                    expected: expected.clone(),
                    found,
                })
            }
            Some(_) => {}
            None => inner.kind = Some(found),
        }
        inner.elements.push(element);
        Ok(())
    }

    /// Materialize one instance from `template` and append it.
    pub fn append_template(&self, template: &Template) -> Result<()> {
        self.append(template.make()?)
    }

    /// Append every element of `other` in order.
    ///
    /// The whole batch is kind-checked up front, so a mismatch anywhere
    /// leaves this collection completely unchanged.
    pub fn extend_from(&self, other: &Collection) -> Result<()> {
        let incoming = other.elements();
        let mut inner = self.inner.borrow_mut();
        let mut expected = inner.kind.clone();
        for element in &incoming {
            let found = element.kind();
            match &expected {
                Some(kind) if *kind != found => {
                    return Err(SpecimenError::KindMismatch {
                        expected: kind.clone(),
                        found,
                    })
                }
                Some(_) => {}
                None => expected = Some(found),
            }
        }
        inner.kind = expected;
        inner.elements.extend(incoming);
        Ok(())
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.inner.borrow().elements.len()
    }

    /// True when no element has been appended.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().elements.is_empty()
    }

    /// Snapshot of the elements, in insertion order.
    pub fn elements(&self) -> Vec<Element> {
        self.inner.borrow().elements.clone()
    }

    /// The element at `index`, if present.
    pub fn get(&self, index: usize) -> Option<Element> {
        self.inner.borrow().elements.get(index).cloned()
    }

    /// The element kind, once fixed or inferred.
    pub fn kind(&self) -> Option<Kind> {
        self.inner.borrow().kind.clone()
    }

    /// Name of the originating template, for replicated collections.
    pub fn template_name(&self) -> Option<String> {
        self.inner.borrow().template.clone()
    }

    /// The originating template's field names in declaration order —
    /// everything an outputter needs alongside per-element `get`.
    pub fn field_names(&self) -> Vec<String> {
        self.inner.borrow().field_names.clone()
    }
}

impl Default for Collection {
    fn default() -> Self {
        Collection::new()
    }
}

/// Explicit process registry of replicated collections.
///
/// Maps template names to every collection produced by replicating that
/// template. Grows monotonically; cloning yields another handle onto
/// the same store, so one registry can be threaded through a whole test
/// run and torn down with it.
#[derive(Clone)]
pub struct Registry {
    store: Rc<RefCell<HashMap<String, Vec<Collection>>>>,
    seed: Cell<Seed>,
}

impl Registry {
    /// An empty registry with an entropy-derived seed.
    pub fn new() -> Self {
        Registry::with_seed(Seed::random())
    }

    /// An empty registry drawing predicate samples from `seed`.
    pub fn with_seed(seed: Seed) -> Self {
        Registry {
            store: Rc::new(RefCell::new(HashMap::new())),
            seed: Cell::new(seed),
        }
    }

    pub(crate) fn register(&self, template_name: &str, collection: &Collection) {
        self.store
            .borrow_mut()
            .entry(template_name.to_string())
            .or_default()
            .push(collection.clone());
    }

    /// All collections registered against `template`, in registration
    /// order.
    pub fn collection_of(&self, template: &Template) -> Vec<Collection> {
        self.store
            .borrow()
            .get(template.name())
            .cloned()
            .unwrap_or_default()
    }

    /// Draw uniformly from the union of `template`'s registered
    /// elements until one satisfies `predicate`.
    ///
    /// Bounded at [`PREDICATE_DRAW_LIMIT`] draws; an empty pool or an
    /// unsatisfiable predicate fails with
    /// [`SpecimenError::PredicateExhausted`].
    pub fn any<F>(&self, template: &Template, predicate: F) -> Result<Element>
    where
        F: Fn(&Element) -> bool,
    {
        let pool: Vec<Element> = self
            .collection_of(template)
            .iter()
            .flat_map(|collection| collection.elements())
            .collect();
        if pool.is_empty() {
            return Err(SpecimenError::PredicateExhausted { attempts: 0 });
        }

        let mut seed = self.seed.get();
        for _ in 0..PREDICATE_DRAW_LIMIT {
            let (index, next) = seed.next_bounded(pool.len() as u64);
            seed = next;
            let element = &pool[index as usize];
            if predicate(element) {
                self.seed.set(seed);
                return Ok(element.clone());
            }
        }
        self.seed.set(seed);
        Err(SpecimenError::PredicateExhausted {
            attempts: PREDICATE_DRAW_LIMIT,
        })
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}
