//! Templates, instances, and the per-instance field resolution engine.

use crate::cache::RangeCache;
use crate::collection::{Collection, Registry};
use crate::data::{Seed, Value};
use crate::error::{Result, SpecimenError};
use crate::gen::{Generator, SideEffect};
use crate::sampler::Sampler;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A named, immutable field schema.
///
/// Built once through [`Template::builder`]; afterwards the field set
/// and generator graph are fixed. Every random draw made while
/// resolving an instance advances the template's own seed, so a
/// template built with an explicit [`Seed`] reproduces the same
/// progression of instances run after run.
pub struct Template {
    name: String,
    fields: Vec<(String, Generator)>,
    seed: Cell<Seed>,
    cache: RangeCache,
}

/// Builder for [`Template`].
pub struct TemplateBuilder {
    name: String,
    fields: Vec<(String, Generator)>,
    seed: Option<Seed>,
    cache: Option<RangeCache>,
}

impl TemplateBuilder {
    /// Declare a field bound to a generator.
    ///
    /// Declaration order is preserved; redeclaring a field replaces its
    /// generator in place.
    pub fn field(mut self, name: impl Into<String>, generator: Generator) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = generator,
            None => self.fields.push((name, generator)),
        }
        self
    }

    /// Use an explicit seed instead of an entropy-derived one.
    pub fn seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Share a range cache with other templates.
    pub fn range_cache(mut self, cache: RangeCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Finish the declaration.
    pub fn build(self) -> Template {
        Template {
            name: self.name,
            fields: self.fields,
            seed: Cell::new(self.seed.unwrap_or_else(Seed::random)),
            cache: self.cache.unwrap_or_default(),
        }
    }
}

impl Template {
    /// Start declaring a template with the given name.
    pub fn builder(name: impl Into<String>) -> TemplateBuilder {
        TemplateBuilder {
            name: name.into(),
            fields: Vec::new(),
            seed: None,
            cache: None,
        }
    }

    /// The template's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared field names, in declaration order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Number of declared fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(field, _)| field == name)
    }

    /// Resolve every declared field and return one instance.
    ///
    /// Fields are processed in declaration order; a dependent field
    /// pulls its source in early, and a circular reference aborts the
    /// whole call with [`SpecimenError::CircularDependency`] — no
    /// partial instance is ever returned. Pending cross-field side
    /// effects are applied after all fields have resolved, in the order
    /// their owning fields resolved, so their writes win.
    pub fn make(&self) -> Result<Rc<Instance>> {
        let mut ctx = FieldCtx {
            template: self,
            slots: (0..self.fields.len()).map(|_| Slot::Unresolved).collect(),
            pending: Vec::new(),
        };
        let mut values = Vec::with_capacity(self.fields.len());
        for index in 0..self.fields.len() {
            values.push(ctx.resolve_index(index)?);
        }

        let resolved = self
            .fields
            .iter()
            .map(|(name, _)| name.clone())
            .zip(values)
            .collect();
        let instance = Rc::new(Instance {
            template: self.name.clone(),
            fields: RefCell::new(resolved),
        });

        for PendingEffect {
            target,
            effect,
            value,
        } in ctx.pending
        {
            if self.field_index(&target).is_none() {
                return Err(SpecimenError::UnknownField {
                    field: target,
                    template: self.name.clone(),
                });
            }
            let computed = (*effect)(&value, &instance);
            instance.set(&target, computed);
        }

        Ok(instance)
    }

    /// Make `count` instances into a fresh collection and register it
    /// against this template's name — the `template * n` convenience.
    pub fn replicate(&self, count: usize, registry: &Registry) -> Result<Collection> {
        let collection = Collection::for_template(self);
        for _ in 0..count {
            collection.append(self.make()?)?;
        }
        registry.register(&self.name, &collection);
        Ok(collection)
    }
}

/// One fully-resolved object produced by a single `make()` call.
///
/// Field access goes through `&self`, so an instance shared by several
/// collections stays writable for cross-field side effects.
#[derive(Debug)]
pub struct Instance {
    template: String,
    fields: RefCell<Vec<(String, Value)>>,
}

impl Instance {
    /// Name of the template this instance was made from.
    pub fn template_name(&self) -> &str {
        &self.template
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Read a field's value; unknown fields read as [`Value::Absent`].
    pub fn get(&self, field: &str) -> Value {
        self.fields
            .borrow()
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Absent)
    }

    /// Write a field's value, adding the field if it was never declared.
    pub fn set(&self, field: &str, value: impl Into<Value>) {
        let value = value.into();
        let mut fields = self.fields.borrow_mut();
        match fields.iter_mut().find(|(name, _)| name == field) {
            Some(slot) => slot.1 = value,
            None => fields.push((field.to_string(), value)),
        }
    }
}

enum Slot {
    Unresolved,
    InProgress,
    Resolved(Value),
}

struct PendingEffect {
    target: String,
    effect: SideEffect,
    value: Value,
}

/// Resolution context handed to generators during one `make()` call.
///
/// Grants read access to already-resolved fields (resolving them on
/// demand), random draws from the template's seed, and the template's
/// range cache.
pub struct FieldCtx<'a> {
    template: &'a Template,
    slots: Vec<Slot>,
    pending: Vec<PendingEffect>,
}

impl FieldCtx<'_> {
    /// Read another field of the in-progress instance, resolving it
    /// first if needed.
    pub fn get(&mut self, field: &str) -> Result<Value> {
        let index =
            self.template
                .field_index(field)
                .ok_or_else(|| SpecimenError::UnknownField {
                    field: field.to_string(),
                    template: self.template.name.clone(),
                })?;
        self.resolve_index(index)
    }

    fn resolve_index(&mut self, index: usize) -> Result<Value> {
        match &self.slots[index] {
            Slot::Resolved(value) => return Ok(value.clone()),
            Slot::InProgress => {
                return Err(SpecimenError::CircularDependency {
                    field: self.template.fields[index].0.clone(),
                })
            }
            Slot::Unresolved => {}
        }

        self.slots[index] = Slot::InProgress;
        let template = self.template;
        let (_, generator) = &template.fields[index];
        let value = generator.produce(self)?;
        self.slots[index] = Slot::Resolved(value.clone());
        Ok(value)
    }

    pub(crate) fn draw(&self, sampler: &Sampler) -> Result<usize> {
        let (index, next) = sampler.sample(self.template.seed.get())?;
        self.template.seed.set(next);
        Ok(index)
    }

    pub(crate) fn rand_bounded(&self, bound: u64) -> u64 {
        let (value, next) = self.template.seed.get().next_bounded(bound);
        self.template.seed.set(next);
        value
    }

    pub(crate) fn cache(&self) -> &RangeCache {
        &self.template.cache
    }

    pub(crate) fn push_effect(&mut self, target: String, effect: SideEffect, value: Value) {
        self.pending.push(PendingEffect {
            target,
            effect,
            value,
        });
    }
}
