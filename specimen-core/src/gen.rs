//! Generator variants bound to template fields.

use crate::data::Value;
use crate::error::{Result, SpecimenError};
use crate::sampler::Sampler;
use crate::template::{FieldCtx, Instance};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

/// Post-selection transform applied by [`Generator::map`].
pub type Transform = Rc<dyn Fn(Value) -> Value>;

/// Computed dependent value, evaluated against the in-progress instance.
pub type Computed = Rc<dyn Fn(&mut FieldCtx<'_>) -> Result<Value>>;

/// Cross-field side effect: given the owning field's produced value and
/// the fully-resolved instance, computes the value written to the target
/// field.
pub type SideEffect = Rc<dyn Fn(&Value, &Instance) -> Value>;

/// One candidate of a weighted choice.
pub enum Candidate {
    /// A literal value, returned as-is when chosen.
    Value(Value),
    /// A nested generator, delegated to when chosen.
    Gen(Generator),
    /// An inclusive integer range; when chosen, the range is
    /// materialized through the template's [`crate::cache::RangeCache`]
    /// and a uniform element of it is drawn.
    Range(i64, i64),
}

impl Candidate {
    /// A literal candidate.
    pub fn value(value: impl Into<Value>) -> Self {
        Candidate::Value(value.into())
    }

    /// A nested-generator candidate.
    pub fn gen(generator: Generator) -> Self {
        Candidate::Gen(generator)
    }

    /// An inclusive integer range candidate.
    pub fn range(low: i64, high: i64) -> Self {
        Candidate::Range(low, high)
    }
}

/// The result of a dependent-mapping entry.
pub enum Mapped {
    /// A literal result value.
    Value(Value),
    /// A computed result with read access to already-resolved fields.
    Computed(Computed),
}

impl Mapped {
    /// A literal mapping result.
    pub fn value(value: impl Into<Value>) -> Self {
        Mapped::Value(value.into())
    }

    /// A computed mapping result.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&mut FieldCtx<'_>) -> Result<Value> + 'static,
    {
        Mapped::Computed(Rc::new(f))
    }
}

/// Cycling policy for file-backed generators.
///
/// Only `Linear` is defined today; the enum is the extension point for
/// other policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Cycle through the file's lines in order, wrapping around.
    Linear,
}

/// A field generator: produces one value per invocation.
///
/// Generators own their internal state (a counter's current value, a
/// cycle's call count, a file's loaded lines) behind interior
/// mutability, so the state persists for the generator's lifetime and
/// successive `make()` calls see deterministic progressions.
pub struct Generator {
    kind: GenKind,
}

enum GenKind {
    Constant(Value),
    Counter(Cell<i64>),
    Choice {
        candidates: Vec<Candidate>,
        sampler: Sampler,
    },
    SequenceCycle {
        items: Vec<Value>,
        calls: Cell<usize>,
    },
    FileCycle {
        path: PathBuf,
        mode: FileMode,
        lines: RefCell<Option<Rc<Vec<String>>>>,
        calls: Cell<usize>,
    },
    Dependent {
        source: String,
        mapping: Vec<(Value, Mapped)>,
        default: Option<Mapped>,
    },
    Subset(Vec<Generator>),
    RequiresField {
        target: String,
        inner: Box<Generator>,
        effect: SideEffect,
    },
    Map {
        inner: Box<Generator>,
        transform: Transform,
    },
}

impl Generator {
    /// Always produce the same literal value.
    pub fn constant(value: impl Into<Value>) -> Self {
        Generator {
            kind: GenKind::Constant(value.into()),
        }
    }

    /// Produce `start`, `start + 1`, … across successive calls.
    pub fn counter(start: i64) -> Self {
        Generator {
            kind: GenKind::Counter(Cell::new(start)),
        }
    }

    /// Choose uniformly among the candidates on every call.
    pub fn one_of(candidates: Vec<Candidate>) -> Self {
        let sampler = Sampler::uniform(candidates.len());
        Generator {
            kind: GenKind::Choice {
                candidates,
                sampler,
            },
        }
    }

    /// Choose among the candidates proportionally to `weights`.
    ///
    /// Fails with [`SpecimenError::HistogramMismatch`] when the weight
    /// and candidate counts differ, before anything is sampled.
    pub fn one_of_weighted(candidates: Vec<Candidate>, weights: &[f64]) -> Result<Self> {
        let sampler = Sampler::from_weights(weights, candidates.len())?;
        Ok(Generator {
            kind: GenKind::Choice {
                candidates,
                sampler,
            },
        })
    }

    /// Cycle through `items` in order, wrapping around.
    pub fn read_from_sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Generator {
            kind: GenKind::SequenceCycle {
                items: items.into_iter().map(Into::into).collect(),
                calls: Cell::new(0),
            },
        }
    }

    /// Cycle through the lines of a newline-delimited text file.
    ///
    /// The file is read eagerly on the first call, line terminators
    /// trimmed; after that the generator behaves like
    /// [`Generator::read_from_sequence`] over the loaded lines.
    pub fn read_from_file(path: impl Into<PathBuf>, mode: FileMode) -> Self {
        Generator {
            kind: GenKind::FileCycle {
                path: path.into(),
                mode,
                lines: RefCell::new(None),
                calls: Cell::new(0),
            },
        }
    }

    /// Derive this field from another field's resolved value.
    ///
    /// The source field is resolved on demand. The mapping is matched by
    /// exact value; a miss falls back to `default` when present, and to
    /// [`Value::Absent`] otherwise — an absent value is not an error.
    pub fn depending_on(
        source: impl Into<String>,
        mapping: Vec<(Value, Mapped)>,
        default: Option<Mapped>,
    ) -> Self {
        Generator {
            kind: GenKind::Dependent {
                source: source.into(),
                mapping,
                default,
            },
        }
    }

    /// Produce a random non-empty subset of the sub-generators' values.
    ///
    /// The subset size is uniform in `[1, N]` and the members are chosen
    /// uniformly without replacement; results keep the original list
    /// order.
    pub fn subset(generators: Vec<Generator>) -> Self {
        Generator {
            kind: GenKind::Subset(generators),
        }
    }

    /// Produce the inner generator's value and additionally overwrite
    /// `target` after resolution finishes.
    ///
    /// The effect runs once every declared field has resolved, so its
    /// write always wins over the target field's own generator.
    pub fn requires_field<F>(target: impl Into<String>, inner: Generator, effect: F) -> Self
    where
        F: Fn(&Value, &Instance) -> Value + 'static,
    {
        Generator {
            kind: GenKind::RequiresField {
                target: target.into(),
                inner: Box::new(inner),
                effect: Rc::new(effect),
            },
        }
    }

    /// Transform this generator's output with `f`.
    ///
    /// This is the post-selection transform of a weighted choice, kept
    /// general enough to wrap any generator.
    pub fn map<F>(self, f: F) -> Self
    where
        F: Fn(Value) -> Value + 'static,
    {
        Generator {
            kind: GenKind::Map {
                inner: Box::new(self),
                transform: Rc::new(f),
            },
        }
    }

    pub(crate) fn produce(&self, ctx: &mut FieldCtx<'_>) -> Result<Value> {
        match &self.kind {
            GenKind::Constant(value) => Ok(value.clone()),
            GenKind::Counter(current) => {
                let n = current.get();
                current.set(n.wrapping_add(1));
                Ok(Value::Int(n))
            }
            GenKind::Choice {
                candidates,
                sampler,
            } => {
                let index = ctx.draw(sampler)?;
                match &candidates[index] {
                    Candidate::Value(value) => Ok(value.clone()),
                    Candidate::Gen(generator) => generator.produce(ctx),
                    Candidate::Range(low, high) => {
                        let sequence = ctx.cache().materialize(*low, *high);
                        if sequence.is_empty() {
                            return Err(SpecimenError::EmptyChoice);
                        }
                        let i = ctx.rand_bounded(sequence.len() as u64) as usize;
                        Ok(Value::Int(sequence[i]))
                    }
                }
            }
            GenKind::SequenceCycle { items, calls } => {
                if items.is_empty() {
                    return Err(SpecimenError::EmptyChoice);
                }
                let index = calls.get() % items.len();
                calls.set(calls.get().wrapping_add(1));
                Ok(items[index].clone())
            }
            GenKind::FileCycle {
                path,
                mode,
                lines,
                calls,
            } => {
                let loaded = {
                    let mut slot = lines.borrow_mut();
                    match &*slot {
                        Some(loaded) => Rc::clone(loaded),
                        None => {
                            let text = std::fs::read_to_string(path).map_err(|source| {
                                SpecimenError::FileRead {
                                    path: path.clone(),
                                    source,
                                }
                            })?;
                            let loaded = Rc::new(
                                text.lines().map(str::to_string).collect::<Vec<String>>(),
                            );
                            *slot = Some(Rc::clone(&loaded));
                            loaded
                        }
                    }
                };
                if loaded.is_empty() {
                    return Err(SpecimenError::EmptyChoice);
                }
                let index = match mode {
                    FileMode::Linear => calls.get() % loaded.len(),
                };
                calls.set(calls.get().wrapping_add(1));
                Ok(Value::Str(loaded[index].clone()))
            }
            GenKind::Dependent {
                source,
                mapping,
                default,
            } => {
                let resolved = ctx.get(source)?;
                let entry = mapping
                    .iter()
                    .find(|(key, _)| *key == resolved)
                    .map(|(_, mapped)| mapped)
                    .or(default.as_ref());
                match entry {
                    Some(Mapped::Value(value)) => Ok(value.clone()),
                    Some(Mapped::Computed(f)) => (**f)(ctx),
                    None => Ok(Value::Absent),
                }
            }
            GenKind::Subset(generators) => {
                let n = generators.len();
                if n == 0 {
                    return Err(SpecimenError::EmptyChoice);
                }
                let k = 1 + ctx.rand_bounded(n as u64) as usize;
                let mut indices: Vec<usize> = (0..n).collect();
                for i in 0..k {
                    let j = i + ctx.rand_bounded((n - i) as u64) as usize;
                    indices.swap(i, j);
                }
                // Original list order, not selection order
                let mut chosen = indices[..k].to_vec();
                chosen.sort_unstable();
                let mut results = Vec::with_capacity(k);
                for index in chosen {
                    results.push(generators[index].produce(ctx)?);
                }
                Ok(Value::List(results))
            }
            GenKind::RequiresField {
                target,
                inner,
                effect,
            } => {
                let value = inner.produce(ctx)?;
                ctx.push_effect(target.clone(), Rc::clone(effect), value.clone());
                Ok(value)
            }
            GenKind::Map { inner, transform } => {
                let value = inner.produce(ctx)?;
                Ok((**transform)(value))
            }
        }
    }
}
