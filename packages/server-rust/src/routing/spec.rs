//! Method specification table: operation kind and model extractor per method.

use std::collections::{BTreeSet, HashMap};

use tsdb_core::{ArgValue, CallArgs, Model, OperationKind};

use self::ModelExtractor::{Forbidden, KeyedItems, MultipleModels, SingleModel};
use super::operation::{ExtractError, SpecError};

// ---------------------------------------------------------------------------
// ModelExtractor
// ---------------------------------------------------------------------------

/// Finds the models a call touches by inspecting its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelExtractor {
    /// `model`: a single model.
    SingleModel,
    /// `models`: a list of models.
    MultipleModels,
    /// `field`: a list of `arity`-sized tuples, each starting with a model.
    KeyedItems { field: &'static str, arity: usize },
    /// Never routed per model (maintenance operations).
    Forbidden,
}

impl ModelExtractor {
    /// # Errors
    ///
    /// Returns `ExtractError::Forbidden` for forbidden methods regardless of
    /// the arguments, and a shape error if the arguments lack the expected
    /// field or it does not hold models.
    pub fn extract(self, args: &CallArgs) -> Result<BTreeSet<Model>, ExtractError> {
        match self {
            ModelExtractor::SingleModel => {
                let value = require(args, "model")?;
                Ok(BTreeSet::from([model_in("model", value)?]))
            }
            ModelExtractor::MultipleModels => list_in(args, "models")?
                .iter()
                .map(|value| model_in("models", value))
                .collect(),
            ModelExtractor::KeyedItems { field, arity } => list_in(args, field)?
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let tuple = item
                        .as_list()
                        .ok_or(ExtractError::NotATuple { name: field, index })?;
                    match tuple.first() {
                        Some(first) if tuple.len() == arity => model_in(field, first),
                        _ => Err(ExtractError::WrongArity {
                            name: field,
                            index,
                            expected: arity,
                            found: tuple.len(),
                        }),
                    }
                })
                .collect(),
            ModelExtractor::Forbidden => Err(ExtractError::Forbidden),
        }
    }
}

fn require<'a>(args: &'a CallArgs, name: &'static str) -> Result<&'a ArgValue, ExtractError> {
    args.get(name).ok_or(ExtractError::MissingArgument { name })
}

fn list_in<'a>(args: &'a CallArgs, name: &'static str) -> Result<&'a [ArgValue], ExtractError> {
    require(args, name)?
        .as_list()
        .ok_or(ExtractError::NotAList { name })
}

fn model_in(name: &'static str, value: &ArgValue) -> Result<Model, ExtractError> {
    value.as_model().ok_or_else(|| ExtractError::InvalidModel {
        name,
        value: format!("{value:?}"),
    })
}

// ---------------------------------------------------------------------------
// OperationSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSpec {
    pub kind: OperationKind,
    pub extractor: ModelExtractor,
}

impl OperationSpec {
    #[must_use]
    pub const fn read(extractor: ModelExtractor) -> Self {
        Self {
            kind: OperationKind::Read,
            extractor,
        }
    }

    #[must_use]
    pub const fn write(extractor: ModelExtractor) -> Self {
        Self {
            kind: OperationKind::Write,
            extractor,
        }
    }
}

/// Specification of every method of the storage abstraction.
pub const METHOD_SPECIFICATIONS: &[(&str, OperationSpec)] = &[
    ("get_range", OperationSpec::read(SingleModel)),
    ("get_sums", OperationSpec::read(SingleModel)),
    ("get_distinct_counts_series", OperationSpec::read(SingleModel)),
    ("get_distinct_counts_totals", OperationSpec::read(SingleModel)),
    ("get_distinct_counts_union", OperationSpec::read(SingleModel)),
    ("get_most_frequent", OperationSpec::read(SingleModel)),
    ("get_most_frequent_series", OperationSpec::read(SingleModel)),
    ("get_frequency_series", OperationSpec::read(SingleModel)),
    ("get_frequency_totals", OperationSpec::read(SingleModel)),
    ("incr", OperationSpec::write(SingleModel)),
    ("incr_multi", OperationSpec::write(KeyedItems { field: "items", arity: 2 })),
    ("merge", OperationSpec::write(SingleModel)),
    ("delete", OperationSpec::write(MultipleModels)),
    ("record", OperationSpec::write(SingleModel)),
    ("record_multi", OperationSpec::write(KeyedItems { field: "items", arity: 3 })),
    ("merge_distinct_counts", OperationSpec::write(SingleModel)),
    ("delete_distinct_counts", OperationSpec::write(MultipleModels)),
    ("record_frequency_multi", OperationSpec::write(KeyedItems { field: "requests", arity: 2 })),
    ("merge_frequencies", OperationSpec::write(SingleModel)),
    ("delete_frequencies", OperationSpec::write(MultipleModels)),
    ("flush", OperationSpec::write(Forbidden)),
];

// ---------------------------------------------------------------------------
// MethodTable
// ---------------------------------------------------------------------------

/// Lookup over [`METHOD_SPECIFICATIONS`] (or a custom table in tests).
#[derive(Debug, Clone)]
pub struct MethodTable {
    specs: HashMap<&'static str, OperationSpec>,
    /// Names given more than once; the last entry wins in `specs`.
    duplicates: BTreeSet<&'static str>,
}

impl MethodTable {
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_entries(METHOD_SPECIFICATIONS.iter().copied())
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (&'static str, OperationSpec)>) -> Self {
        let mut specs = HashMap::new();
        let mut duplicates = BTreeSet::new();
        for (method, spec) in entries {
            if specs.insert(method, spec).is_some() {
                duplicates.insert(method);
            }
        }
        Self { specs, duplicates }
    }

    #[must_use]
    pub fn spec_of(&self, method: &str) -> Option<&OperationSpec> {
        self.specs.get(method)
    }

    /// Specified method names, sorted.
    #[must_use]
    pub fn methods(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.specs.keys().copied().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Checks the table against the methods the storage abstraction exposes.
    ///
    /// # Errors
    ///
    /// - `SpecError::DuplicateSpecification` if a method was given more than once
    /// - `SpecError::MissingSpecification` unless the table keys equal
    ///   `read_methods ∪ write_methods`
    /// - `SpecError::KindMismatch` if a method's specified kind differs from
    ///   the list it is declared in
    pub fn verify(&self, read_methods: &[&str], write_methods: &[&str]) -> Result<(), SpecError> {
        if !self.duplicates.is_empty() {
            return Err(SpecError::DuplicateSpecification {
                methods: self.duplicates.iter().map(ToString::to_string).collect(),
            });
        }

        let declared: BTreeSet<&str> = read_methods.iter().chain(write_methods).copied().collect();
        let specified: BTreeSet<&str> = self.specs.keys().copied().collect();

        let unspecified: Vec<String> = declared.difference(&specified).map(ToString::to_string).collect();
        let retired: Vec<String> = specified.difference(&declared).map(ToString::to_string).collect();
        if !unspecified.is_empty() || !retired.is_empty() {
            return Err(SpecError::MissingSpecification { unspecified, retired });
        }

        let declared_kinds = read_methods
            .iter()
            .map(|m| (*m, OperationKind::Read))
            .chain(write_methods.iter().map(|m| (*m, OperationKind::Write)));
        for (method, declared) in declared_kinds {
            let Some(specified) = self.specs.get(method).map(|spec| spec.kind) else {
                continue;
            };
            if specified != declared {
                return Err(SpecError::KindMismatch {
                    method: method.to_string(),
                    declared,
                    specified,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
