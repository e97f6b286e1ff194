//! Per-variable modifier stacks and the factory that builds them.

use crate::error::SolveError;
use crate::modifier::{Modifier, ModifierKey, Source};
use indexmap::IndexMap;
use skein_core::{Format, Value};
use skein_formula::{EvalContext, EvalError};
use std::sync::Arc;

/// One derivation step in a [`Solver::diagnose`] report.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessStep {
    /// The attachment source (`defaults` for the leading default step).
    pub source: Source,
    /// The operation applied at this step.
    pub operation: String,
    /// The running value after this step.
    pub value: Value,
}

/// The ordered modifier stack computing one variable's value.
///
/// Modifiers are held strictly in priority order, ties broken by
/// insertion order. Processing starts from the solver's default value
/// and threads the running value through each modifier as its INPUT.
pub struct Solver {
    format: Format,
    default: Value,
    modifiers: Vec<(Arc<dyn Modifier>, Source)>,
}

impl Solver {
    /// Create a solver for `format` starting from `default`.
    ///
    /// Callers go through [`SolverFactory::build_solver`], which supplies
    /// the configured default and guarantees it inhabits the format.
    pub fn new(format: Format, default: Value) -> Self {
        Self {
            format,
            default,
            modifiers: Vec::new(),
        }
    }

    /// The format this solver computes.
    pub fn format(&self) -> &Format {
        &self.format
    }

    /// The default value processing starts from.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// The attached `(modifier, source)` pairs in application order.
    pub fn modifiers(&self) -> impl Iterator<Item = (&Arc<dyn Modifier>, &Source)> {
        self.modifiers.iter().map(|(m, s)| (m, s))
    }

    /// Whether a `(key, source)` pair is attached.
    pub fn contains(&self, key: &ModifierKey, source: &Source) -> bool {
        self.modifiers
            .iter()
            .any(|(m, s)| s == source && m.key() == *key)
    }

    /// Attach a modifier.
    ///
    /// Rejects duplicates by `(key, source)` identity and modifiers whose
    /// format is not a subformat of the solver's.
    pub fn add_modifier(
        &mut self,
        modifier: Arc<dyn Modifier>,
        source: Source,
    ) -> Result<(), SolveError> {
        if !modifier.format().is_subformat_of(&self.format) {
            return Err(SolveError::FormatMismatch {
                expected: self.format.clone(),
                found: modifier.format(),
            });
        }
        if self.contains(&modifier.key(), &source) {
            return Err(SolveError::Internal {
                detail: format!(
                    "duplicate modifier {} from source '{source}'",
                    modifier.key()
                ),
            });
        }
        let priority = modifier.priority();
        let position = self
            .modifiers
            .partition_point(|(m, _)| m.priority() <= priority);
        self.modifiers.insert(position, (modifier, source));
        Ok(())
    }

    /// Detach the first pair matching `(key, source)`. Returns whether a
    /// pair was removed; absent pairs are a no-op.
    pub fn remove_modifier(&mut self, key: &ModifierKey, source: &Source) -> bool {
        if let Some(position) = self
            .modifiers
            .iter()
            .position(|(m, s)| s == source && m.key() == *key)
        {
            self.modifiers.remove(position);
            true
        } else {
            false
        }
    }

    /// Compute the value: default first, then each modifier in priority
    /// order with the running value as its INPUT.
    pub fn process(&self, ctx: &mut EvalContext<'_>) -> Result<Value, EvalError> {
        let mut current = self.default.clone();
        for (modifier, _) in &self.modifiers {
            current = ctx.with_input(current, |ctx| modifier.process(ctx))?;
        }
        Ok(current)
    }

    /// Compute the value, emitting one [`ProcessStep`] per derivation
    /// step (the default included) for debugging.
    pub fn diagnose(&self, ctx: &mut EvalContext<'_>) -> Result<Vec<ProcessStep>, EvalError> {
        let mut steps = vec![ProcessStep {
            source: Source::new("defaults"),
            operation: "DEFAULT".to_string(),
            value: self.default.clone(),
        }];
        let mut current = self.default.clone();
        for (modifier, source) in &self.modifiers {
            current = ctx.with_input(current, |ctx| modifier.process(ctx))?;
            steps.push(ProcessStep {
                source: source.clone(),
                operation: modifier.operation().to_string(),
                value: current.clone(),
            });
        }
        Ok(steps)
    }
}

// ── Factory ────────────────────────────────────────────────────────

/// Builds [`Solver`]s and owns the per-format default values.
///
/// Scalar formats need an explicitly configured default; array formats
/// fall back to the empty array of their element format.
#[derive(Clone, Debug, Default)]
pub struct SolverFactory {
    defaults: IndexMap<Format, Value>,
}

impl SolverFactory {
    /// Create a factory with no configured defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the default value for a format.
    ///
    /// Rejects values the format does not accept.
    pub fn set_default(&mut self, format: Format, value: Value) -> Result<(), SolveError> {
        if !format.accepts(&value) {
            return Err(SolveError::FormatMismatch {
                expected: format,
                found: value.format(),
            });
        }
        self.defaults.insert(format, value);
        Ok(())
    }

    /// The default value for a format, if one is available.
    pub fn default_for(&self, format: &Format) -> Option<Value> {
        if let Some(value) = self.defaults.get(format) {
            return Some(value.clone());
        }
        match format {
            Format::Array(elem) => Some(Value::array((**elem).clone(), Vec::new())),
            _ => None,
        }
    }

    /// Build an empty solver for a format.
    pub fn build_solver(&self, format: Format) -> Result<Solver, SolveError> {
        let default = self
            .default_for(&format)
            .ok_or_else(|| SolveError::MissingDefault {
                format: format.clone(),
            })?;
        Ok(Solver::new(format, default))
    }

    /// The asserted formats for which no default is available.
    ///
    /// Mirrors the variable library's diagnostic surface: feed it the
    /// library's asserted formats and report what comes back.
    pub fn formats_without_default<'a>(
        &self,
        formats: impl Iterator<Item = &'a Format>,
    ) -> Vec<Format> {
        formats
            .filter(|format| self.default_for(format).is_none())
            .cloned()
            .collect()
    }
}
