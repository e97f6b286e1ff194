//! The [`Modifier`] trait, modifier identity, and the built-in
//! calculation modifiers.

use skein_core::{Format, InstanceId, Value};
use skein_formula::{
    BinaryOp, DepContext, EvalContext, EvalError, Formula, SemanticsError,
};
use std::fmt;

// ── Identity ───────────────────────────────────────────────────────

/// An opaque tag naming where a modifier attachment came from.
///
/// Removal is by `(modifier, source)` equality, so a client that attaches
/// the same modifier from two sources can retract them independently.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Source(String);

impl Source {
    /// Create a source tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The value identity of a modifier: priority, operation name, and the
/// instruction text that round-trips its configuration.
///
/// Two modifiers with equal keys are interchangeable for attachment,
/// removal, and dependency-edge bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModifierKey {
    /// Application priority; lower applies first.
    pub priority: u32,
    /// The operation name, e.g. `SET` or `ADD[3]`.
    pub operation: String,
    /// The operand's source text.
    pub instructions: String,
}

impl fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.priority, self.operation, self.instructions)
    }
}

// ── Trait ──────────────────────────────────────────────────────────

/// A unit of computation in a variable's solver stack.
///
/// Given the running value (the context's INPUT) a modifier produces the
/// next value of the same format. Modifiers are stateless and shared;
/// per-attachment identity is the `(key, source)` pair.
pub trait Modifier: Send + Sync {
    /// Apply this modifier. The context's INPUT holds the running value.
    fn process(&self, ctx: &mut EvalContext<'_>) -> Result<Value, EvalError>;

    /// Record the variables this modifier reads during [`process`](Modifier::process).
    fn dependencies(&self, ctx: &mut DepContext<'_>) -> Result<(), SemanticsError>;

    /// Application priority; lower applies first, ties keep insertion
    /// order.
    fn priority(&self) -> u32;

    /// The operation name for diagnostics and identity.
    fn operation(&self) -> &str;

    /// The operand's source text, round-tripping the configuration.
    fn instructions(&self) -> String;

    /// The format of values this modifier consumes and produces.
    fn format(&self) -> Format;

    /// The value identity of this modifier.
    fn key(&self) -> ModifierKey {
        ModifierKey {
            priority: self.priority(),
            operation: self.operation().to_string(),
            instructions: self.instructions(),
        }
    }
}

// ── Calculation modifiers ──────────────────────────────────────────

/// How a [`CalcModifier`] combines its operand with the running value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifierOp {
    /// Replace the running value with the operand.
    Set,
    /// Add the operand to the running value.
    Add,
    /// Multiply the running value by the operand.
    Multiply,
    /// Keep the smaller of running value and operand.
    Min,
    /// Keep the larger of running value and operand.
    Max,
}

impl ModifierOp {
    /// The operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Add => "ADD",
            Self::Multiply => "MULTIPLY",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }

    /// Default priority: sets apply before additions, additions before
    /// multiplications, and clamps last.
    pub fn default_priority(&self) -> u32 {
        match self {
            Self::Set => 0,
            Self::Add => 10,
            Self::Multiply => 20,
            Self::Min | Self::Max => 30,
        }
    }
}

/// A modifier operand: a constant or a formula evaluated on demand.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// A constant value.
    Literal(Value),
    /// A formula evaluated each time the modifier runs.
    Formula(Formula),
}

impl Operand {
    fn format(&self) -> Format {
        match self {
            Self::Literal(value) => value.format(),
            Self::Formula(formula) => formula.format().clone(),
        }
    }

    fn instructions(&self) -> String {
        match self {
            Self::Literal(value) => value.to_string(),
            Self::Formula(formula) => formula.canonical().to_string(),
        }
    }
}

/// The built-in calculation modifier: one of [`ModifierOp`] over a
/// literal or formula operand.
///
/// The modifier remembers the scope instance it was attached from and
/// resolves its operand there, so a formula attached from an `Equipment`
/// instance reads that instance's variables even when the modified
/// variable is global.
#[derive(Clone, Debug)]
pub struct CalcModifier {
    op: ModifierOp,
    operand: Operand,
    format: Format,
    priority: u32,
    scope: InstanceId,
}

impl CalcModifier {
    /// Create a modifier combining `operand` into the running value.
    ///
    /// The modifier's format is the operand's. `scope` is the instance
    /// the operand's identifiers resolve from.
    pub fn new(op: ModifierOp, operand: Operand, scope: InstanceId) -> Self {
        let format = operand.format();
        Self {
            op,
            operand,
            format,
            priority: op.default_priority(),
            scope,
        }
    }

    /// A `SET` of a constant value.
    pub fn set(value: Value, scope: InstanceId) -> Self {
        Self::new(ModifierOp::Set, Operand::Literal(value), scope)
    }

    /// A `SET` of a formula result.
    pub fn set_formula(formula: Formula, scope: InstanceId) -> Self {
        Self::new(ModifierOp::Set, Operand::Formula(formula), scope)
    }

    /// An `ADD` of a constant value.
    pub fn add(value: Value, scope: InstanceId) -> Self {
        Self::new(ModifierOp::Add, Operand::Literal(value), scope)
    }

    /// An `ADD` of a formula result.
    pub fn add_formula(formula: Formula, scope: InstanceId) -> Self {
        Self::new(ModifierOp::Add, Operand::Formula(formula), scope)
    }

    /// Override the default priority.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// The combination this modifier performs.
    pub fn op(&self) -> ModifierOp {
        self.op
    }

    /// The instance this modifier's operand resolves from.
    pub fn scope(&self) -> InstanceId {
        self.scope
    }
}

impl Modifier for CalcModifier {
    fn process(&self, ctx: &mut EvalContext<'_>) -> Result<Value, EvalError> {
        let operand = match &self.operand {
            Operand::Literal(value) => value.clone(),
            Operand::Formula(formula) => {
                ctx.with_instance(self.scope, |ctx| formula.resolve(ctx))?
            }
        };
        if self.op == ModifierOp::Set {
            return Ok(operand);
        }
        let input = ctx
            .input()
            .cloned()
            .ok_or_else(|| EvalError::Internal {
                detail: format!("{} modifier processed with no input", self.op.name()),
            })?;
        match self.op {
            ModifierOp::Add => ctx
                .runtime()
                .operators
                .evaluate_binary(BinaryOp::Add, &input, &operand),
            ModifierOp::Multiply => ctx
                .runtime()
                .operators
                .evaluate_binary(BinaryOp::Multiply, &input, &operand),
            ModifierOp::Min | ModifierOp::Max => {
                let (a, b) = match (input.as_real(), operand.as_real()) {
                    (Some(a), Some(b)) => (a, b),
                    _ => {
                        return Err(EvalError::Internal {
                            detail: format!(
                                "{} modifier over non-numeric values",
                                self.op.name()
                            ),
                        })
                    }
                };
                let keep_input = if self.op == ModifierOp::Min {
                    a <= b
                } else {
                    a >= b
                };
                Ok(if keep_input { input } else { operand })
            }
            ModifierOp::Set => Ok(operand),
        }
    }

    fn dependencies(&self, ctx: &mut DepContext<'_>) -> Result<(), SemanticsError> {
        match &self.operand {
            Operand::Literal(_) => Ok(()),
            Operand::Formula(formula) => {
                ctx.with_instance(self.scope, |ctx| formula.dependencies(ctx))
            }
        }
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn operation(&self) -> &str {
        self.op.name()
    }

    fn instructions(&self) -> String {
        self.operand.instructions()
    }

    fn format(&self) -> Format {
        self.format
            .clone()
    }
}
