//! The function interface and the built-in function library.

use crate::ast::Expr;
use crate::deps::{capture, DepContext};
use crate::error::{EvalError, SemanticsError};
use crate::eval::{evaluate, EvalContext};
use crate::semantics::{check, SemanticsContext};
use indexmap::IndexMap;
use skein_core::{Format, Value};

/// A named function callable from formulas.
///
/// Functions own their argument subtrees: each pass hands the unvisited
/// argument expressions to the function, which re-enters the pass on the
/// subtrees it chooses to use. This is what lets `if` skip a branch and
/// `arg` substitute a caller-supplied subtree.
pub trait Function: Send + Sync {
    /// The name formulas call this function by.
    fn name(&self) -> &'static str;

    /// Semantic check: validate the arguments and return the result
    /// format. `asserted` is the format the surrounding context expects,
    /// if it expects one.
    fn check_semantics(
        &self,
        ctx: &mut SemanticsContext<'_>,
        args: &[Expr],
        asserted: Option<&Format>,
    ) -> Result<Format, SemanticsError>;

    /// Dependency capture. The default visits every argument subtree.
    fn get_dependencies(
        &self,
        ctx: &mut DepContext<'_>,
        args: &[Expr],
    ) -> Result<(), SemanticsError> {
        for arg in args {
            capture(arg, ctx)?;
        }
        Ok(())
    }

    /// Evaluate the call.
    fn evaluate(
        &self,
        ctx: &mut EvalContext<'_>,
        args: &[Expr],
        asserted: Option<&Format>,
    ) -> Result<Value, EvalError>;
}

/// Name-keyed function lookup.
///
/// Registering a function under an existing name replaces it.
#[derive(Default)]
pub struct FunctionLibrary {
    functions: IndexMap<String, Box<dyn Function>>,
}

impl FunctionLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library with the built-in functions registered:
    /// `abs`, `min`, `max`, `if`, `length`, and `arg`.
    pub fn with_builtins() -> Self {
        let mut lib = Self::new();
        lib.add(Box::new(AbsFunction));
        lib.add(Box::new(ExtremumFunction { minimum: true }));
        lib.add(Box::new(ExtremumFunction { minimum: false }));
        lib.add(Box::new(IfFunction));
        lib.add(Box::new(LengthFunction));
        lib.add(Box::new(ArgFunction));
        lib
    }

    /// Register a function under its own name.
    pub fn add(&mut self, function: Box<dyn Function>) {
        self.functions.insert(function.name().to_string(), function);
    }

    /// Look up a function by name.
    pub fn lookup(&self, name: &str) -> Option<&dyn Function> {
        self.functions.get(name).map(Box::as_ref)
    }
}

// ── abs ────────────────────────────────────────────────────────────

/// `abs(n)`: absolute value, integer-preserving.
struct AbsFunction;

impl Function for AbsFunction {
    fn name(&self) -> &'static str {
        "abs"
    }

    fn check_semantics(
        &self,
        ctx: &mut SemanticsContext<'_>,
        args: &[Expr],
        _asserted: Option<&Format>,
    ) -> Result<Format, SemanticsError> {
        if args.len() != 1 {
            return Err(SemanticsError::WrongArgumentCount {
                function: self.name().to_string(),
                expected: "1",
                found: args.len(),
            });
        }
        let format = check(&args[0], ctx, None)?;
        if !format.is_numeric() {
            return Err(SemanticsError::BadArgument {
                function: self.name().to_string(),
                detail: format!("argument must be numeric, got {format}"),
            });
        }
        Ok(format)
    }

    fn evaluate(
        &self,
        ctx: &mut EvalContext<'_>,
        args: &[Expr],
        _asserted: Option<&Format>,
    ) -> Result<Value, EvalError> {
        let operand = args.first().ok_or_else(|| EvalError::Internal {
            detail: "abs called with no argument".to_string(),
        })?;
        match evaluate(operand, ctx)? {
            Value::Int(i) => Ok(Value::Int(i.wrapping_abs())),
            Value::Real(r) => Ok(Value::Real(r.abs())),
            other => Err(EvalError::Internal {
                detail: format!("abs applied to non-numeric {}", other.format()),
            }),
        }
    }
}

// ── min / max ──────────────────────────────────────────────────────

/// `min(...)` / `max(...)`: numeric extremum over two or more arguments.
///
/// The result format is integer only when every argument is an integer.
/// Evaluation returns the winning argument's value unchanged, so integer
/// inputs keep their integer identity.
struct ExtremumFunction {
    minimum: bool,
}

impl Function for ExtremumFunction {
    fn name(&self) -> &'static str {
        if self.minimum {
            "min"
        } else {
            "max"
        }
    }

    fn check_semantics(
        &self,
        ctx: &mut SemanticsContext<'_>,
        args: &[Expr],
        _asserted: Option<&Format>,
    ) -> Result<Format, SemanticsError> {
        if args.len() < 2 {
            return Err(SemanticsError::WrongArgumentCount {
                function: self.name().to_string(),
                expected: "2+",
                found: args.len(),
            });
        }
        let mut result = Format::Integer;
        for arg in args {
            let format = check(arg, ctx, None)?;
            if !format.is_numeric() {
                return Err(SemanticsError::BadArgument {
                    function: self.name().to_string(),
                    detail: format!("arguments must be numeric, got {format}"),
                });
            }
            if format == Format::Real {
                result = Format::Real;
            }
        }
        Ok(result)
    }

    fn evaluate(
        &self,
        ctx: &mut EvalContext<'_>,
        args: &[Expr],
        _asserted: Option<&Format>,
    ) -> Result<Value, EvalError> {
        let mut winner: Option<Value> = None;
        for arg in args {
            let candidate = evaluate(arg, ctx)?;
            let candidate_key = candidate.as_real().ok_or_else(|| EvalError::Internal {
                detail: format!(
                    "{} applied to non-numeric {}",
                    self.name(),
                    candidate.format()
                ),
            })?;
            winner = match winner {
                None => Some(candidate),
                Some(best) => {
                    // Keys are Some by the same check on the prior lap.
                    let best_key = best.as_real().unwrap_or_default();
                    let replace = if self.minimum {
                        candidate_key < best_key
                    } else {
                        candidate_key > best_key
                    };
                    Some(if replace { candidate } else { best })
                }
            };
        }
        winner.ok_or_else(|| EvalError::Internal {
            detail: format!("{} called with no arguments", self.name()),
        })
    }
}

// ── if ─────────────────────────────────────────────────────────────

/// `if(cond, then, else)`: lazy branch selection.
///
/// Both branches must agree on a format (one may be a subformat of the
/// other); only the selected branch is evaluated.
struct IfFunction;

impl Function for IfFunction {
    fn name(&self) -> &'static str {
        "if"
    }

    fn check_semantics(
        &self,
        ctx: &mut SemanticsContext<'_>,
        args: &[Expr],
        asserted: Option<&Format>,
    ) -> Result<Format, SemanticsError> {
        if args.len() != 3 {
            return Err(SemanticsError::WrongArgumentCount {
                function: self.name().to_string(),
                expected: "3",
                found: args.len(),
            });
        }
        let cond = check(&args[0], ctx, None)?;
        if cond != Format::Boolean {
            return Err(SemanticsError::BadArgument {
                function: self.name().to_string(),
                detail: format!("condition must be BOOLEAN, got {cond}"),
            });
        }
        let then_format = check(&args[1], ctx, asserted)?;
        let else_format = check(&args[2], ctx, asserted)?;
        if else_format.is_subformat_of(&then_format) {
            Ok(then_format)
        } else if then_format.is_subformat_of(&else_format) {
            Ok(else_format)
        } else {
            Err(SemanticsError::BadArgument {
                function: self.name().to_string(),
                detail: format!("branches disagree: {then_format} vs {else_format}"),
            })
        }
    }

    fn evaluate(
        &self,
        ctx: &mut EvalContext<'_>,
        args: &[Expr],
        _asserted: Option<&Format>,
    ) -> Result<Value, EvalError> {
        let [cond, then_branch, else_branch] = args else {
            return Err(EvalError::Internal {
                detail: format!("if called with {} argument(s)", args.len()),
            });
        };
        let cond = evaluate(cond, ctx)?;
        let branch = match cond.as_bool() {
            Some(true) => then_branch,
            Some(false) => else_branch,
            None => {
                return Err(EvalError::Internal {
                    detail: format!("if condition produced {}", cond.format()),
                })
            }
        };
        evaluate(branch, ctx)
    }
}

// ── length ─────────────────────────────────────────────────────────

/// `length(array)`: element count of an array value.
struct LengthFunction;

impl Function for LengthFunction {
    fn name(&self) -> &'static str {
        "length"
    }

    fn check_semantics(
        &self,
        ctx: &mut SemanticsContext<'_>,
        args: &[Expr],
        _asserted: Option<&Format>,
    ) -> Result<Format, SemanticsError> {
        if args.len() != 1 {
            return Err(SemanticsError::WrongArgumentCount {
                function: self.name().to_string(),
                expected: "1",
                found: args.len(),
            });
        }
        let format = check(&args[0], ctx, None)?;
        if !matches!(format, Format::Array(_)) {
            return Err(SemanticsError::BadArgument {
                function: self.name().to_string(),
                detail: format!("argument must be an array, got {format}"),
            });
        }
        Ok(Format::Integer)
    }

    fn evaluate(
        &self,
        ctx: &mut EvalContext<'_>,
        args: &[Expr],
        _asserted: Option<&Format>,
    ) -> Result<Value, EvalError> {
        let operand = args.first().ok_or_else(|| EvalError::Internal {
            detail: "length called with no argument".to_string(),
        })?;
        match evaluate(operand, ctx)? {
            Value::Array { items, .. } => Ok(Value::Int(items.len() as i64)),
            other => Err(EvalError::Internal {
                detail: format!("length applied to non-array {}", other.format()),
            }),
        }
    }
}

// ── arg ────────────────────────────────────────────────────────────

/// `arg(n)`: the macro-argument reader.
///
/// Inside a macro-style call the context carries a frame of caller
/// subtrees; `arg(n)` substitutes the `n`-th. The index must be a literal
/// non-negative integer within the current frame.
struct ArgFunction;

impl ArgFunction {
    /// The literal index, if the single argument is one.
    fn literal_index(args: &[Expr]) -> Option<usize> {
        match args {
            [Expr::Number(text)] => text.parse::<usize>().ok(),
            _ => None,
        }
    }
}

impl Function for ArgFunction {
    fn name(&self) -> &'static str {
        "arg"
    }

    fn check_semantics(
        &self,
        ctx: &mut SemanticsContext<'_>,
        args: &[Expr],
        asserted: Option<&Format>,
    ) -> Result<Format, SemanticsError> {
        if args.len() != 1 {
            return Err(SemanticsError::WrongArgumentCount {
                function: self.name().to_string(),
                expected: "1",
                found: args.len(),
            });
        }
        let index = Self::literal_index(args).ok_or_else(|| SemanticsError::BadArgument {
            function: self.name().to_string(),
            detail: "index must be a literal non-negative integer".to_string(),
        })?;
        let substituted = ctx
            .macro_frame()
            .and_then(|frame| frame.get(index))
            .cloned()
            .ok_or_else(|| SemanticsError::BadArgument {
                function: self.name().to_string(),
                detail: format!("no argument at index {index}"),
            })?;
        check(&substituted, ctx, asserted)
    }

    fn get_dependencies(
        &self,
        ctx: &mut DepContext<'_>,
        args: &[Expr],
    ) -> Result<(), SemanticsError> {
        let index = Self::literal_index(args).ok_or_else(|| SemanticsError::BadArgument {
            function: self.name().to_string(),
            detail: "index must be a literal non-negative integer".to_string(),
        })?;
        ctx.note_arg(index);
        if let Some(substituted) = ctx.macro_frame().and_then(|frame| frame.get(index)).cloned() {
            capture(&substituted, ctx)?;
        }
        Ok(())
    }

    fn evaluate(
        &self,
        ctx: &mut EvalContext<'_>,
        args: &[Expr],
        _asserted: Option<&Format>,
    ) -> Result<Value, EvalError> {
        let index = Self::literal_index(args).ok_or_else(|| EvalError::Internal {
            detail: "arg index must be a literal non-negative integer".to_string(),
        })?;
        let substituted = ctx
            .macro_frame()
            .and_then(|frame| frame.get(index))
            .cloned()
            .ok_or(EvalError::MissingArgument { index })?;
        evaluate(&substituted, ctx)
    }
}
