//! Sandboxed evaluation of model scripts.
//!
//! A script is Rhai source that defines `fn main()` or `fn main(params)` and
//! may define `fn parameter_definitions()`. The engine only knows the
//! modeling functions registered in [`api`]; `eval` and module imports are
//! disabled, and operation/depth limits bound runaway scripts.

mod api;

use std::collections::BTreeMap;

use rhai::{CallFnOptions, Dynamic, Engine, Map, Scope, AST};
use shared::parameters::resolve_parameters;
use shared::{ParameterDefinition, ParameterError, ParameterOverride};

use crate::model::{GeneratedSource, Shape, Solid};

pub const ENTRY_POINT: &str = "main";
const PARAMETER_FUNCTIONS: [&str; 2] = ["parameter_definitions", "getParameterDefinitions"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("execution failed: {message}")]
    ExecutionFailed { message: String },
    #[error("missing entry point: the model defines no `main` function")]
    MissingEntryPoint,
    #[error("entry point returned {found}, expected a solid or an array of solids")]
    InvalidResult { found: String },
    #[error("parameter error: {0}")]
    Parameters(#[from] ParameterError),
}

impl EvaluationError {
    fn failed(message: impl ToString) -> Self {
        EvaluationError::ExecutionFailed {
            message: message.to_string(),
        }
    }
}

/// Resource limits applied to every script run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationLimits {
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_expr_depth: usize,
    pub max_array_size: usize,
    pub max_string_size: usize,
}

impl Default for EvaluationLimits {
    fn default() -> Self {
        Self {
            max_operations: 2_000_000,
            max_call_levels: 64,
            max_expr_depth: 128,
            max_array_size: 100_000,
            max_string_size: 64 * 1024,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub solids: Vec<Solid>,
    pub parameters: Vec<ParameterDefinition>,
    pub values: BTreeMap<String, f64>,
}

pub struct Evaluator {
    engine: Engine,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvaluationLimits::default())
    }
}

impl Evaluator {
    pub fn new(limits: EvaluationLimits) -> Self {
        let mut engine = Engine::new();
        engine
            .set_max_operations(limits.max_operations)
            .set_max_call_levels(limits.max_call_levels)
            .set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth)
            .set_max_array_size(limits.max_array_size)
            .set_max_string_size(limits.max_string_size)
            .set_max_map_size(limits.max_array_size)
            .set_module_resolver(rhai::module_resolvers::DummyModuleResolver::new());
        engine.disable_symbol("eval");

        engine.on_print(|text| tracing::debug!(target: "model_script", "{}", text));
        engine.on_debug(|text, _source, pos| {
            tracing::debug!(target: "model_script", "{:?}: {}", pos, text)
        });

        api::register(&mut engine);
        Self { engine }
    }

    /// Run the script with its default parameters and return the solids.
    pub fn evaluate(&self, source: &GeneratedSource) -> Result<Vec<Solid>, EvaluationError> {
        self.evaluate_with(source, &BTreeMap::new()).map(|e| e.solids)
    }

    /// Run the script with user overrides applied on top of its parameter defaults.
    pub fn evaluate_with(
        &self,
        source: &GeneratedSource,
        overrides: &BTreeMap<String, ParameterOverride>,
    ) -> Result<Evaluation, EvaluationError> {
        let ast = self.compile(source)?;

        let main_arity = ast
            .iter_functions()
            .filter(|f| f.name == ENTRY_POINT)
            .map(|f| f.params.len())
            .min()
            .ok_or(EvaluationError::MissingEntryPoint)?;

        let mut scope = Scope::new();
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(EvaluationError::failed)?;

        let parameters = self.definitions(&mut scope, &ast)?;
        let values = resolve_parameters(&parameters, overrides)?;

        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        let result: Dynamic = match main_arity {
            0 => self
                .engine
                .call_fn_with_options(options, &mut scope, &ast, ENTRY_POINT, ()),
            1 => {
                let params: Map = values
                    .iter()
                    .map(|(k, v)| (k.as_str().into(), Dynamic::from_float(*v)))
                    .collect();
                self.engine
                    .call_fn_with_options(options, &mut scope, &ast, ENTRY_POINT, (params,))
            }
            n => {
                return Err(EvaluationError::failed(format!(
                    "`{}` must take zero or one argument, found {}",
                    ENTRY_POINT, n
                )))
            }
        }
        .map_err(EvaluationError::failed)?;

        let solids = into_solids(result)?;
        tracing::debug!(count = solids.len(), "Evaluated model");
        Ok(Evaluation {
            solids,
            parameters,
            values,
        })
    }

    /// Parameters declared by the script, without running `main`.
    pub fn parameter_definitions(&self, source: &GeneratedSource) -> Result<Vec<ParameterDefinition>, EvaluationError> {
        let ast = self.compile(source)?;
        let mut scope = Scope::new();
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(EvaluationError::failed)?;
        self.definitions(&mut scope, &ast)
    }

    fn compile(&self, source: &GeneratedSource) -> Result<AST, EvaluationError> {
        self.engine
            .compile(source.as_str())
            .map_err(EvaluationError::failed)
    }

    fn definitions(&self, scope: &mut Scope, ast: &AST) -> Result<Vec<ParameterDefinition>, EvaluationError> {
        let Some(name) = PARAMETER_FUNCTIONS
            .iter()
            .find(|name| ast.iter_functions().any(|f| f.name == **name && f.params.is_empty()))
        else {
            return Ok(Vec::new());
        };

        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        let raw: Dynamic = self
            .engine
            .call_fn_with_options(options, scope, ast, *name, ())
            .map_err(EvaluationError::failed)?;

        let list = raw
            .into_array()
            .map_err(|t| EvaluationError::failed(format!("{} must return an array, got {}", name, t)))?;
        list.into_iter().map(parse_definition).collect()
    }
}

fn parse_definition(entry: Dynamic) -> Result<ParameterDefinition, EvaluationError> {
    let map = entry
        .try_cast::<Map>()
        .ok_or_else(|| EvaluationError::failed("parameter definition must be a map"))?;

    let name = map
        .get("name")
        .and_then(|v| v.clone().into_string().ok())
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| EvaluationError::failed("parameter definition needs a `name`"))?;

    let initial = match map.get("initial") {
        Some(v) => v
            .as_float()
            .or_else(|_| v.as_int().map(|i| i as f64))
            .map_err(|_| EvaluationError::failed(format!("parameter `{}` needs a numeric `initial`", name)))?,
        None => return Err(EvaluationError::failed(format!("parameter `{}` needs an `initial` value", name))),
    };

    let caption = map.get("caption").and_then(|v| v.clone().into_string().ok());
    Ok(ParameterDefinition { name, initial, caption })
}

fn into_solids(value: Dynamic) -> Result<Vec<Solid>, EvaluationError> {
    let shapes = if value.is::<Shape>() {
        vec![value.cast::<Shape>()]
    } else if value.is_array() {
        let items = value.into_array().map_err(EvaluationError::failed)?;
        if items.is_empty() {
            return Err(EvaluationError::InvalidResult {
                found: "an empty array".to_string(),
            });
        }
        items
            .into_iter()
            .map(|item| {
                let found = item.type_name().to_string();
                item.try_cast::<Shape>().ok_or(EvaluationError::InvalidResult {
                    found: format!("an array containing {}", found),
                })
            })
            .collect::<Result<Vec<_>, _>>()?
    } else {
        return Err(EvaluationError::InvalidResult {
            found: value.type_name().to_string(),
        });
    };

    let single = shapes.len() == 1;
    Ok(shapes
        .into_iter()
        .enumerate()
        .map(|(i, shape)| {
            let name = if single {
                "model".to_string()
            } else {
                format!("model_{}", i + 1)
            };
            Solid::new(name, shape)
        })
        .collect())
}
