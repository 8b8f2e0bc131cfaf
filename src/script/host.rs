use std::cell::RefCell;
use std::rc::Rc;

use rhai::{AST, Array, Dynamic, Engine, EvalAltResult, FnPtr, ImmutableString, Position};
use smallvec::SmallVec;

use super::api;
use crate::errors::{Result, ScriptError};
use crate::settings::ScriptLimits;

/// Name of the declaration function scripts call exactly once.
pub const DEFINE: &str = "define";

/// Dependency ids of a module, in factory-parameter order.
pub type Dependencies = SmallVec<[String; 4]>;

/// What a script's single `define(...)` call declared.
#[derive(Clone)]
pub struct Declaration {
    /// Name given in the `define(name, deps, factory)` form.
    pub name: Option<String>,
    pub dependencies: Dependencies,
    pub factory: FnPtr,
}

type DeclarationSink = Rc<RefCell<Vec<Declaration>>>;

/// The sandboxed script engine shared by a cartridge's modules and script
/// components.
///
/// Functions (including closures) of every evaluated script are kept in one
/// library, so a function pointer created by any module can be called later
/// from any other.
pub struct ScriptHost {
    engine: Engine,
    library: RefCell<AST>,
    declarations: DeclarationSink,
}

impl ScriptHost {
    #[must_use]
    pub fn new(limits: &ScriptLimits) -> Self {
        Self::with_engine(limits, |_| {})
    }

    /// Builds a host and lets the caller adjust the engine afterwards, e.g. to
    /// register extra functions or redirect `print`.
    pub fn with_engine(limits: &ScriptLimits, configure: impl FnOnce(&mut Engine)) -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);
        engine.disable_symbol("eval");

        engine.on_print(|text| log::info!(target: "script", "{text}"));
        engine.on_debug(|text, source, pos| {
            log::debug!(target: "script", "[{}:{pos}] {text}", source.unwrap_or("script"));
        });

        let declarations = DeclarationSink::default();
        register_define(&mut engine, &declarations);
        api::register(&mut engine);
        configure(&mut engine);

        Self {
            engine,
            library: RefCell::new(AST::empty()),
            declarations,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Compiles and runs a module source, returning its one declaration.
    pub fn declare(&self, module: &str, source: &str) -> Result<Declaration> {
        let ast = self
            .engine
            .compile(source)
            .map_err(|err| parse_error(module, err.to_string()))?;

        self.declarations.borrow_mut().clear();
        let outcome = self.engine.run_ast(&ast);
        let mut declared = std::mem::take(&mut *self.declarations.borrow_mut());

        if let Err(err) = outcome {
            return Err(match *err {
                EvalAltResult::ErrorFunctionNotFound(ref signature, _)
                    if signature.starts_with(DEFINE) =>
                {
                    parse_error(module, format!("malformed declaration call: {signature}"))
                }
                _ => runtime_error(module, &err),
            });
        }

        let declaration = match declared.len() {
            0 => {
                return Err(parse_error(
                    module,
                    format!("script never calls {DEFINE}(dependencies, factory)"),
                ));
            }
            1 => declared.remove(0),
            n => {
                return Err(parse_error(
                    module,
                    format!("{DEFINE} called {n} times; a module declares exactly once"),
                ));
            }
        };

        self.library.borrow_mut().combine(ast.clone_functions_only());
        Ok(declaration)
    }

    /// Calls a script function pointer on behalf of `module`.
    pub fn call(&self, module: &str, function: &FnPtr, args: Vec<Dynamic>) -> Result<Dynamic> {
        let library = self.library.borrow();
        function
            .call::<Dynamic>(&self.engine, &library, args)
            .map_err(|err| runtime_error(module, &err))
    }
}

fn register_define(engine: &mut Engine, sink: &DeclarationSink) {
    let anonymous = Rc::clone(sink);
    engine.register_fn(
        DEFINE,
        move |dependencies: Array, factory: FnPtr| -> std::result::Result<(), Box<EvalAltResult>> {
            anonymous.borrow_mut().push(Declaration {
                name: None,
                dependencies: dependency_ids(dependencies)?,
                factory,
            });
            Ok(())
        },
    );

    let named = Rc::clone(sink);
    engine.register_fn(
        DEFINE,
        move |name: ImmutableString,
              dependencies: Array,
              factory: FnPtr|
              -> std::result::Result<(), Box<EvalAltResult>> {
            named.borrow_mut().push(Declaration {
                name: Some(name.to_string()),
                dependencies: dependency_ids(dependencies)?,
                factory,
            });
            Ok(())
        },
    );
}

fn dependency_ids(dependencies: Array) -> std::result::Result<Dependencies, Box<EvalAltResult>> {
    dependencies
        .into_iter()
        .map(|dependency| {
            dependency
                .into_immutable_string()
                .map(|id| id.to_string())
                .map_err(|type_name| {
                    script_failure(format!(
                        "{DEFINE}: dependency ids must be strings, found {type_name}"
                    ))
                })
        })
        .collect()
}

/// Error value for native functions called from scripts.
pub(crate) fn script_failure(message: String) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(message.into(), Position::NONE))
}

fn parse_error(module: &str, message: String) -> crate::errors::Error {
    ScriptError::ParseError {
        module: module.to_string(),
        message,
    }
    .into()
}

fn runtime_error(module: &str, err: &EvalAltResult) -> crate::errors::Error {
    ScriptError::Runtime {
        module: module.to_string(),
        message: err.to_string(),
    }
    .into()
}
