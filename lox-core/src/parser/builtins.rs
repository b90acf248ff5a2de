use crate::parser::environment::SharedEnvironment;
use crate::parser::interpreter::Interpreter;
use crate::types::{Callable, Value};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Instant;

pub type BuiltinHandler = fn(&mut Interpreter, &[Value]) -> Result<Value>;

static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();
static CLOCK_EPOCH: OnceLock<Instant> = OnceLock::new();

pub fn get_registry() -> &'static FunctionRegistry {
    REGISTRY.get_or_init(FunctionRegistry::new)
}

pub struct BuiltinFunction {
    pub name: &'static str,
    pub category: &'static str, // e.g., "Time"
    pub description: &'static str,
    pub signature: &'static str,
    pub arity: usize,
    pub handler: BuiltinHandler,
}

impl std::fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

pub struct DocItem {
    pub name: String,
    pub category: String,
    pub description: String,
    pub signature: String,
}

pub struct FunctionRegistry {
    functions: HashMap<&'static str, BuiltinFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        let mut registry = FunctionRegistry {
            functions: HashMap::new(),
        };
        registry.register_all();
        registry
    }

    fn register(
        &mut self,
        name: &'static str,
        category: &'static str,
        description: &'static str,
        signature: &'static str,
        arity: usize,
        handler: BuiltinHandler,
    ) {
        self.functions.insert(
            name,
            BuiltinFunction {
                name,
                category,
                description,
                signature,
                arity,
                handler,
            },
        );
    }

    pub fn get_documentation(&self) -> Vec<DocItem> {
        let mut docs: Vec<DocItem> = self
            .functions
            .values()
            .map(|f| DocItem {
                name: f.name.to_string(),
                category: f.category.to_string(),
                description: f.description.to_string(),
                signature: f.signature.to_string(),
            })
            .collect();

        docs.sort_by(|a, b| a.name.cmp(&b.name));
        docs
    }

    pub fn get(&self, name: &str) -> Option<&BuiltinFunction> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn register_all(&mut self) {
        self.register(
            "clock",
            "Time",
            "Seconds elapsed on a monotonic clock since the first call.",
            "clock() -> Number",
            0,
            |_interpreter, args| {
                if !args.is_empty() {
                    return Err(anyhow!("Expected 0 arguments but got {}.", args.len()));
                }
                let epoch = CLOCK_EPOCH.get_or_init(Instant::now);
                Ok(Value::Number(epoch.elapsed().as_secs_f64()))
            },
        );
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Define every builtin in the given (global) frame
pub fn register_globals(environment: &SharedEnvironment) {
    let registry: &'static FunctionRegistry = get_registry();
    let mut frame = environment.borrow_mut();
    for builtin in registry.functions.values() {
        frame.define(builtin.name, Value::Callable(Callable::Native(builtin)));
    }
}
