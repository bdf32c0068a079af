// ABOUTME: Entry point from Python source text to Holoforms
// ABOUTME: Finds top-level definitions and hands each one to the generator visitor

use crate::ast::{Statement, Stmt};
use crate::language::{parse_python, LanguageConfig};
use crate::lower::Lowerer;
use crate::visitor::GeneratorVisitor;
use holoform_core::schema::DEFAULT_PARENT_MODULE_ID;
use holoform_core::{Holoform, HoloformError, HoloformParser, Result};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct HoloformDriver {
    module_id: String,
}

impl Default for HoloformDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HoloformDriver {
    pub fn new() -> Self {
        Self {
            module_id: DEFAULT_PARENT_MODULE_ID.to_string(),
        }
    }

    /// Use `module_id` as `parent_module_id` for everything generated.
    pub fn with_module_id(mut self, module_id: impl Into<String>) -> Self {
        self.module_id = module_id.into();
        self
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    /// Parse and lower a whole module.
    pub fn parse_module(source: &str) -> Result<Vec<Statement>> {
        let tree = parse_python(source)?;
        Ok(Lowerer::new(source).lower_module(tree.root_node()))
    }

    /// Holoform for the first top-level definition named `target`, or the
    /// first definition at all when `target` is `None`.
    ///
    /// Syntax errors and missing targets both yield `None`.
    pub fn generate(&self, source: &str, target: Option<&str>) -> Option<Holoform> {
        match self.try_generate(source, target) {
            Ok(holoform) => Some(holoform),
            Err(HoloformError::Parse(e)) => {
                warn!("Failed to parse source: {}", e);
                None
            }
            Err(e) => {
                debug!("No Holoform generated: {}", e);
                None
            }
        }
    }

    /// Like [`generate`](Self::generate), but reports why nothing was produced.
    pub fn try_generate(&self, source: &str, target: Option<&str>) -> Result<Holoform> {
        let statements = Self::parse_module(source)?;
        let visitor = GeneratorVisitor::new(source).with_module_id(self.module_id.clone());

        statements
            .iter()
            .find_map(|stmt| match &stmt.node {
                Stmt::FunctionDef(def) if target.map_or(true, |t| t == def.name) => {
                    Some(Holoform::Function(visitor.visit_function(def)))
                }
                Stmt::ClassDef(def) if target.map_or(true, |t| t == def.name) => {
                    Some(Holoform::Class(visitor.visit_class(def)))
                }
                _ => None,
            })
            .ok_or_else(|| {
                HoloformError::NotFound(match target {
                    Some(name) => format!("No top-level definition named '{}'", name),
                    None => "Source has no top-level function or class".to_string(),
                })
            })
    }

    /// Every top-level function and class, in source order.
    pub fn generate_all(&self, source: &str) -> Result<Vec<Holoform>> {
        let statements = Self::parse_module(source)?;
        let visitor = GeneratorVisitor::new(source).with_module_id(self.module_id.clone());

        let holoforms: Vec<Holoform> = statements
            .iter()
            .filter_map(|stmt| match &stmt.node {
                Stmt::FunctionDef(def) => Some(Holoform::Function(visitor.visit_function(def))),
                Stmt::ClassDef(def) => Some(Holoform::Class(visitor.visit_class(def))),
                _ => None,
            })
            .collect();

        debug!(
            "Generated {} Holoforms for module {}",
            holoforms.len(),
            self.module_id
        );
        Ok(holoforms)
    }
}

impl HoloformParser for HoloformDriver {
    fn parse_source(&self, source: &str, module_id: &str) -> Result<Vec<Holoform>> {
        self.clone().with_module_id(module_id).generate_all(source)
    }

    fn supported_extensions(&self) -> Vec<&'static str> {
        LanguageConfig::python().file_extensions
    }
}
