// ABOUTME: Tree-sitter grammar setup for the Python front end.
// ABOUTME: Builds configured parsers and rejects sources that contain syntax errors.
use crate::node_utils::{first_error, first_node_deeper_than};
use holoform_core::{HoloformError, Result};
use tree_sitter::{Parser, Tree};

/// Deepest syntax-tree nesting accepted before a source is rejected.
///
/// Lowering and formatting recurse once per level, so this bounds their stack use.
pub const MAX_NESTING_DEPTH: usize = 256;

pub struct LanguageConfig {
    pub language: tree_sitter::Language,
    pub file_extensions: Vec<&'static str>,
}

impl LanguageConfig {
    pub fn python() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
            file_extensions: vec!["py", "pyi"],
        }
    }

    pub fn create_parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| HoloformError::Parse(format!("Failed to load grammar: {}", e)))?;
        Ok(parser)
    }

    pub fn supports_extension(&self, extension: &str) -> bool {
        self.file_extensions.contains(&extension)
    }
}

/// Parse `source` into a syntax tree.
///
/// Any ERROR or MISSING node makes the whole source a parse failure, as does
/// nesting deeper than [`MAX_NESTING_DEPTH`].
pub fn parse_python(source: &str) -> Result<Tree> {
    let mut parser = LanguageConfig::python().create_parser()?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| HoloformError::Parse("Parser returned no tree".to_string()))?;

    if let Some(node) = first_error(tree.root_node()) {
        let pos = node.start_position();
        return Err(HoloformError::Parse(format!(
            "Syntax error at line {}, column {}",
            pos.row + 1,
            pos.column + 1
        )));
    }

    if let Some(node) = first_node_deeper_than(tree.root_node(), MAX_NESTING_DEPTH) {
        return Err(HoloformError::Parse(format!(
            "Nesting deeper than {} levels at line {}",
            MAX_NESTING_DEPTH,
            node.start_position().row + 1
        )));
    }

    Ok(tree)
}
