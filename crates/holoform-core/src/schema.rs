// ABOUTME: Canonical field defaults and identifier conventions shared by every Holoform
// ABOUTME: The generator, the project layer and the query engine all derive ids from here

/// Parent module id used when a record is generated outside of a project pass.
pub const DEFAULT_PARENT_MODULE_ID: &str = "Unknown_Module_AST_v1";

/// Description used when a definition has neither a docstring, a comment block
/// nor any operation to summarize.
pub const DEFAULT_DESCRIPTION: &str = "Auto-generated Holoform (default description).";

pub const DEFAULT_TAGS: &[&str] = &["ast_generated"];

pub const HOLOFORM_ID_SUFFIX: &str = "_auto_v1";

/// Prefix of the placeholder string emitted for expression kinds the formatter
/// does not recognize.
pub const UNSUPPORTED_NODE_PREFIX: &str = "UnsupportedASTNode";

/// Output variable recorded when a function returns something other than a bare name.
pub const DIRECT_RETURN_SENTINEL: &str = "_direct_return_expression_";

pub const OUTPUT_PURPOSE_SUFFIX: &str = " (produces function output)";

/// Build the Holoform id for a function or class name.
pub fn holoform_id(name: &str) -> String {
    format!("{}{}", name, HOLOFORM_ID_SUFFIX)
}

/// Recover the definition name from a Holoform id, if it follows the id scheme.
pub fn definition_name(id: &str) -> Option<&str> {
    id.strip_suffix(HOLOFORM_ID_SUFFIX)
}

pub fn default_tags() -> Vec<String> {
    DEFAULT_TAGS.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_the_auto_v1_scheme() {
        assert_eq!(holoform_id("add"), "add_auto_v1");
        assert_eq!(definition_name("add_auto_v1"), Some("add"));
        assert_eq!(definition_name("add"), None);
    }
}
