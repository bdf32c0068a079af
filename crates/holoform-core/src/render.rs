use crate::{ClassHoloform, FunctionHoloform, Holoform, Operation};

/// Render a Holoform as a short human-readable block, one line per field and
/// one JSON line per top-level operation.
pub fn render_text(holoform: &Holoform) -> String {
    match holoform {
        Holoform::Function(f) => render_function(f),
        Holoform::Class(c) => render_class(c),
    }
}

fn render_function(f: &FunctionHoloform) -> String {
    let mut lines = vec![
        format!("Function: {}", f.id),
        format!("Description: {}", f.description),
        format!("Inputs: {}", f.input_parameters.join(", ")),
        format!(
            "Output: {}",
            f.output_variable_name.as_deref().unwrap_or("None")
        ),
        "Operations:".to_string(),
    ];
    lines.extend(f.operations.iter().map(render_operation));
    lines.join("\n")
}

fn render_operation(op: &Operation) -> String {
    match serde_json::to_string(op) {
        Ok(json) => format!("  - {}", json),
        Err(_) => format!("  - {} ({})", op.step_id, op.type_name()),
    }
}

fn render_class(c: &ClassHoloform) -> String {
    [
        format!("Class: {}", c.id),
        format!("Description: {}", c.description),
        format!("Parent Classes: {}", c.parent_classes.join(", ")),
        format!("Methods: {}", c.methods.join(", ")),
        format!("Class Attributes: {}", c.class_attributes.join(", ")),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn class_render_lists_members() {
        let holoform = Holoform::Class(ClassHoloform {
            id: "User_auto_v1".to_string(),
            parent_module_id: schema::DEFAULT_PARENT_MODULE_ID.to_string(),
            description: "A user.".to_string(),
            tags: schema::default_tags(),
            parent_classes: vec!["Name(id='Base')".to_string()],
            methods: vec!["save".to_string(), "load".to_string()],
            class_attributes: vec!["table".to_string()],
            contains_placeholders: false,
        });

        let text = render_text(&holoform);
        assert!(text.starts_with("Class: User_auto_v1"));
        assert!(text.contains("Methods: save, load"));
        assert!(text.contains("Parent Classes: Name(id='Base')"));
    }

    #[test]
    fn function_without_output_renders_none() {
        let holoform = Holoform::Function(FunctionHoloform {
            id: "noop_auto_v1".to_string(),
            parent_module_id: schema::DEFAULT_PARENT_MODULE_ID.to_string(),
            description: schema::DEFAULT_DESCRIPTION.to_string(),
            tags: schema::default_tags(),
            input_parameters: vec![],
            operations: vec![],
            output_variable_name: None,
            contains_placeholders: false,
        });
        assert!(render_text(&holoform).contains("Output: None"));
    }
}
