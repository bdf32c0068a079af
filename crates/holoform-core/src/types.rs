use crate::schema::OUTPUT_PURPOSE_SUFFIX;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The structured semantic record produced for one function or class definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "holoform_type", rename_all = "snake_case")]
pub enum Holoform {
    Function(FunctionHoloform),
    Class(ClassHoloform),
}

impl Holoform {
    pub fn id(&self) -> &str {
        match self {
            Holoform::Function(f) => &f.id,
            Holoform::Class(c) => &c.id,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Holoform::Function(f) => &f.description,
            Holoform::Class(c) => &c.description,
        }
    }

    pub fn parent_module_id(&self) -> &str {
        match self {
            Holoform::Function(f) => &f.parent_module_id,
            Holoform::Class(c) => &c.parent_module_id,
        }
    }

    /// True when some part of the record degraded to a placeholder.
    pub fn contains_placeholders(&self) -> bool {
        match self {
            Holoform::Function(f) => f.contains_placeholders,
            Holoform::Class(c) => c.contains_placeholders,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionHoloform> {
        match self {
            Holoform::Function(f) => Some(f),
            Holoform::Class(_) => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassHoloform> {
        match self {
            Holoform::Class(c) => Some(c),
            Holoform::Function(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionHoloform {
    pub id: String,
    pub parent_module_id: String,
    pub description: String,
    pub tags: Vec<String>,
    pub input_parameters: Vec<String>,
    pub operations: Vec<Operation>,
    pub output_variable_name: Option<String>,
    #[serde(default)]
    pub contains_placeholders: bool,
}

impl FunctionHoloform {
    /// Calls made directly from the top-level operation list, in order.
    /// Nested control-flow and loop bodies are not descended into.
    pub fn direct_calls(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().filter_map(Operation::called_function)
    }
}

/// Class record. Methods are listed by name only; each method gets its own
/// function Holoform when generated on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassHoloform {
    pub id: String,
    pub parent_module_id: String,
    pub description: String,
    pub tags: Vec<String>,
    pub parent_classes: Vec<String>,
    pub methods: Vec<String>,
    pub class_attributes: Vec<String>,
    #[serde(default)]
    pub contains_placeholders: bool,
}

/// One step of a function's Operation tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub step_id: String,
    #[serde(flatten)]
    pub kind: OperationKind,
    pub semantic_purpose: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub assign_to_output: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Operation {
    pub fn new(step_id: String, kind: OperationKind, semantic_purpose: String) -> Self {
        Self {
            step_id,
            kind,
            semantic_purpose,
            assign_to_output: false,
        }
    }

    /// Variable this operation binds, if it binds a plain name.
    pub fn assigned_variable(&self) -> Option<&str> {
        match &self.kind {
            OperationKind::Assignment {
                assign_to_variable, ..
            } => Some(assign_to_variable),
            OperationKind::FunctionCall(call) | OperationKind::ConstructorCall(call) => {
                call.assign_to_variable.as_deref()
            }
            _ => None,
        }
    }

    /// Target name of an assigned function or constructor call.
    pub fn called_function(&self) -> Option<&str> {
        match &self.kind {
            OperationKind::FunctionCall(call) | OperationKind::ConstructorCall(call) => {
                call.target_function_name.as_deref()
            }
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Flag this operation as the producer of the function output.
    pub fn mark_as_output(&mut self) {
        if self.assign_to_output {
            return;
        }
        self.assign_to_output = true;
        self.semantic_purpose.push_str(OUTPUT_PURPOSE_SUFFIX);
    }

    /// Nested operation lists owned by this operation, in source order.
    pub fn nested_operations(&self) -> Vec<&[Operation]> {
        match &self.kind {
            OperationKind::ControlFlow(cf) => {
                let mut lists = vec![cf.body.as_slice(), cf.orelse.as_slice()];
                lists.extend(cf.handlers.iter().map(|h| h.body.as_slice()));
                lists.push(cf.finalbody.as_slice());
                lists
            }
            OperationKind::ForLoop {
                loop_body_operations,
                orelse,
                ..
            } => vec![loop_body_operations.as_slice(), orelse.as_slice()],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationKind {
    Assignment {
        assign_to_variable: String,
        expression_type: ExpressionType,
        expression_ast_repr: String,
    },
    FunctionCall(CallOperation),
    ConstructorCall(CallOperation),
    FunctionCallStandalone(CallOperation),
    AttributeAssignment {
        target_object: String,
        attribute: String,
        value: String,
    },
    DictKeyAssignment {
        target_dict: String,
        key: String,
        value: String,
    },
    ListAppend {
        target_list: String,
        value: String,
    },
    ControlFlow(ControlFlow),
    ForLoop {
        target_variable: String,
        iterable_source_repr: String,
        loop_body_operations: Vec<Operation>,
        /// `for ... else` body; runs in the enclosing scope, not the loop's.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        orelse: Vec<Operation>,
    },
    Return {
        expression_ast_repr: String,
    },
}

impl OperationKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            OperationKind::Assignment { .. } => "assignment",
            OperationKind::FunctionCall(_) => "function_call",
            OperationKind::ConstructorCall(_) => "constructor_call",
            OperationKind::FunctionCallStandalone(_) => "function_call_standalone",
            OperationKind::AttributeAssignment { .. } => "attribute_assignment",
            OperationKind::DictKeyAssignment { .. } => "dict_key_assignment",
            OperationKind::ListAppend { .. } => "list_append",
            OperationKind::ControlFlow(_) => "control_flow",
            OperationKind::ForLoop { .. } => "for_loop",
            OperationKind::Return { .. } => "return",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionType {
    Arithmetic,
    Comparison,
    ListLiteral,
    Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOperation {
    pub assign_to_variable: Option<String>,
    pub target_function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_object: Option<String>,
    pub parameter_mapping: ParameterMapping,
}

/// `arg0..argN` and keyword names mapped to where the value comes from.
pub type ParameterMapping = BTreeMap<String, ParameterSource>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source_type", rename_all = "snake_case")]
pub enum ParameterSource {
    Variable { name: String },
    Constant { repr: String },
    Expression { repr: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlFlowKind {
    If,
    While,
    Try,
}

impl fmt::Display for ControlFlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControlFlowKind::If => "if",
            ControlFlowKind::While => "while",
            ControlFlowKind::Try => "try",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlFlow {
    pub subtype: ControlFlowKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    pub body: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orelse: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handlers: Vec<ExceptHandler>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalbody: Vec<Operation>,
}

impl ControlFlow {
    pub fn new(subtype: ControlFlowKind, test: Option<String>, body: Vec<Operation>) -> Self {
        Self {
            subtype,
            test,
            body,
            orelse: Vec::new(),
            handlers: Vec::new(),
            finalbody: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptHandler {
    #[serde(rename = "type")]
    pub exception_type: Option<String>,
    pub name: Option<String>,
    pub body: Vec<Operation>,
}
