// ABOUTME: Walks one lowered definition and emits its Holoform
// ABOUTME: Step ids come from VisitContext; nested bodies stay local to their parent operation

use crate::ast::{AssignTarget, ClassDef, ExceptClause, Expr, FunctionDef, Keyword, Statement, Stmt};
use crate::description::{comment_block_above, finalize_description, inline_comment};
use crate::formatter::{describe_target, expression_type, format_expr, parameter_mapping};
use holoform_core::schema::{self, DEFAULT_PARENT_MODULE_ID, DIRECT_RETURN_SENTINEL};
use holoform_core::{
    CallOperation, ClassHoloform, ControlFlow, ControlFlowKind, ExceptHandler, ExpressionType,
    FunctionHoloform, Operation, OperationKind,
};
use tracing::{debug, trace};

/// Per-definition traversal state.
#[derive(Debug, Default)]
pub struct VisitContext {
    top_level_counter: usize,
    /// One counter per enclosing `for` loop, innermost last.
    loop_counters: Vec<usize>,
    output_variable: Option<String>,
    contains_placeholders: bool,
}

impl VisitContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// `s_<prefix>_<n>` at top level, `s_loop_<prefix>_<n>` inside a loop body.
    pub fn next_step_id(&mut self, prefix: &str) -> String {
        match self.loop_counters.last_mut() {
            Some(counter) => {
                let id = format!("s_loop_{}_{}", prefix, counter);
                *counter += 1;
                id
            }
            None => {
                let id = format!("s_{}_{}", prefix, self.top_level_counter);
                self.top_level_counter += 1;
                id
            }
        }
    }

    pub fn enter_loop(&mut self) {
        self.loop_counters.push(0);
    }

    pub fn exit_loop(&mut self) {
        self.loop_counters.pop();
    }

    pub fn loop_depth(&self) -> usize {
        self.loop_counters.len()
    }

    pub fn mark_placeholder(&mut self) {
        self.contains_placeholders = true;
    }

    pub fn output_variable(&self) -> Option<&str> {
        self.output_variable.as_deref()
    }

    pub fn contains_placeholders(&self) -> bool {
        self.contains_placeholders
    }
}

pub struct GeneratorVisitor<'a> {
    source_lines: Vec<&'a str>,
    module_id: String,
}

impl<'a> GeneratorVisitor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source_lines: source.lines().collect(),
            module_id: DEFAULT_PARENT_MODULE_ID.to_string(),
        }
    }

    pub fn with_module_id(mut self, module_id: impl Into<String>) -> Self {
        self.module_id = module_id.into();
        self
    }

    pub fn visit_function(&self, def: &FunctionDef) -> FunctionHoloform {
        let id = schema::holoform_id(&def.name);
        debug!("Generating Holoform {} ({} statements)", id, def.body.len());

        let mut ctx = VisitContext::new();
        let operations = self.visit_body(&def.body, &mut ctx);
        let raw = self.raw_description(def.docstring.as_deref(), def.line);
        let description = finalize_description(raw.as_deref(), &id, &operations);

        FunctionHoloform {
            id,
            parent_module_id: self.module_id.clone(),
            description,
            tags: schema::default_tags(),
            input_parameters: def.params.clone(),
            operations,
            output_variable_name: ctx.output_variable,
            contains_placeholders: ctx.contains_placeholders,
        }
    }

    pub fn visit_class(&self, def: &ClassDef) -> ClassHoloform {
        let id = schema::holoform_id(&def.name);
        debug!("Generating class Holoform {}", id);

        let mut contains_placeholders = false;
        let parent_classes = def
            .bases
            .iter()
            .map(|base| {
                contains_placeholders |= base.has_unsupported();
                match base {
                    Expr::Name(name) => name.clone(),
                    other => format_expr(other),
                }
            })
            .collect();

        let mut methods = Vec::new();
        let mut class_attributes = Vec::new();
        for stmt in &def.body {
            match &stmt.node {
                Stmt::FunctionDef(method) => methods.push(method.name.clone()),
                Stmt::Assign {
                    target: AssignTarget::Name(name),
                    ..
                } => class_attributes.push(name.clone()),
                _ => {}
            }
        }

        let raw = self.raw_description(def.docstring.as_deref(), def.line);
        ClassHoloform {
            description: finalize_description(raw.as_deref(), &id, &[]),
            id,
            parent_module_id: self.module_id.clone(),
            tags: schema::default_tags(),
            parent_classes,
            methods,
            class_attributes,
            contains_placeholders,
        }
    }

    fn raw_description(&self, docstring: Option<&str>, line: usize) -> Option<String> {
        docstring
            .map(str::to_string)
            .or_else(|| comment_block_above(&self.source_lines, line))
    }

    /// Inline comment on the statement's first line, else `fallback`.
    fn purpose(&self, line: usize, fallback: String) -> String {
        self.source_lines
            .get(line)
            .and_then(|text| inline_comment(text))
            .map(str::to_string)
            .unwrap_or(fallback)
    }

    fn format(&self, expr: &Expr, ctx: &mut VisitContext) -> String {
        if expr.has_unsupported() {
            ctx.mark_placeholder();
        }
        format_expr(expr)
    }

    pub fn visit_body(&self, body: &[Statement], ctx: &mut VisitContext) -> Vec<Operation> {
        let mut operations = Vec::new();
        for stmt in body {
            self.visit_statement(stmt, &mut operations, ctx);
        }
        operations
    }

    fn visit_statement(
        &self,
        stmt: &Statement,
        operations: &mut Vec<Operation>,
        ctx: &mut VisitContext,
    ) {
        let line = stmt.line;
        match &stmt.node {
            Stmt::Assign { target, value } => {
                self.visit_assign(line, target, value, operations, ctx)
            }
            Stmt::AugAssign { target, op, value } => {
                let combined = Expr::BinOp {
                    left: Box::new(target.to_expr()),
                    op: *op,
                    right: Box::new(value.clone()),
                };
                self.visit_assign(line, target, &combined, operations, ctx)
            }
            Stmt::Expr(Expr::Call {
                func,
                args,
                keywords,
            }) => self.visit_bare_call(line, func, args, keywords, operations, ctx),
            Stmt::Expr(expr) if expr.has_unsupported() => {
                debug!("Skipping unsupported expression statement: {}", format_expr(expr));
                ctx.mark_placeholder();
            }
            Stmt::Expr(expr) => trace!("Ignoring bare expression {}", format_expr(expr)),
            Stmt::Return(value) => self.visit_return(line, value.as_ref(), operations, ctx),
            Stmt::If { test, body, orelse } => {
                let step_id = ctx.next_step_id("if");
                let test = self.format(test, ctx);
                let mut flow = ControlFlow::new(ControlFlowKind::If, Some(test), self.visit_body(body, ctx));
                flow.orelse = self.visit_body(orelse, ctx);
                let purpose = self.purpose(line, "Branch on condition".to_string());
                operations.push(Operation::new(step_id, OperationKind::ControlFlow(flow), purpose));
            }
            Stmt::While { test, body, orelse } => {
                let step_id = ctx.next_step_id("while");
                let test = self.format(test, ctx);
                let mut flow =
                    ControlFlow::new(ControlFlowKind::While, Some(test), self.visit_body(body, ctx));
                flow.orelse = self.visit_body(orelse, ctx);
                let purpose = self.purpose(line, "Repeat while condition holds".to_string());
                operations.push(Operation::new(step_id, OperationKind::ControlFlow(flow), purpose));
            }
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                let step_id = ctx.next_step_id("try");
                let mut flow = ControlFlow::new(ControlFlowKind::Try, None, self.visit_body(body, ctx));
                flow.handlers = handlers
                    .iter()
                    .map(|handler| self.visit_handler(handler, ctx))
                    .collect();
                flow.orelse = self.visit_body(orelse, ctx);
                flow.finalbody = self.visit_body(finalbody, ctx);
                let purpose = self.purpose(line, "Guard block with exception handling".to_string());
                operations.push(Operation::new(step_id, OperationKind::ControlFlow(flow), purpose));
            }
            Stmt::For {
                target,
                iter,
                body,
                orelse,
            } => self.visit_for(line, target, iter, body, orelse, operations, ctx),
            Stmt::FunctionDef(def) => trace!("Skipping nested function {}", def.name),
            Stmt::ClassDef(def) => trace!("Skipping nested class {}", def.name),
            Stmt::Other(kind) if is_benign(kind) => {}
            Stmt::Other(kind) => {
                debug!("Skipping unsupported statement: {}", kind);
                ctx.mark_placeholder();
            }
        }
    }

    fn visit_assign(
        &self,
        line: usize,
        target: &AssignTarget,
        value: &Expr,
        operations: &mut Vec<Operation>,
        ctx: &mut VisitContext,
    ) {
        match target {
            AssignTarget::Name(name) => {
                let step_id = ctx.next_step_id("assign");
                if let Expr::Call {
                    func,
                    args,
                    keywords,
                } = value
                {
                    let call = self.call_operation(Some(name.clone()), func, args, keywords, ctx);
                    let callee = call.target_function_name.clone();
                    let constructor = callee.as_deref().is_some_and(is_constructor_name);
                    let fallback = match (&callee, constructor) {
                        (Some(callee), true) => format!("Construct '{}' & assign to '{}'", callee, name),
                        (Some(callee), false) => format!("Call '{}' & assign to '{}'", callee, name),
                        (None, _) => format!("Call expression & assign to '{}'", name),
                    };
                    let kind = if constructor {
                        OperationKind::ConstructorCall(call)
                    } else {
                        OperationKind::FunctionCall(call)
                    };
                    operations.push(Operation::new(step_id, kind, self.purpose(line, fallback)));
                    return;
                }

                let expression_type = expression_type(value);
                let fallback = match expression_type {
                    ExpressionType::ListLiteral => format!("Initialize list '{}'", name),
                    ExpressionType::Arithmetic => format!("Calculate value for '{}'", name),
                    ExpressionType::Comparison => format!("Evaluate condition into '{}'", name),
                    ExpressionType::Value => format!("Assign value to '{}'", name),
                };
                let kind = OperationKind::Assignment {
                    assign_to_variable: name.clone(),
                    expression_type,
                    expression_ast_repr: self.format(value, ctx),
                };
                operations.push(Operation::new(step_id, kind, self.purpose(line, fallback)));
            }
            AssignTarget::Attribute { object, attr } => {
                let step_id = ctx.next_step_id("assign");
                let fallback = format!("Set attribute '{}' on '{}'", attr, describe_target(object));
                let kind = OperationKind::AttributeAssignment {
                    target_object: self.format(object, ctx),
                    attribute: attr.clone(),
                    value: self.format(value, ctx),
                };
                operations.push(Operation::new(step_id, kind, self.purpose(line, fallback)));
            }
            AssignTarget::Subscript { value: container, slice } => {
                let step_id = ctx.next_step_id("assign");
                let fallback = format!("Set key on '{}'", describe_target(container));
                let kind = OperationKind::DictKeyAssignment {
                    target_dict: self.format(container, ctx),
                    key: self.format(slice, ctx),
                    value: self.format(value, ctx),
                };
                operations.push(Operation::new(step_id, kind, self.purpose(line, fallback)));
            }
            AssignTarget::Other(kind) => {
                debug!("Skipping assignment to unsupported target: {}", kind);
                ctx.mark_placeholder();
            }
        }
    }

    fn visit_bare_call(
        &self,
        line: usize,
        func: &Expr,
        args: &[Expr],
        keywords: &[Keyword],
        operations: &mut Vec<Operation>,
        ctx: &mut VisitContext,
    ) {
        if let (Expr::Attribute { value: receiver, attr }, [item], []) = (func, args, keywords) {
            if attr == "append" {
                let step_id = ctx.next_step_id("assign");
                let fallback = format!("Append item to '{}'", describe_target(receiver));
                let kind = OperationKind::ListAppend {
                    target_list: self.format(receiver, ctx),
                    value: self.format(item, ctx),
                };
                operations.push(Operation::new(step_id, kind, self.purpose(line, fallback)));
                return;
            }
        }

        let step_id = ctx.next_step_id("call");
        let call = self.call_operation(None, func, args, keywords, ctx);
        let fallback = match &call.target_function_name {
            Some(callee) => format!("Call '{}'", callee),
            None => "Call expression".to_string(),
        };
        operations.push(Operation::new(
            step_id,
            OperationKind::FunctionCallStandalone(call),
            self.purpose(line, fallback),
        ));
    }

    fn call_operation(
        &self,
        assign_to_variable: Option<String>,
        func: &Expr,
        args: &[Expr],
        keywords: &[Keyword],
        ctx: &mut VisitContext,
    ) -> CallOperation {
        let (target_function_name, target_object) = match func {
            Expr::Name(name) => (Some(name.clone()), None),
            Expr::Attribute { value, attr } => (Some(attr.clone()), Some(self.format(value, ctx))),
            other => {
                if other.has_unsupported() {
                    ctx.mark_placeholder();
                }
                (None, None)
            }
        };
        if args.iter().any(Expr::has_unsupported)
            || keywords.iter().any(|k| k.value.has_unsupported())
        {
            ctx.mark_placeholder();
        }

        CallOperation {
            assign_to_variable,
            target_function_name,
            target_object,
            parameter_mapping: parameter_mapping(args, keywords),
        }
    }

    fn visit_return(
        &self,
        line: usize,
        value: Option<&Expr>,
        operations: &mut Vec<Operation>,
        ctx: &mut VisitContext,
    ) {
        match value {
            None => trace!("Bare return leaves the output unchanged"),
            Some(Expr::Name(name)) => {
                ctx.output_variable = Some(name.clone());
                // Only the operation list this return sits in is searched
                match operations
                    .iter_mut()
                    .rev()
                    .find(|op| op.assigned_variable() == Some(name.as_str()))
                {
                    Some(op) => op.mark_as_output(),
                    None => trace!("No local operation assigns returned name {}", name),
                }
            }
            Some(expr) => {
                ctx.output_variable = Some(DIRECT_RETURN_SENTINEL.to_string());
                let step_id = ctx.next_step_id("return_expr");
                let kind = OperationKind::Return {
                    expression_ast_repr: self.format(expr, ctx),
                };
                let mut op = Operation::new(
                    step_id,
                    kind,
                    self.purpose(line, "Return calculated expression".to_string()),
                );
                op.assign_to_output = true;
                operations.push(op);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_for(
        &self,
        line: usize,
        target: &Expr,
        iter: &Expr,
        body: &[Statement],
        orelse: &[Statement],
        operations: &mut Vec<Operation>,
        ctx: &mut VisitContext,
    ) {
        let step_id = ctx.next_step_id("loop");
        let target_variable = match target {
            Expr::Name(name) => name.clone(),
            other => self.format(other, ctx),
        };
        let iterable_source_repr = self.format(iter, ctx);

        ctx.enter_loop();
        let loop_body_operations = self.visit_body(body, ctx);
        ctx.exit_loop();
        let orelse = self.visit_body(orelse, ctx);

        let fallback = format!("Iterate '{}' over '{}'", target_variable, describe_target(iter));
        let kind = OperationKind::ForLoop {
            target_variable,
            iterable_source_repr,
            loop_body_operations,
            orelse,
        };
        operations.push(Operation::new(step_id, kind, self.purpose(line, fallback)));
    }

    fn visit_handler(&self, handler: &ExceptClause, ctx: &mut VisitContext) -> ExceptHandler {
        ExceptHandler {
            exception_type: handler.exception_type.as_ref().map(|ty| match ty {
                Expr::Name(name) => name.clone(),
                other => self.format(other, ctx),
            }),
            name: handler.name.clone(),
            body: self.visit_body(&handler.body, ctx),
        }
    }
}

/// Constructor calls are recognized by an uppercase first letter.
fn is_constructor_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Statements that carry no data flow and do not make a Holoform partial.
fn is_benign(kind: &str) -> bool {
    matches!(
        kind,
        "pass_statement"
            | "break_statement"
            | "continue_statement"
            | "import_statement"
            | "import_from_statement"
            | "future_import_statement"
            | "global_statement"
            | "nonlocal_statement"
            | "annotation"
            | "decorated_definition"
    )
}
