use crate::{HoloformDriver, VisitContext};
use holoform_core::{
    ControlFlowKind, ExpressionType, FunctionHoloform, Holoform, HoloformParser, OperationKind,
    ParameterSource,
};

fn function(source: &str) -> FunctionHoloform {
    match HoloformDriver::new().generate(source, None) {
        Some(Holoform::Function(f)) => f,
        other => panic!("expected a function Holoform, got {other:?}"),
    }
}

fn step_ids(ops: &[holoform_core::Operation]) -> Vec<&str> {
    ops.iter().map(|op| op.step_id.as_str()).collect()
}

#[test]
fn test_step_id_counters() {
    let mut ctx = VisitContext::new();
    assert_eq!(ctx.next_step_id("assign"), "s_assign_0");
    assert_eq!(ctx.next_step_id("loop"), "s_loop_1");
    ctx.enter_loop();
    assert_eq!(ctx.loop_depth(), 1);
    assert_eq!(ctx.next_step_id("assign"), "s_loop_assign_0");
    assert_eq!(ctx.next_step_id("call"), "s_loop_call_1");
    ctx.exit_loop();
    assert_eq!(ctx.next_step_id("return_expr"), "s_return_expr_2");
    assert!(!ctx.contains_placeholders());
}

#[test]
fn test_output_back_annotation() {
    let f = function("def add(a, b):\n    result = a + b\n    return result\n");

    assert_eq!(f.id, "add_auto_v1");
    assert_eq!(f.input_parameters, vec!["a", "b"]);
    assert_eq!(f.output_variable_name.as_deref(), Some("result"));
    assert_eq!(f.operations.len(), 1);

    let op = &f.operations[0];
    assert_eq!(op.step_id, "s_assign_0");
    assert!(op.assign_to_output);
    assert_eq!(op.semantic_purpose, "Calculate value for 'result' (produces function output)");
    match &op.kind {
        OperationKind::Assignment {
            assign_to_variable,
            expression_type,
            expression_ast_repr,
        } => {
            assert_eq!(assign_to_variable, "result");
            assert_eq!(*expression_type, ExpressionType::Arithmetic);
            assert_eq!(expression_ast_repr, "BinOp(Name(id='a'), Add, Name(id='b'))");
        }
        other => panic!("unexpected operation: {other:?}"),
    }
    assert_eq!(
        f.description,
        "Auto-generated Holoform for function add_auto_v1. Primary action: Calculate value for 'result' (produces function output)"
    );
    assert!(!f.contains_placeholders);
}

#[test]
fn test_if_with_attribute_assignment() {
    let f = function("def check(user):\n    if not user.email:\n        user.status = \"invalid\"\n");
    assert_eq!(f.operations.len(), 1);

    let OperationKind::ControlFlow(flow) = &f.operations[0].kind else {
        panic!("expected control flow");
    };
    assert_eq!(flow.subtype, ControlFlowKind::If);
    assert_eq!(
        flow.test.as_deref(),
        Some("UnaryOp(Not, Attribute(value=Name(id='user'), attr='email'))")
    );
    assert_eq!(flow.body.len(), 1);
    // if bodies share the enclosing counter
    assert_eq!(flow.body[0].step_id, "s_assign_1");
    match &flow.body[0].kind {
        OperationKind::AttributeAssignment {
            target_object,
            attribute,
            value,
        } => {
            assert_eq!(target_object, "Name(id='user')");
            assert_eq!(attribute, "status");
            assert_eq!(value, "Constant(value_type='str')");
        }
        other => panic!("unexpected operation: {other:?}"),
    }
    assert_eq!(f.output_variable_name, None);
}

#[test]
fn test_literal_values_do_not_reach_output() {
    let repr = |source: &str| match &function(source).operations[0].kind {
        OperationKind::Assignment {
            expression_ast_repr,
            ..
        } => expression_ast_repr.clone(),
        other => panic!("unexpected operation: {other:?}"),
    };
    assert_eq!(repr("def f():\n    x = 5\n"), repr("def f():\n    x = 9\n"));
    assert_ne!(repr("def f():\n    x = 5\n"), repr("def f():\n    x = \"s\"\n"));
}

#[test]
fn test_loop_scoped_ids_restart_per_loop() {
    let f = function(
        "def process(items):\n    total = 0\n    for item in items:\n        total = total + item\n        seen = item\n    for other in items:\n        count = other\n    return total\n",
    );
    assert_eq!(step_ids(&f.operations), vec!["s_assign_0", "s_loop_1", "s_loop_2"]);

    let bodies: Vec<Vec<&str>> = f
        .operations
        .iter()
        .filter_map(|op| match &op.kind {
            OperationKind::ForLoop {
                loop_body_operations,
                ..
            } => Some(step_ids(loop_body_operations)),
            _ => None,
        })
        .collect();
    assert_eq!(
        bodies,
        vec![vec!["s_loop_assign_0", "s_loop_assign_1"], vec!["s_loop_assign_0"]]
    );
    assert!(f.operations[0].assign_to_output);
}

#[test]
fn test_nested_loops_keep_separate_counters() {
    let f = function(
        "def nested(rows):\n    total = 0\n    for row in rows:\n        count = 0\n        for cell in row:\n            seen = cell\n            total = total + cell\n        last = row\n    return total\n",
    );
    assert_eq!(step_ids(&f.operations), vec!["s_assign_0", "s_loop_1"]);

    let OperationKind::ForLoop {
        loop_body_operations: outer,
        ..
    } = &f.operations[1].kind
    else {
        panic!("expected outer loop");
    };
    assert_eq!(
        step_ids(outer),
        vec!["s_loop_assign_0", "s_loop_loop_1", "s_loop_assign_2"]
    );

    let OperationKind::ForLoop {
        target_variable,
        loop_body_operations: inner,
        ..
    } = &outer[1].kind
    else {
        panic!("expected inner loop");
    };
    assert_eq!(target_variable, "cell");
    assert_eq!(step_ids(inner), vec!["s_loop_assign_0", "s_loop_assign_1"]);
}

#[test]
fn test_for_else_body_uses_enclosing_counter() {
    let f = function(
        "def find(items, wanted):\n    for item in items:\n        if item == wanted:\n            break\n    else:\n        missing = wanted\n    return missing\n",
    );
    assert!(!f.contains_placeholders);
    let OperationKind::ForLoop {
        loop_body_operations,
        orelse,
        ..
    } = &f.operations[0].kind
    else {
        panic!("expected for loop");
    };
    assert_eq!(step_ids(loop_body_operations), vec!["s_loop_if_0"]);
    assert_eq!(step_ids(orelse), vec!["s_assign_1"]);
    assert_eq!(f.output_variable_name.as_deref(), Some("missing"));
}

#[test]
fn test_accumulating_loop() {
    let f = function(
        "def loop_example(input_list):\n    accumulated_value = 0\n    items = []\n    for x in input_list:\n        accumulated_value = accumulated_value + x\n        items.append(x)\n    final_result = accumulated_value\n    return final_result\n",
    );
    assert_eq!(
        step_ids(&f.operations),
        vec!["s_assign_0", "s_assign_1", "s_loop_2", "s_assign_3"]
    );
    assert!(matches!(
        &f.operations[1].kind,
        OperationKind::Assignment {
            expression_type: ExpressionType::ListLiteral,
            expression_ast_repr,
            ..
        } if expression_ast_repr == "List(elts=[])"
    ));

    let OperationKind::ForLoop {
        target_variable,
        iterable_source_repr,
        loop_body_operations,
        orelse,
    } = &f.operations[2].kind
    else {
        panic!("expected for loop");
    };
    assert_eq!(target_variable, "x");
    assert_eq!(iterable_source_repr, "Name(id='input_list')");
    assert_eq!(loop_body_operations[1].type_name(), "list_append");
    assert!(orelse.is_empty());

    assert!(f.operations[3].assign_to_output);
    assert_eq!(f.output_variable_name.as_deref(), Some("final_result"));
}

#[test]
fn test_state_modification_kinds() {
    let f = function(
        "def modify_state(items_list, data_dict):\n    my_obj = MyObject()\n    my_obj.my_attribute = \"x\"\n    items_list.append(\"x\")\n    data_dict[\"k\"] = \"v\"\n",
    );
    let kinds: Vec<&str> = f.operations.iter().map(|op| op.type_name()).collect();
    assert_eq!(
        kinds,
        vec![
            "constructor_call",
            "attribute_assignment",
            "list_append",
            "dict_key_assignment"
        ]
    );
    assert_eq!(
        step_ids(&f.operations),
        vec!["s_assign_0", "s_assign_1", "s_assign_2", "s_assign_3"]
    );
    assert_eq!(f.operations[0].called_function(), Some("MyObject"));
}

#[test]
fn test_call_operations() {
    let f = function(
        "def run(self, x, f_input_x):\n    result = helper(x, val1=f_input_x)\n    self.save(result)\n",
    );
    let OperationKind::FunctionCall(call) = &f.operations[0].kind else {
        panic!("expected function call");
    };
    assert_eq!(call.assign_to_variable.as_deref(), Some("result"));
    assert_eq!(call.target_function_name.as_deref(), Some("helper"));
    assert_eq!(
        call.parameter_mapping.get("val1"),
        Some(&ParameterSource::Variable {
            name: "f_input_x".to_string()
        })
    );
    assert_eq!(
        call.parameter_mapping.get("arg0"),
        Some(&ParameterSource::Variable {
            name: "x".to_string()
        })
    );

    let standalone = &f.operations[1];
    assert_eq!(standalone.step_id, "s_call_1");
    let OperationKind::FunctionCallStandalone(call) = &standalone.kind else {
        panic!("expected standalone call");
    };
    assert_eq!(call.target_function_name.as_deref(), Some("save"));
    assert_eq!(call.target_object.as_deref(), Some("Name(id='self')"));
    assert_eq!(standalone.called_function(), None);
}

#[test]
fn test_direct_return_expression() {
    let f = function("def double(a):\n    return a * 2\n");
    assert_eq!(f.output_variable_name.as_deref(), Some("_direct_return_expression_"));
    assert_eq!(f.operations[0].step_id, "s_return_expr_0");
    assert!(f.operations[0].assign_to_output);
    assert!(matches!(
        &f.operations[0].kind,
        OperationKind::Return { expression_ast_repr }
            if expression_ast_repr == "BinOp(Name(id='a'), Mult, Constant(value_type='number'))"
    ));
}

#[test]
fn test_inline_comment_becomes_purpose() {
    let f = function("def add(a, b):\n    total = a + b  # sum the inputs\n    return total\n");
    assert_eq!(
        f.operations[0].semantic_purpose,
        "sum the inputs (produces function output)"
    );
}

#[test]
fn test_docstring_kept_verbatim() {
    let f = function(
        "def documented():\n    \"\"\"This is the primary docstring description.\n    It has multiple lines.\n    And some    leading spaces on this line.\"\"\"\n    return 1\n",
    );
    assert_eq!(
        f.description,
        "This is the primary docstring description.\n    It has multiple lines.\n    And some    leading spaces on this line."
    );
    // the docstring itself is not an operation
    assert_eq!(f.operations.len(), 1);
}

#[test]
fn test_comment_block_description() {
    let f = function(
        "import math\n\n# Core utility: adds two numbers\n# and returns the sum\ndef add(a, b):\n    return a + b\n",
    );
    assert_eq!(
        f.description,
        "Core utility: adds two numbers\nand returns the sum"
    );
}

#[test]
fn test_unsupported_constructs_are_flagged() {
    let f = function("def squares(xs):\n    ys = [x * x for x in xs]\n    return ys\n");
    assert!(f.contains_placeholders);
    assert!(matches!(
        &f.operations[0].kind,
        OperationKind::Assignment { expression_ast_repr, .. }
            if expression_ast_repr == "UnsupportedASTNode(list_comprehension)"
    ));

    let plain = function("def ok(a):\n    pass\n    return a\n");
    assert!(!plain.contains_placeholders);
}

#[test]
fn test_skipped_expression_statements_are_flagged() {
    for source in [
        "def gen(xs):\n    yield xs\n",
        "async def g(xs):\n    await xs\n",
        "def h():\n    lambda: 1\n",
    ] {
        let f = function(source);
        assert!(f.operations.is_empty(), "{source}");
        assert!(f.contains_placeholders, "{source}");
    }

    let stub = function("def stub(a):\n    ...\n    'note'\n    a\n");
    assert!(stub.operations.is_empty());
    assert!(!stub.contains_placeholders);
}

#[test]
fn test_back_annotation_is_local_to_return_list() {
    let outer = function("def g(flag):\n    if flag:\n        value = 1\n    return value\n");
    let OperationKind::ControlFlow(flow) = &outer.operations[0].kind else {
        panic!("expected control flow");
    };
    assert!(!flow.body[0].assign_to_output);
    assert_eq!(outer.output_variable_name.as_deref(), Some("value"));

    let inner = function("def h(flag):\n    if flag:\n        value = 1\n        return value\n");
    let OperationKind::ControlFlow(flow) = &inner.operations[0].kind else {
        panic!("expected control flow");
    };
    assert!(flow.body[0].assign_to_output);
}

#[test]
fn test_while_and_try() {
    let f = function(
        "def risky(n):\n    while n > 0:\n        n -= 1\n    try:\n        value = compute(n)\n    except ValueError as err:\n        value = 0\n    finally:\n        cleanup()\n    return value\n",
    );
    assert_eq!(step_ids(&f.operations), vec!["s_while_0", "s_try_2"]);

    let OperationKind::ControlFlow(looping) = &f.operations[0].kind else {
        panic!("expected while");
    };
    assert_eq!(looping.subtype, ControlFlowKind::While);
    assert!(matches!(
        &looping.body[0].kind,
        OperationKind::Assignment { expression_ast_repr, .. }
            if expression_ast_repr == "BinOp(Name(id='n'), Sub, Constant(value_type='number'))"
    ));

    let OperationKind::ControlFlow(guarded) = &f.operations[1].kind else {
        panic!("expected try");
    };
    assert_eq!(guarded.subtype, ControlFlowKind::Try);
    assert_eq!(step_ids(&guarded.body), vec!["s_assign_3"]);
    assert_eq!(guarded.handlers.len(), 1);
    assert_eq!(guarded.handlers[0].exception_type.as_deref(), Some("ValueError"));
    assert_eq!(guarded.handlers[0].name.as_deref(), Some("err"));
    assert_eq!(step_ids(&guarded.handlers[0].body), vec!["s_assign_4"]);
    assert_eq!(step_ids(&guarded.finalbody), vec!["s_call_5"]);
}

#[test]
fn test_class_holoform() {
    let source = "class Repo(Base):\n    \"\"\"Stores records.\"\"\"\n    limit = 10\n\n    def save(self, item):\n        pass\n\n    def load(self):\n        return self.limit\n";
    let Some(Holoform::Class(class)) = HoloformDriver::new().generate(source, Some("Repo")) else {
        panic!("expected a class Holoform");
    };
    assert_eq!(class.id, "Repo_auto_v1");
    assert_eq!(class.description, "Stores records.");
    assert_eq!(class.parent_classes, vec!["Base"]);
    assert_eq!(class.methods, vec!["save", "load"]);
    assert_eq!(class.class_attributes, vec!["limit"]);
}

#[test]
fn test_target_lookup_and_failures() {
    let source = "def first():\n    return 1\n\ndef second(x):\n    return x\n";
    let driver = HoloformDriver::new();

    let picked = driver.generate(source, Some("second")).unwrap();
    assert_eq!(picked.id(), "second_auto_v1");
    assert_eq!(driver.generate(source, None).unwrap().id(), "first_auto_v1");
    assert!(driver.generate(source, Some("missing")).is_none());
    assert!(driver.generate("def broken(:\n", None).is_none());
    assert!(matches!(
        driver.try_generate(source, Some("missing")),
        Err(holoform_core::HoloformError::NotFound(_))
    ));
}

#[test]
fn test_parse_source_uses_module_id() {
    let source = "def a():\n    pass\n\nclass B:\n    pass\n\nx = 1\n";
    let holoforms = HoloformDriver::new().parse_source(source, "pkg.mod").unwrap();
    assert_eq!(holoforms.len(), 2);
    assert!(holoforms.iter().all(|h| h.parent_module_id() == "pkg.mod"));
    assert_eq!(HoloformDriver::new().supported_extensions(), vec!["py", "pyi"]);
}

#[test]
fn test_generation_is_idempotent() {
    let source = "def add(a, b):\n    # not a purpose\n    result = helper(a, b=b)\n    for i in a:\n        result.append(i)\n    return result\n";
    let driver = HoloformDriver::new();
    let first = serde_json::to_string(&driver.generate(source, None).unwrap()).unwrap();
    let second = serde_json::to_string(&driver.generate(source, None).unwrap()).unwrap();
    assert_eq!(first, second);
}
