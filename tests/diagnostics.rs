//! Diagnostics reported by the full pipeline.

use bumpalo::Bump;
use foolc::prelude::*;
use foolc::{BindingError, TypeError};

fn messages(result: &foolc::CompilationResult) -> Vec<String> {
    result.errors.iter().map(ToString::to_string).collect()
}

#[test]
fn independent_errors_are_all_reported() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);

    b.set_line(2);
    let x = b.var("x", b.int_type(), b.int(1));
    b.set_line(3);
    let dup = b.var("x", b.int_type(), b.int(2));
    b.set_line(4);
    let bad = b.var("flag", b.bool_type(), b.add(b.int(1), b.int(2)));
    b.set_line(5);
    let body = b.add(b.name("x"), b.name("nothing"));
    let program = b.program(&[], &[x, dup, bad], body);

    let result = Compiler::default().compile(&program);
    assert!(result.assembly.is_none());
    let lines: Vec<u32> = result.errors.iter().map(CompileError::line).collect();
    assert_eq!(lines, [3, 5, 4]);

    let text = messages(&result);
    assert_eq!(text[0], "binding error at line 3: variable 'x' already declared");
    assert_eq!(text[1], "binding error at line 5: variable 'nothing' not declared");
    assert!(text[2].starts_with("type error at line 4: incompatible value for variable 'flag'"));
}

#[test]
fn class_errors() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let base = b.class(
        "Base",
        None,
        &[b.field("size", b.int_type())],
        &[b.method("area", b.int_type(), &[], &[], b.name("size"))],
    );
    let broken = b.class(
        "Broken",
        Some("Missing"),
        &[b.field("area", b.int_type())],
        &[],
    );
    let clash = b.class(
        "Clash",
        Some("Base"),
        &[b.field("area", b.int_type())],
        &[b.method("size", b.int_type(), &[], &[], b.int(0))],
    );
    let program = b.program(&[base, broken, clash], &[], b.int(0));

    let result = Compiler::default().compile(&program);
    let binding: Vec<_> = result
        .errors
        .iter()
        .filter_map(|e| match e {
            CompileError::Binding(e) => Some(e),
            _ => None,
        })
        .collect();
    assert!(matches!(
        binding[..],
        [
            BindingError::UnknownSuperclass { .. },
            BindingError::FieldOverridesMethod { .. },
            BindingError::MethodOverridesField { .. },
        ]
    ));
}

#[test]
fn type_errors_inside_methods() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let account = b.class(
        "Account",
        None,
        &[b.field("balance", b.int_type())],
        &[
            b.method("open", b.bool_type(), &[], &[], b.name("balance")),
            b.method(
                "deposit",
                b.int_type(),
                &[b.param("amount", b.int_type())],
                &[],
                b.add(b.name("balance"), b.name("amount")),
            ),
        ],
    );
    let acct = b.var("a", b.class_type("Account"), b.new_object("Account", &[b.int(0)]));
    let body = b.method_call("a", "deposit", &[b.new_object("Account", &[b.int(1)])]);
    let program = b.program(&[account], &[acct], body);

    let result = Compiler::default().compile(&program);
    assert!(matches!(
        result.errors[..],
        [
            CompileError::Type(TypeError::WrongReturnType { .. }),
            CompileError::Type(TypeError::ArgumentType { position: 1, .. }),
        ]
    ));
    let text = messages(&result);
    assert!(text[1].contains("invocation of a.deposit"), "{}", text[1]);
}

#[test]
fn clean_programs_report_their_type() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[], &[], b.le(b.int(1), b.int(2)));
    let result = Compiler::default().compile(&program);
    assert!(result.is_success());
    assert_eq!(result.program_type, Some(Type::Bool));
    assert_eq!(result.error_count(), 0);
}
