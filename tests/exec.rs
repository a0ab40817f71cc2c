use lashc::ast::{AssignOp, CompOp, DataType, Fixity, MathOp, UnaryOp};

mod common;
use common::{compile_ok, run_bash, Builder};

#[test]
fn taken_branch_runs_its_body() {
    let mut b = Builder::new();
    let five = b.int(5);
    let decl = b.var_decl("x", five);
    let x_ref = b.var("x");
    let three = b.int(3);
    let cond = b.comp(CompOp::Gt, x_ref, three);
    let big = b.string("big");
    let say = b.call("echo", vec![big]);
    let body = b.expr_stmt(say);
    let if_stmt = b.if_stmt(cond, vec![body]);
    let program = b.finish(vec![decl, if_stmt]);

    let (stdout, status) = run_bash(&compile_ok(&program));
    assert_eq!(stdout, "big\n");
    assert_eq!(status, 0);
}

#[test]
fn loop_accumulates_with_compound_assignment() {
    let mut b = Builder::new();
    let zero = b.int(0);
    let s_decl = b.var_decl("s", zero);

    let zero = b.int(0);
    let init = b.for_init_decl("i", zero);
    let i_ref = b.var("i");
    let four = b.int(4);
    let cond = b.comp(CompOp::Lt, i_ref, four);
    let step = b.update(UnaryOp::Inc, Fixity::Suffix, "i");
    let i_ref = b.var("i");
    let add = b.assign(AssignOp::AddAssign, "s", i_ref);
    let body = b.expr_stmt(add);
    let for_stmt = b.for_loop(Some(init), Some(cond), Some(step), vec![body]);

    let s_ref = b.var("s");
    let say = b.call("echo", vec![s_ref]);
    let tail = b.expr_stmt(say);
    let program = b.finish(vec![s_decl, for_stmt, tail]);

    let (stdout, status) = run_bash(&compile_ok(&program));
    assert_eq!(stdout, "6\n");
    assert_eq!(status, 0);
}

#[test]
fn function_call_passes_string_arguments() {
    let mut b = Builder::new();
    let hi = b.string("hi ");
    let name_ref = b.var("name");
    let concat = b.math(MathOp::Add, hi, name_ref);
    let say = b.call("echo", vec![concat]);
    let body = b.expr_stmt(say);
    let f = b.func("greet", &[("name", DataType::String)], vec![body]);

    let bob = b.string("bob");
    let call = b.call("greet", vec![bob]);
    let stmt = b.expr_stmt(call);
    let program = b.finish(vec![f, stmt]);

    let (stdout, status) = run_bash(&compile_ok(&program));
    assert_eq!(stdout, "hi bob\n");
    assert_eq!(status, 0);
}

#[test]
fn stored_comparison_result_gates_a_branch() {
    let mut b = Builder::new();
    let t = b.boolean(true);
    let decl = b.var_decl("lt", t);
    let three = b.int(3);
    let four = b.int(4);
    let cmp = b.comp(CompOp::Lt, three, four);
    let assign = b.assign(AssignOp::Assign, "lt", cmp);
    let stmt = b.expr_stmt(assign);

    let lt_ref = b.var("lt");
    let yes = b.string("yes");
    let say = b.call("echo", vec![yes]);
    let body = b.expr_stmt(say);
    let if_stmt = b.if_stmt(lt_ref, vec![body]);
    let program = b.finish(vec![decl, stmt, if_stmt]);

    let (stdout, status) = run_bash(&compile_ok(&program));
    assert_eq!(stdout, "yes\n");
    assert_eq!(status, 0);
}

#[test]
fn string_equality_compares_values() {
    let mut b = Builder::new();
    let x = b.string("x");
    let decl = b.var_decl("a", x);
    let a_ref = b.var("a");
    let x = b.string("x");
    let cond = b.comp(CompOp::Eq, a_ref, x);
    let eq = b.string("eq");
    let say = b.call("echo", vec![eq]);
    let body = b.expr_stmt(say);
    let if_stmt = b.if_stmt(cond, vec![body]);
    let program = b.finish(vec![decl, if_stmt]);

    let (stdout, status) = run_bash(&compile_ok(&program));
    assert_eq!(stdout, "eq\n");
    assert_eq!(status, 0);
}

#[test]
fn negated_condition_skips_the_body() {
    let mut b = Builder::new();
    let t = b.boolean(true);
    let decl = b.var_decl("ok", t);
    let not = b.update(UnaryOp::Not, Fixity::Prefix, "ok");
    let no = b.string("no");
    let say = b.call("echo", vec![no]);
    let body = b.expr_stmt(say);
    let if_stmt = b.if_stmt(not, vec![body]);

    let done = b.string("done");
    let say = b.call("echo", vec![done]);
    let tail = b.expr_stmt(say);
    let program = b.finish(vec![decl, if_stmt, tail]);

    let (stdout, status) = run_bash(&compile_ok(&program));
    assert_eq!(stdout, "done\n");
    assert_eq!(status, 0);
}

#[test]
fn stored_negation_gates_a_branch() {
    let mut b = Builder::new();
    let f = b.boolean(false);
    let decl = b.var_decl("ok", f);
    let not = b.update(UnaryOp::Not, Fixity::Prefix, "ok");
    let x_decl = b.var_decl("x", not);

    let x_ref = b.var("x");
    let flip = b.string("flip");
    let say = b.call("echo", vec![flip]);
    let body = b.expr_stmt(say);
    let if_stmt = b.if_stmt(x_ref, vec![body]);
    let program = b.finish(vec![decl, x_decl, if_stmt]);

    let (stdout, status) = run_bash(&compile_ok(&program));
    assert_eq!(stdout, "flip\n");
    assert_eq!(status, 0);
}

#[test]
fn loop_with_inclusive_bound_covers_the_last_value() {
    let mut b = Builder::new();
    let one = b.int(1);
    let init = b.for_init_decl("i", one);
    let i_ref = b.var("i");
    let three = b.int(3);
    let cond = b.comp(CompOp::Le, i_ref, three);
    let step = b.update(UnaryOp::Inc, Fixity::Suffix, "i");
    let i_arg = b.var("i");
    let say = b.call("echo", vec![i_arg]);
    let body = b.expr_stmt(say);
    let for_stmt = b.for_loop(Some(init), Some(cond), Some(step), vec![body]);
    let program = b.finish(vec![for_stmt]);

    let (stdout, status) = run_bash(&compile_ok(&program));
    assert_eq!(stdout, "1\n2\n3\n");
    assert_eq!(status, 0);
}
