// This file is part of sedge, a POSIX-compatible shell.
// Copyright (C) 2024 the sedge authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! End-to-end scripts run through parse and execution against the real
//! system.
//!
//! These tests fork children and wait for them with `waitpid(-1)`, so
//! they must not run concurrently with each other; `#[serial]` keeps one
//! test's wait loop from reaping another test's children. Output is
//! observed through the shell's own machinery (command substitution and
//! file redirection) rather than by juggling the test process's
//! standard output.
//!
//! Built-ins are not part of the core, so the handful the scripts need
//! (`exit`, `break`, `continue`, `return`) are registered as minimal
//! test implementations.

use sedge_env::builtin::{Builtin, Kind};
use sedge_env::option::{Option::*, State::*};
use sedge_env::semantics::{Divert, ExitStatus, Field};
use sedge_env::variable::Attrs;
use sedge_env::Env;
use sedge_semantics::run_source;
use serial_test::serial;
use std::ops::ControlFlow::Break;

fn exit_builtin(env: &mut Env, args: Vec<Field>) -> sedge_env::builtin::Result {
    let status = args
        .first()
        .and_then(|arg| arg.value.parse().ok())
        .map(ExitStatus);
    sedge_env::builtin::Result {
        exit_status: status.unwrap_or(env.exit_status),
        divert: Break(Divert::Exit(status.or(Some(env.exit_status)))),
    }
}

/// Reads the operand of `break`/`continue` and clamps it to the actual
/// loop nesting depth, so a count beyond the depth leaves all enclosing
/// loops rather than unwinding past them.
fn loop_operand(env: &Env, args: &[Field]) -> usize {
    let count: usize = args
        .first()
        .and_then(|arg| arg.value.parse().ok())
        .unwrap_or(1);
    count.clamp(1, env.stack.loop_count().max(1))
}

fn break_builtin(env: &mut Env, args: Vec<Field>) -> sedge_env::builtin::Result {
    let count = loop_operand(env, &args);
    sedge_env::builtin::Result {
        exit_status: ExitStatus::SUCCESS,
        divert: Break(Divert::Break { count: count - 1 }),
    }
}

fn continue_builtin(env: &mut Env, args: Vec<Field>) -> sedge_env::builtin::Result {
    let count = loop_operand(env, &args);
    sedge_env::builtin::Result {
        exit_status: ExitStatus::SUCCESS,
        divert: Break(Divert::Continue { count: count - 1 }),
    }
}

fn return_builtin(_env: &mut Env, args: Vec<Field>) -> sedge_env::builtin::Result {
    let status = args
        .first()
        .and_then(|arg| arg.value.parse().ok())
        .map(ExitStatus);
    sedge_env::builtin::Result {
        exit_status: status.unwrap_or(ExitStatus::SUCCESS),
        divert: Break(Divert::Return(status)),
    }
}

fn test_env() -> Env {
    let mut env = Env::with_environ();
    for (name, kind, execute) in [
        ("exit", Kind::Special, exit_builtin as sedge_env::builtin::Main),
        ("break", Kind::Special, break_builtin),
        ("continue", Kind::Special, continue_builtin),
        ("return", Kind::Special, return_builtin),
    ] {
        env.builtins.insert(name, Builtin { kind, execute });
    }
    env
}

fn var<'e>(env: &'e Env, name: &str) -> &'e str {
    env.variables.value(name).unwrap_or_default()
}

#[test]
#[serial]
fn simple_command_output_and_status() {
    let mut env = test_env();
    let status = run_source(&mut env, "x=$(echo hello)");
    assert_eq!(status, ExitStatus::SUCCESS);
    assert_eq!(var(&env, "x"), "hello");
}

#[test]
#[serial]
fn failing_command_sets_the_exit_status() {
    let mut env = test_env();
    assert_eq!(run_source(&mut env, "false"), ExitStatus::FAILURE);
    assert_eq!(run_source(&mut env, "true"), ExitStatus::SUCCESS);
}

#[test]
#[serial]
fn dollar_question_reports_the_previous_status() {
    let mut env = test_env();
    run_source(&mut env, "false");
    run_source(&mut env, "x=$?");
    assert_eq!(var(&env, "x"), "1");
}

#[test]
#[serial]
fn star_joins_positional_parameters_with_ifs() {
    let mut env = test_env();
    env.arguments = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    run_source(&mut env, "IFS=:; x=\"$*\"");
    assert_eq!(var(&env, "x"), "a:b:c");
}

#[test]
#[serial]
fn until_loop_counts_up() {
    let mut env = test_env();
    let status = run_source(
        &mut env,
        "x=1\nuntil [ \"$x\" -gt 3 ]; do y=\"$y$x\"; x=$((x+1)); done",
    );
    assert_eq!(status, ExitStatus::SUCCESS);
    assert_eq!(var(&env, "y"), "123");
    assert_eq!(var(&env, "x"), "4");
}

#[test]
#[serial]
fn and_or_lists_short_circuit() {
    let mut env = test_env();
    let status = run_source(&mut env, "x=$(false && echo A || echo B)");
    assert_eq!(status, ExitStatus::SUCCESS);
    assert_eq!(var(&env, "x"), "B");

    run_source(&mut env, "y=$(true || echo never)");
    assert_eq!(var(&env, "y"), "");

    run_source(&mut env, "z=$(true && echo yes)");
    assert_eq!(var(&env, "z"), "yes");
}

#[test]
#[serial]
fn subshell_exit_status_is_observed() {
    let mut env = test_env();
    let status = run_source(&mut env, "(exit 7)");
    assert_eq!(status, ExitStatus(7));
    run_source(&mut env, "x=$?");
    assert_eq!(var(&env, "x"), "7");
}

#[test]
#[serial]
fn subshell_does_not_affect_the_parent_environment() {
    let mut env = test_env();
    run_source(&mut env, "x=outer; (x=inner; true); y=$x");
    assert_eq!(var(&env, "y"), "outer");
}

#[test]
#[serial]
fn here_document_expands_variables() {
    let mut env = test_env();
    env.variables
        .assign("USER", "root", Attrs::empty())
        .unwrap();
    let status = run_source(&mut env, "x=$(cat <<EOF\nhi $USER\nEOF\n)");
    assert_eq!(status, ExitStatus::SUCCESS);
    assert_eq!(var(&env, "x"), "hi root");
}

#[test]
#[serial]
fn quoted_here_document_is_literal() {
    let mut env = test_env();
    env.variables
        .assign("USER", "root", Attrs::empty())
        .unwrap();
    run_source(&mut env, "x=$(cat <<'EOF'\nhi $USER\nEOF\n)");
    assert_eq!(var(&env, "x"), "hi $USER");
}

#[test]
#[serial]
fn pipeline_status_is_the_last_stage() {
    let mut env = test_env();
    assert_eq!(run_source(&mut env, "true | false"), ExitStatus::FAILURE);
    assert_eq!(run_source(&mut env, "false | true"), ExitStatus::SUCCESS);
}

#[test]
#[serial]
fn bang_negates_the_pipeline_status() {
    let mut env = test_env();
    assert_eq!(run_source(&mut env, "! false"), ExitStatus::SUCCESS);
    assert_eq!(run_source(&mut env, "! true"), ExitStatus::FAILURE);
    assert_eq!(run_source(&mut env, "! true | false"), ExitStatus::SUCCESS);
}

#[test]
#[serial]
fn pipeline_passes_data_between_stages() {
    let mut env = test_env();
    run_source(&mut env, "x=$(echo hello | cat | cat)");
    assert_eq!(var(&env, "x"), "hello");
}

#[test]
#[serial]
fn break_leaves_the_loop() {
    let mut env = test_env();
    let status = run_source(
        &mut env,
        "while true; do x=done; break; x=never; done",
    );
    assert_eq!(status, ExitStatus::SUCCESS);
    assert_eq!(var(&env, "x"), "done");
}

#[test]
#[serial]
fn break_with_a_count_leaves_outer_loops() {
    let mut env = test_env();
    run_source(
        &mut env,
        "for i in 1 2; do for j in a b; do x=\"$x$i$j\"; break 2; done; done",
    );
    assert_eq!(var(&env, "x"), "1a");
}

#[test]
#[serial]
fn break_count_beyond_the_nesting_depth_leaves_all_loops() {
    let mut env = test_env();
    // The count is clamped to the loop nesting depth, so the script
    // continues after the loops instead of unwinding past them.
    let status = run_source(
        &mut env,
        "for i in 1 2; do for j in a b; do break 99; done; x=\"$x$i\"; done; y=after",
    );
    assert_eq!(status, ExitStatus::SUCCESS);
    assert_eq!(var(&env, "x"), "");
    assert_eq!(var(&env, "y"), "after");
}

#[test]
#[serial]
fn continue_skips_to_the_next_iteration() {
    let mut env = test_env();
    run_source(
        &mut env,
        "for i in 1 2 3; do case $i in (2) continue;; esac; x=\"$x$i\"; done",
    );
    assert_eq!(var(&env, "x"), "13");
}

#[test]
#[serial]
fn for_loop_without_in_iterates_positional_parameters() {
    let mut env = test_env();
    env.arguments = vec!["p".to_string(), "q".to_string()];
    run_source(&mut env, "for a; do x=\"$x$a\"; done");
    assert_eq!(var(&env, "x"), "pq");
}

#[test]
#[serial]
fn functions_take_arguments_and_return() {
    let mut env = test_env();
    let status = run_source(
        &mut env,
        "f() { x=$1; return 5; x=never; }\nf hello",
    );
    assert_eq!(status, ExitStatus(5));
    assert_eq!(var(&env, "x"), "hello");
}

#[test]
#[serial]
fn function_arguments_do_not_leak() {
    let mut env = test_env();
    env.arguments = vec!["outer".to_string()];
    run_source(&mut env, "f() { inside=$1; }; f inner; after=$1");
    assert_eq!(var(&env, "inside"), "inner");
    assert_eq!(var(&env, "after"), "outer");
}

#[test]
#[serial]
fn case_matches_patterns_in_order() {
    let mut env = test_env();
    run_source(
        &mut env,
        "case hello.rs in (*.txt) x=txt;; (*.rs) x=rs;; (*) x=other;; esac",
    );
    assert_eq!(var(&env, "x"), "rs");

    let status = run_source(&mut env, "case nothing in (a) x=a;; esac");
    assert_eq!(status, ExitStatus::SUCCESS);
}

#[test]
#[serial]
fn case_with_quoted_pattern_is_literal() {
    let mut env = test_env();
    run_source(&mut env, "case '*' in ('*') x=literal;; (*) x=any;; esac");
    assert_eq!(var(&env, "x"), "literal");
}

#[test]
#[serial]
fn redirection_writes_and_reads_files() {
    let mut env = test_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out");
    let path = path.to_str().unwrap();

    let status = run_source(&mut env, &format!("echo data >{path}"));
    assert_eq!(status, ExitStatus::SUCCESS);
    assert_eq!(std::fs::read_to_string(path).unwrap(), "data\n");

    run_source(&mut env, &format!("echo more >>{path}"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), "data\nmore\n");

    run_source(&mut env, &format!("x=$(cat <{path})"));
    assert_eq!(var(&env, "x"), "data\nmore");
}

#[test]
#[serial]
fn stderr_can_be_joined_to_stdout() {
    let mut env = test_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out");
    let path = path.to_str().unwrap();
    // sh -c writes to fd 2; 2>&1 joins it to the redirected fd 1.
    run_source(
        &mut env,
        &format!("sh -c 'echo oops >&2' >{path} 2>&1"),
    );
    assert_eq!(std::fs::read_to_string(path).unwrap(), "oops\n");
}

#[test]
#[serial]
fn noclobber_prevents_overwriting() {
    let mut env = test_env();
    env.options.set(Clobber, Off);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out");
    let path = path.to_str().unwrap();
    std::fs::write(path, "original").unwrap();

    let status = run_source(&mut env, &format!("echo new >{path}"));
    assert_eq!(status, ExitStatus::FAILURE);
    assert_eq!(std::fs::read_to_string(path).unwrap(), "original");

    // >| overrides noclobber.
    let status = run_source(&mut env, &format!("echo new >|{path}"));
    assert_eq!(status, ExitStatus::SUCCESS);
    assert_eq!(std::fs::read_to_string(path).unwrap(), "new\n");
}

#[test]
#[serial]
fn errexit_stops_the_script() {
    let mut env = test_env();
    env.options.set(ErrExit, On);
    let status = run_source(&mut env, "false; x=after");
    assert_eq!(status, ExitStatus::FAILURE);
    assert_eq!(env.variables.value("x"), None);
}

#[test]
#[serial]
fn errexit_ignores_condition_contexts() {
    let mut env = test_env();
    env.options.set(ErrExit, On);
    let status = run_source(&mut env, "if false; then x=then; fi; y=after");
    assert_eq!(status, ExitStatus::SUCCESS);
    assert_eq!(var(&env, "y"), "after");
}

#[test]
#[serial]
fn command_not_found_is_127() {
    let mut env = test_env();
    let status = run_source(&mut env, "definitely-no-such-command-xyzzy");
    assert_eq!(status, ExitStatus::NOT_FOUND);
}

#[test]
#[serial]
fn found_but_not_executable_is_126() {
    use std::os::unix::fs::PermissionsExt;
    let mut env = test_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("script");
    std::fs::write(&path, "#!/bin/sh\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    let status = run_source(&mut env, path.to_str().unwrap());
    assert_eq!(status, ExitStatus::NOEXEC);
}

#[test]
#[serial]
fn pathname_expansion_finds_files() {
    let mut env = test_env();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "").unwrap();
    std::fs::write(dir.path().join("b.log"), "").unwrap();

    run_source(&mut env, &format!("x=$(echo {}/*.txt)", dir.path().display()));
    assert_eq!(var(&env, "x"), format!("{}/a.txt", dir.path().display()));

    // An unmatched pattern stays literal.
    run_source(&mut env, &format!("y=$(echo {}/*.nope)", dir.path().display()));
    assert_eq!(var(&env, "y"), format!("{}/*.nope", dir.path().display()));
}

#[test]
#[serial]
fn noglob_disables_pathname_expansion() {
    let mut env = test_env();
    env.options.set(Glob, Off);
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "").unwrap();

    run_source(&mut env, &format!("x=$(echo {}/*.txt)", dir.path().display()));
    assert_eq!(var(&env, "x"), format!("{}/*.txt", dir.path().display()));
}

#[test]
#[serial]
fn asynchronous_command_records_its_pid() {
    let mut env = test_env();
    let status = run_source(&mut env, "sleep 0 & x=$!");
    assert_eq!(status, ExitStatus::SUCCESS);
    assert!(!var(&env, "x").is_empty());
    // The background job finishes eventually and gets reaped by a later
    // command list.
    run_source(&mut env, "true; true");
}

#[test]
#[serial]
fn readonly_variable_rejects_assignment() {
    let mut env = test_env();
    env.variables
        .assign("frozen", "1", Attrs::READONLY)
        .unwrap();
    let status = run_source(&mut env, "frozen=2");
    assert_eq!(status, ExitStatus::FAILURE);
    assert_eq!(var(&env, "frozen"), "1");
}

#[test]
#[serial]
fn aliases_substitute_in_command_position() {
    let mut env = test_env();
    env.aliases.define("greet", "echo hi");
    run_source(&mut env, "x=$(greet there)");
    assert_eq!(var(&env, "x"), "hi there");
}

#[test]
#[serial]
fn arithmetic_expansion_in_commands() {
    let mut env = test_env();
    run_source(&mut env, "x=$((2 + 3 * 4)); y=$((x > 10 ? 1 : 0))");
    assert_eq!(var(&env, "x"), "14");
    assert_eq!(var(&env, "y"), "1");
}

#[test]
#[serial]
fn parameter_operators_in_commands() {
    let mut env = test_env();
    run_source(&mut env, "x=${missing:-default}; path=/a/b/c.txt; base=${path##*/}");
    assert_eq!(var(&env, "x"), "default");
    assert_eq!(var(&env, "base"), "c.txt");
}

#[test]
#[serial]
fn exit_builtin_ends_the_script() {
    let mut env = test_env();
    let status = run_source(&mut env, "x=before; exit 3; x=after");
    assert_eq!(status, ExitStatus(3));
    assert_eq!(var(&env, "x"), "before");
}

#[test]
#[serial]
fn parse_error_is_status_2() {
    let mut env = test_env();
    let status = run_source(&mut env, "if true; fi");
    assert_eq!(status, ExitStatus::ERROR);
}

#[test]
#[serial]
fn single_quotes_suppress_all_expansion() {
    let mut env = test_env();
    env.variables.assign("v", "value", Attrs::empty()).unwrap();
    run_source(&mut env, "x='$v $(echo no) $((1+1))'");
    assert_eq!(var(&env, "x"), "$v $(echo no) $((1+1))");
}

#[test]
#[serial]
fn nested_command_substitution() {
    let mut env = test_env();
    run_source(&mut env, "x=$(echo $(echo inner))");
    assert_eq!(var(&env, "x"), "inner");
}

#[test]
#[serial]
fn brace_group_runs_in_the_current_shell() {
    let mut env = test_env();
    run_source(&mut env, "{ x=set; true; }");
    assert_eq!(var(&env, "x"), "set");
}
