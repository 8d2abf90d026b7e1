use std::time::{Duration, Instant};

use coderoom::EXECUTION_TIME_PLACEHOLDER;

use super::{fixture_source, has_tools, leftovers, test_executor};

#[tokio::test]
async fn test_c_hello() {
    if !has_tools(&["gcc"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("hello.c"), "c", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "Hello, World!\n");
    assert_eq!(result.error, "");
    assert_ne!(result.execution_time, EXECUTION_TIME_PLACEHOLDER);
    assert!(leftovers(executor.root().path()).is_empty());
}

#[tokio::test]
async fn test_c_with_input() {
    if !has_tools(&["gcc"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("sum.c"), "C", Some("20 22\n".to_owned()))
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "42\n");
}

#[tokio::test]
async fn test_c_without_input_sees_eof() {
    if !has_tools(&["gcc"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("sum.c"), "c", Some("  \n".to_owned()))
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "");
    assert_eq!(result.error, "expected two integers\n");
}

#[tokio::test]
async fn test_c_compile_error() {
    if !has_tools(&["gcc"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("compile_error.c"), "c", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "");
    assert!(result.error.contains("error"), "unexpected error: {}", result.error);
    assert_eq!(result.execution_time, EXECUTION_TIME_PLACEHOLDER);
    assert!(leftovers(executor.root().path()).is_empty());
}

#[tokio::test]
async fn test_c_runtime_error() {
    if !has_tools(&["gcc"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("runtime_error.c"), "c", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "");
    assert_eq!(result.error, "fatal: bad state\n");
}

#[tokio::test]
async fn test_c_infinite_loop_times_out() {
    if !has_tools(&["gcc"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let started = Instant::now();
    let result = executor
        .execute_code(fixture_source("infinite_loop.c"), "c", None)
        .await
        .expect("Execution failed");

    assert!(started.elapsed() < Duration::from_secs(60));
    assert_eq!(result.output, "");
    assert!(result.error.contains("Time limit exceeded"));
    assert!(leftovers(executor.root().path()).is_empty());
}

#[tokio::test]
async fn test_cpp_hello_via_alias() {
    if !has_tools(&["g++"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("hello.cpp"), "c++", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "Hello, World!\n");
}

#[tokio::test]
async fn test_cpp_with_input() {
    if !has_tools(&["g++"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("sum.cpp"), "cpp", Some("1 2".to_owned()))
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "3\n");
}

#[tokio::test]
async fn test_go_hello() {
    if !has_tools(&["go"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("hello.go"), "go", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "Hello, World!\n");
    assert!(leftovers(executor.root().path()).is_empty());
}

#[tokio::test]
async fn test_rust_hello() {
    if !has_tools(&["rustc"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("hello.rs"), "rust", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "Hello, World!\n");
}

#[tokio::test]
async fn test_rust_with_input() {
    if !has_tools(&["rustc"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("sum.rs"), "Rust", Some("5 6 7\n".to_owned()))
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "18\n");
    assert!(leftovers(executor.root().path()).is_empty());
}
