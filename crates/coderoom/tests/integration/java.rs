use coderoom::ExecuteError;

use super::{fixture_source, has_tools, leftovers, test_executor};

#[tokio::test]
async fn test_java_hello() {
    if !has_tools(&["javac", "java"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("Main.java"), "java", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "Hello, World!\n");
    assert!(leftovers(executor.root().path()).is_empty());
}

#[tokio::test]
async fn test_java_with_input() {
    if !has_tools(&["javac", "java"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("Main.java"), "Java", Some("19 23\n".to_owned()))
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "42\n");
    assert!(leftovers(executor.root().path()).is_empty());
}

#[tokio::test]
async fn test_java_nested_classes_are_cleaned_up() {
    if !has_tools(&["javac", "java"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("Solution.java"), "java", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "nested\n");
    // Solution$Helper.class lives in the request directory, removed as a whole
    assert!(leftovers(executor.root().path()).is_empty());
}

#[tokio::test]
async fn test_java_compile_error() {
    if !has_tools(&["javac", "java"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("compile_error.java"), "java", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "");
    assert!(result.error.contains("incompatible types"));
    assert!(leftovers(executor.root().path()).is_empty());
}

#[tokio::test]
async fn test_java_missing_public_class() {
    let (_dir, executor) = test_executor();

    let err = executor
        .execute_code("class Main { }", "java", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ExecuteError::MissingPublicClass { .. }));
    assert!(leftovers(executor.root().path()).is_empty());
}

#[tokio::test]
async fn test_java_concurrent_main_classes() {
    if !has_tools(&["javac", "java"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let mut handles = Vec::new();
    for i in 0..4 {
        let executor = executor.clone();
        handles.push(tokio::spawn(async move {
            executor
                .execute_code(fixture_source("Main.java"), "java", Some(format!("{i} {i}")))
                .await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap().expect("Execution failed");
        assert_eq!(result.output, format!("{}\n", i * 2));
    }
    assert!(leftovers(executor.root().path()).is_empty());
}
