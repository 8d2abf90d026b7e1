use coderoom::ExecuteError;

use super::{fixture_source, has_tools, leftovers, test_executor};

#[tokio::test]
async fn test_unsupported_language_leaves_no_files() {
    let (_dir, executor) = test_executor();

    let err = executor
        .execute_code("IDENTIFICATION DIVISION.", "cobol", None)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Unsupported language: cobol");
    assert!(matches!(err, ExecuteError::UnsupportedLanguage(_)));
    assert!(leftovers(executor.root().path()).is_empty());
}

#[tokio::test]
async fn test_mixed_outcomes_leave_no_files() {
    if !has_tools(&["gcc", "python3"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let requests = [
        (fixture_source("hello.c"), "c", None),
        (fixture_source("compile_error.c"), "c", None),
        (fixture_source("sum.c"), "c", Some("1 1".to_owned())),
        (fixture_source("hello.py"), "python", None),
        (fixture_source("runtime_error.py"), "python", Some("x".to_owned())),
    ];

    let mut handles = Vec::new();
    for (code, language, input) in requests {
        let executor = executor.clone();
        handles.push(tokio::spawn(async move {
            executor.execute_code(code, language, input).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("Execution failed");
    }

    assert!(leftovers(executor.root().path()).is_empty());
}
