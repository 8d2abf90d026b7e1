use super::{fixture_source, has_tools, leftovers, test_executor};

#[tokio::test]
async fn test_python_hello() {
    if !has_tools(&["python3"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("hello.py"), "python", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "Hello, World!\n");
    assert_eq!(result.error, "");
    assert!(leftovers(executor.root().path()).is_empty());
}

#[tokio::test]
async fn test_python_with_input() {
    if !has_tools(&["python3"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("sum.py"), "Python", Some("3 4\n".to_owned()))
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "7\n");
    assert!(leftovers(executor.root().path()).is_empty());
}

#[tokio::test]
async fn test_python_runtime_error_reports_traceback() {
    if !has_tools(&["python3"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("runtime_error.py"), "python3", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "");
    assert!(result.error.contains("Traceback"));
    assert!(result.error.contains("ValueError: boom"));
}

#[tokio::test]
async fn test_python_infinite_loop_times_out() {
    if !has_tools(&["python3"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code("while True:\n    pass\n", "python", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "");
    assert!(result.error.contains("Time limit exceeded"));
    assert!(leftovers(executor.root().path()).is_empty());
}

#[tokio::test]
async fn test_javascript_hello_via_alias() {
    if !has_tools(&["node"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("hello.js"), "JS", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "Hello, World!\n");
}

#[tokio::test]
async fn test_javascript_with_input() {
    if !has_tools(&["node"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("sum.js"), "javascript", Some("40 2".to_owned()))
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "42\n");
}

#[tokio::test]
async fn test_ruby_hello() {
    if !has_tools(&["ruby"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("hello.rb"), "ruby", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "Hello, World!\n");
}

#[tokio::test]
async fn test_php_hello() {
    if !has_tools(&["php"]) {
        return;
    }
    let (_dir, executor) = test_executor();

    let result = executor
        .execute_code(fixture_source("hello.php"), "php", None)
        .await
        .expect("Execution failed");

    assert_eq!(result.output, "Hello, World!\n");
    assert!(leftovers(executor.root().path()).is_empty());
}
