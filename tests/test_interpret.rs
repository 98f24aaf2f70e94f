use nb2er::interpret::{InterpretError, Side, choose_key, interpret, merge_params};
use serde::Deserialize;

const INTERPRET_TESTS_FILE: &str = "tests/interpret_tests.toml";

#[derive(Deserialize, Debug)]
struct ParseTest {
    stmt: String,
    left: String,
    right: String,
    result: String,
    left_key: Option<String>,
    right_key: Option<String>,
}

#[derive(Deserialize, Debug)]
struct EmptyTest {
    stmt: String,
}

#[derive(Deserialize, Debug)]
struct InterpretTestData {
    tests: Vec<ParseTest>,
    empty: Vec<EmptyTest>,
}

fn load_tests() -> InterpretTestData {
    let test_file =
        std::fs::read_to_string(INTERPRET_TESTS_FILE).expect("Cannot open interpret test cases");
    toml::from_str(&test_file).expect("Cannot parse test cases defined in toml")
}

#[test]
fn test_should_interpret() {
    for test in load_tests().tests {
        println!("Testing interpretation for stmt: {}", test.stmt);
        let join = interpret(&test.stmt)
            .unwrap_or_else(|err| panic!("Interpretation failed: {}", err))
            .unwrap_or_else(|| panic!("Statement not recognized: {}", test.stmt));
        assert_eq!(join.left, test.left);
        assert_eq!(join.right, test.right);
        assert_eq!(join.result, test.result);
        assert_eq!(join.left_key, test.left_key);
        assert_eq!(join.right_key, test.right_key);
    }
}

#[test]
fn test_should_skip() {
    for test in load_tests().empty {
        println!("Testing skip for stmt: {}", test.stmt);
        let join = interpret(&test.stmt)
            .unwrap_or_else(|err| panic!("Interpretation failed: {}", err));
        assert!(join.is_none());
    }
}

#[test]
fn test_malformed_statement_without_result() {
    let stmts = [
        // confirmed pd.merge invocation, no `result =` assignment
        "pd.merge(table_a, table_b, on='num_contrat')",
        // pd.merge mentioned but never invoked with arguments
        "run(pd.merge)",
    ];
    for stmt in stmts {
        println!("Testing malformed stmt: {}", stmt);
        let err = interpret(stmt).unwrap_err();
        match err {
            InterpretError::MalformedStatement {
                cell,
                stmt: err_stmt,
            } => {
                assert!(cell.is_none());
                assert_eq!(err_stmt, stmt);
            }
        }
    }
}

#[test]
fn test_choose_key_left_right_asymmetry() {
    let params = merge_params(
        "policies_and_companies = pd.merge(policies, companies, left_on='SIREN', right_index=True)",
    )
    .unwrap();
    // captured values keep their quote characters
    assert_eq!(choose_key(&params, Side::Left), Some("'SIREN'"));
    assert_eq!(choose_key(&params, Side::Right), None);

    let params = merge_params("j = pd.merge(a, b, left_on='x', on='shared')").unwrap();
    assert_eq!(choose_key(&params, Side::Left), Some("'x'"));
    assert_eq!(choose_key(&params, Side::Right), Some("'shared'"));
}
