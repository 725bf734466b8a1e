//! End-to-end policy cases for the analyzer.
//!
//! Each table runs every snippet both as written and, where noted, wrapped
//! in `eval(...)`.

use jsguard_analyzer::{
    analyze, AnalyzeError, Analyzer, AnalyzerOptions, DenyList, Verdict, UNKNOWN_MODULE,
};

const RMDIR: &str = ".rmdir('../', { recursive: true }, () => { /**/ })";

/// Wrap `code` in an `eval` call using double quotes inside single quotes.
fn wrap_in_eval(code: &str) -> String {
    format!("eval('{}')", code.replace('\'', "\""))
}

fn forbidden(code: &str) -> Vec<String> {
    match analyze(code).unwrap() {
        Verdict::ForbiddenImports(names) => names,
        other => panic!("expected forbidden imports for {code:?}, got {other:?}"),
    }
}

// --- ANALYZE-01: forbidden requires ---

#[test]
fn analyze_01_forbidden_requires_are_reported() {
    let cases = [
        ("require('fs')", "fs"),
        ("require('fs/promises')", "fs/promises"),
        ("require('node:fs')", "node:fs"),
        ("require('node:fs/promises')", "node:fs/promises"),
        ("require('f' + 's')", "fs"),
        ("require('p' + 'at' + 'h')", "path"),
        ("let x = 'fs'; require(x)", "fs"),
        ("let x = 'f'; let y = 's'; require(x+y)", "fs"),
        ("let f = () => 'fs'; require(f())", UNKNOWN_MODULE),
        ("let x = { y : require }; x.y('fs')", "fs"),
        ("let x = { y : require }; x['y']('fs')", "fs"),
        ("let x = require; x('fs')", "fs"),
        ("require('FS'.toLowerCase())", UNKNOWN_MODULE),
    ];

    for (code, module) in cases {
        let code = format!("{code}{RMDIR}");
        assert_eq!(forbidden(&code), vec![module], "direct: {code}");
        let wrapped = wrap_in_eval(&code);
        assert_eq!(forbidden(&wrapped), vec![module], "wrapped: {wrapped}");
    }
}

#[test]
fn analyze_02_every_denied_spelling() {
    for base in jsguard_analyzer::BASE_DENIED_MODULES {
        for name in [
            base.to_string(),
            format!("{base}/promises"),
            format!("node:{base}"),
            format!("node:{base}/promises"),
        ] {
            assert_eq!(forbidden(&format!("require('{name}')")), vec![name]);
        }
    }
}

#[test]
fn analyze_03_case_sensitive_and_exact() {
    assert_eq!(analyze("require('FS')").unwrap(), Verdict::Clean);
    assert_eq!(analyze("require('fs/')").unwrap(), Verdict::Clean);
    assert_eq!(analyze("require('lodash')").unwrap(), Verdict::Clean);
}

#[test]
fn analyze_04_all_names_in_discovery_order() {
    assert_eq!(
        forbidden("require('os'); eval(\"require('net')\"); require('fs');"),
        vec!["os", "fs", "net"]
    );
}

#[test]
fn analyze_05_call_argument_is_unknown() {
    assert_eq!(forbidden("require(getName())"), vec![UNKNOWN_MODULE]);
    assert_eq!(forbidden("eval(getCode())"), vec![UNKNOWN_MODULE]);
}

#[test]
fn analyze_06_dynamic_import() {
    assert_eq!(forbidden("import('node:child_process')"), vec!["node:child_process"]);
}

// --- ANALYZE-07: imports in every syntactic position ---

/// Places a snippet can hide in besides statements and plain expressions.
/// `$` is replaced by the snippet.
const POSITIONS: &[&str] = &[
    "function f(a = $) {} f();",
    "const g = (a = $) => 0; g();",
    "const h = function (...[a = $]) {};",
    "const { x = $ } = {};",
    "let [y = $] = [];",
    "let { [$]: z } = { fs: 1 };",
    "try { throw 1 } catch ({ e = $ }) {}",
    "try { throw 1 } catch ([e = $]) {}",
    "for (const { k = $ } of [{}]) {}",
    "let a; for ([a = $] of [[]]) {}",
    "let b; ({ b = $ } = {});",
    "let o = {}; [o[$]] = [1];",
    "let p = {}; p[$]++;",
    "class C { [$]() {} }",
    "class D { m(a = $) {} }",
    "class E { static [$] = 1; }",
    "class F { static { $; } }",
    "({ m(a = $) {} }).m();",
    "new (class extends Object { constructor(a = $) { super(); } })();",
];

#[test]
fn analyze_07_imports_in_every_position() {
    for position in POSITIONS {
        let code = position.replace('$', "require('fs')");
        assert!(forbidden(&code).contains(&"fs".to_string()), "{code}");
        let wrapped = wrap_in_eval(&code);
        assert!(forbidden(&wrapped).contains(&"fs".to_string()), "{wrapped}");
    }
}

#[test]
fn analyze_08_loops_in_every_position() {
    for position in POSITIONS {
        let code = position.replace('$', "(() => { while (true) {} })()");
        assert_eq!(analyze(&code).unwrap(), Verdict::NonTerminatingLoop, "{code}");
        let wrapped = wrap_in_eval(&code);
        assert_eq!(analyze(&wrapped).unwrap(), Verdict::NonTerminatingLoop, "{wrapped}");
    }
}

// --- ANALYZE-10: non-terminating loops ---

#[test]
fn analyze_10_infinite_whiles() {
    let cases = [
        "while (true) { }",
        "while (1) { }",
        "let x = true; while (x) { }",
        "let x = 1; while (x) { }",
        "let x = 1; let y = 1; while (x+y) { }",
        "while (1 > 0) { }",
        "while (next()) { }",
        "do { } while (true)",
        "let x = y; while (x) { }",
        "while (x !== 1) { }",
    ];
    for code in cases {
        assert_eq!(analyze(code).unwrap(), Verdict::NonTerminatingLoop, "{code}");
        let wrapped = wrap_in_eval(code);
        assert_eq!(analyze(&wrapped).unwrap(), Verdict::NonTerminatingLoop, "{wrapped}");
    }
}

#[test]
fn analyze_11_infinite_fors() {
    let cases = [
        "for (;;) { }",
        "for (;true;) { }",
        "for (;1;) { }",
        "for (let i = 0; i < 1; i++) { }",
        "let x = true; for (;x;) { }",
        "let x = 1; for (;x;) { }",
        "let x = 1; let y = 1; for (;x+y;) { }",
    ];
    for code in cases {
        assert_eq!(analyze(code).unwrap(), Verdict::NonTerminatingLoop, "{code}");
        let wrapped = wrap_in_eval(code);
        assert_eq!(analyze(&wrapped).unwrap(), Verdict::NonTerminatingLoop, "{wrapped}");
    }
}

#[test]
fn analyze_12_loops_take_precedence_over_imports() {
    assert_eq!(
        analyze("require('fs'); while (true) {}").unwrap(),
        Verdict::NonTerminatingLoop
    );
    assert_eq!(
        analyze("require('fs'); eval('for (;;) {}')").unwrap(),
        Verdict::NonTerminatingLoop
    );
}

// --- ANALYZE-20: clean snippets ---

#[test]
fn analyze_20_clean_snippets() {
    let cases = [
        "1 + 1",
        "'hello'.toUpperCase()",
        "[1, 2, 3].map(x => x * 2).join(',')",
        "let x = { y: 1 }; x.y",
        "require('lodash')",
        "while (false) { }",
        "for (let i = 5; i < 1; i++) { }",
        "for (const v of [1, 2]) { v }",
        "while (items.length) { items.pop() }",
        "eval('1 + 1')",
        "eval(42)",
        "Math.max(1, 2)",
        "",
    ];
    for code in cases {
        assert_eq!(analyze(code).unwrap(), Verdict::Clean, "{code:?}");
    }
}

// --- ANALYZE-30: syntax and limits ---

#[test]
fn analyze_30_syntax_errors() {
    assert!(matches!(analyze("let = ;").unwrap(), Verdict::SyntaxError(_)));
    assert!(matches!(analyze("while (true) {").unwrap(), Verdict::SyntaxError(_)));
    let Verdict::SyntaxError(msg) = analyze("eval('let = ;')").unwrap() else {
        panic!("expected a syntax error");
    };
    assert!(msg.starts_with("in eval'd string: "), "{msg}");
}

#[test]
fn analyze_31_eval_depth_limit() {
    let analyzer = Analyzer::new(AnalyzerOptions {
        max_eval_depth: 1,
        ..AnalyzerOptions::default()
    });
    assert_eq!(analyzer.analyze("eval('1')").unwrap(), Verdict::Clean);
    assert_eq!(
        analyzer.analyze("eval(\"eval('1')\")").unwrap(),
        Verdict::NonTerminatingLoop
    );
    assert_eq!(analyze("eval(\"eval('1')\")").unwrap(), Verdict::Clean);
}

#[test]
fn analyze_32_deep_nesting_is_an_error() {
    let code = format!("{}1{}", "(".repeat(300), ")".repeat(300));
    assert!(matches!(
        analyze(&code),
        Err(AnalyzeError::NestingTooDeep { .. })
    ));
}

#[test]
fn analyze_33_extra_denied_modules() {
    let analyzer = Analyzer::new(AnalyzerOptions {
        deny_list: DenyList::default().with_extra(["worker_threads"]),
        ..AnalyzerOptions::default()
    });
    assert_eq!(
        analyzer.analyze("require('worker_' + 'threads')").unwrap(),
        Verdict::ForbiddenImports(vec!["worker_threads".into()])
    );
    assert_eq!(analyze("require('worker_threads')").unwrap(), Verdict::Clean);
}
