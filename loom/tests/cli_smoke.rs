use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use loom_ir::{Expr, ForKind, Stmt};
use tempfile::TempDir;

fn loom(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_loom"))
        .args(args)
        .current_dir(cwd)
        .env_remove("LOOM_LOG")
        .output()
        .expect("spawn loom")
}

fn write_json<T: serde::Serialize>(dir: &Path, name: &str, value: &T) -> String {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string(value).expect("encode tree")).expect("write input");
    path.to_str().expect("temp path must be UTF-8").to_string()
}

fn stdout(out: &Output) -> String {
    assert!(
        out.status.success(),
        "loom failed: {:?}\n--- stdout ---\n{}\n--- stderr ---\n{}\n",
        out.status,
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn simplify_reads_facts_from_loom_toml() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("loom.toml"), "[bounds.x]\nmin = 0\nmax = 5\n").unwrap();
    let input = write_json(dir.path(), "goal.json", &Expr::lt(Expr::var("x"), Expr::int(10)));

    let text = stdout(&loom(&["simplify", &input], dir.path()));
    assert_eq!(text.trim(), "true");
}

#[test]
fn json_report_carries_the_tree() {
    let dir = TempDir::new().unwrap();
    let input = write_json(dir.path(), "arith.json", &Expr::add(Expr::int(2), Expr::mul(Expr::int(3), Expr::int(4))));

    let text = stdout(&loom(&["simplify", "--json", &input], dir.path()));
    let v: serde_json::Value = serde_json::from_str(&text).expect("report must be JSON");
    assert_eq!(v["schema"], "loom.simplify.v1");
    let first = &v["inputs"][0];
    assert_eq!(first["changed"], true);
    assert_eq!(first["text"], "14");
    let out: Expr = serde_json::from_value(first["output"].clone()).unwrap();
    assert_eq!(out, Expr::int(14));
}

#[test]
fn keep_dead_lets_overrides_the_config() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("loom.toml"), "[simplify]\nremove_dead_lets = true\n").unwrap();
    let e = Expr::let_in("t", Expr::int(5), Expr::int(3));
    let input = write_json(dir.path(), "dead.json", &e);

    let v: serde_json::Value =
        serde_json::from_str(&stdout(&loom(&["simplify", "--json", "--keep-dead-lets", &input], dir.path()))).unwrap();
    let out: Expr = serde_json::from_value(v["inputs"][0]["output"].clone()).unwrap();
    assert_eq!(out, e);

    let v: serde_json::Value = serde_json::from_str(&stdout(&loom(&["simplify", "--json", &input], dir.path()))).unwrap();
    let out: Expr = serde_json::from_value(v["inputs"][0]["output"].clone()).unwrap();
    assert_eq!(out, Expr::int(3));
}

#[test]
fn many_inputs_keep_their_order() {
    let dir = TempDir::new().unwrap();
    let mut inputs = Vec::new();
    for k in 0..6i64 {
        inputs.push(write_json(dir.path(), &format!("in{k}.json"), &Expr::add(Expr::int(k), Expr::int(1))));
    }
    let body = Stmt::store("buf", Expr::var("i"), Expr::mul(Expr::var("i"), Expr::int(0)));
    inputs.push(write_json(
        dir.path(),
        "loop.json",
        &Stmt::for_loop("i", Expr::int(0), Expr::int(4), ForKind::Serial, body),
    ));

    let mut args = vec!["simplify", "--json"];
    args.extend(inputs.iter().map(String::as_str));
    let v: serde_json::Value = serde_json::from_str(&stdout(&loom(&args, dir.path()))).unwrap();
    let reports = v["inputs"].as_array().unwrap();
    assert_eq!(reports.len(), 7);
    for (k, r) in reports.iter().take(6).enumerate() {
        assert_eq!(r["text"], (k + 1).to_string());
    }
    assert_eq!(reports[6]["kind"], "stmt");
}

#[test]
fn prove_exit_status_reflects_the_result() {
    let dir = TempDir::new().unwrap();
    let cfg = dir.path().join("facts.toml");
    fs::write(&cfg, "[alignment.x]\nmodulus = 4\nremainder = 2\n").unwrap();
    let goal = Expr::eq(Expr::rem(Expr::var("x"), Expr::int(2)), Expr::int(0));
    let input = write_json(dir.path(), "even.json", &goal);
    let cfg = cfg.to_str().unwrap();

    let text = stdout(&loom(&["prove", "--config", cfg, "--json", &input], dir.path()));
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["proved"], true);

    let out = loom(&["prove", &input], dir.path());
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("could not prove"));
}

#[test]
fn bad_config_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("loom.toml"), "[bounds.x]\nmin = 3\nmax = 1\n").unwrap();
    let input = write_json(dir.path(), "x.json", &Expr::var("x"));

    let out = loom(&["simplify", &input], dir.path());
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("config error"));
}

#[test]
fn exprs_only_rejects_expression_inputs() {
    let dir = TempDir::new().unwrap();
    let input = write_json(dir.path(), "sum.json", &Expr::add(Expr::int(1), Expr::int(2)));

    let out = loom(&["simplify", "--exprs-only", &input], dir.path());
    assert!(!out.status.success());
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("input error"), "{err}");
    assert!(err.contains("--exprs-only"), "{err}");

    let body = Stmt::store("buf", Expr::int(0), Expr::add(Expr::int(1), Expr::int(2)));
    let input = write_json(dir.path(), "store.json", &body);
    let text = stdout(&loom(&["simplify", "--exprs-only", &input], dir.path()));
    assert!(text.contains('3'), "{text}");
}

#[test]
fn self_test_reports_every_check() {
    let dir = TempDir::new().unwrap();
    let v: serde_json::Value = serde_json::from_str(&stdout(&loom(&["self-test", "--json"], dir.path()))).unwrap();
    assert_eq!(v["schema"], "loom.self-test.v1");
    assert_eq!(v["passed"], v["total"]);
}
