use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn grade_json(dir: &TempDir, args: &[&str]) -> Value {
    let mut cmd = cargo_bin_cmd!("nutri-grade");
    let output = cmd
        .current_dir(dir.path())
        .arg("grade")
        .args(args)
        .arg("--json")
        .output()
        .expect("run grade");

    assert!(output.status.success(), "grade failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("valid json")
}

async fn mount_product(server: &MockServer, id: &str, categories: &[&str], values: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/products/{}/categories", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "categories": categories
                .iter()
                .map(|name| serde_json::json!({"name": name}))
                .collect::<Vec<_>>()
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/products/{}/composition", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nutritionalValues": [{"values": values}]
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn white_bread() -> Value {
    serde_json::json!({
        "energyKJ": {"amount": 1108.76},
        "protein": {"amount": 9.0},
        "sugars": {"amount": 0.0},
        "saturatedFats": {"amount": 0.5},
        "fiber": {"amount": 0.0},
        "salt": {"amount": 0.9}
    })
}

fn lookup_cmd(dir: &TempDir, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("nutri-grade");
    cmd.current_dir(dir.path())
        .env("NUTRI_GRADE__CATALOG__BASE_URL", server.uri())
        .env("NUTRI_GRADE__CACHE__BACKEND", "sqlite")
        .env("NUTRI_GRADE__CACHE__DB_PATH", dir.path().join("cache.sqlite"));
    cmd
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");

    let mut cmd = cargo_bin_cmd!("nutri-grade");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("revision = \"2022\""));
    assert!(content.contains("data_unavailable_ttl_secs = 604800"));

    let mut again = cargo_bin_cmd!("nutri-grade");
    again
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn grade_white_bread_is_c() {
    let dir = TempDir::new().expect("temp dir");
    let value = grade_json(
        &dir,
        &[
            "--energy", "1108.76", "--sugars", "0", "--saturated-fats", "0.5",
            "--proteins", "9", "--salt", "0.9", "--fiber", "0",
        ],
    );

    assert_eq!(value["grade"], "C");
    assert_eq!(value["revision"], "2022");
    assert_eq!(value["assessment"]["status"], "graded");
}

#[test]
fn grade_cheese_by_category_name() {
    let dir = TempDir::new().expect("temp dir");
    let value = grade_json(
        &dir,
        &[
            "--energy", "1671", "--saturated-fats", "20", "--proteins", "32",
            "--salt", "1.5", "--fiber", "0", "--category", "Mléčné a chlazené",
            "--category", "Tvrdé sýry",
        ],
    );

    assert_eq!(value["grade"], "D");
    assert_eq!(value["flags"]["is_cheese"], true);
    assert_eq!(value["assessment"]["formula"], "cheese");
}

#[test]
fn grade_without_energy_has_no_grade() {
    let dir = TempDir::new().expect("temp dir");
    let value = grade_json(&dir, &["--sugars", "3", "--proteins", "5"]);

    assert_eq!(value["grade"], Value::Null);
    assert_eq!(value["reason"], "data_unavailable");
}

#[test]
fn grade_alcoholic_flag_is_not_applicable() {
    let dir = TempDir::new().expect("temp dir");
    let value = grade_json(&dir, &["--energy", "300", "--flag", "alcoholic"]);

    assert_eq!(value["grade"], Value::Null);
    assert_eq!(value["reason"], "not_applicable");
    assert_eq!(value["assessment"]["exclusion"], "alcoholic");
}

#[test]
fn grade_reads_profile_from_stdin() {
    let dir = TempDir::new().expect("temp dir");

    let mut cmd = cargo_bin_cmd!("nutri-grade");
    let output = cmd
        .current_dir(dir.path())
        .args(["grade", "--file", "-", "--json"])
        .write_stdin(
            r#"{"energy": 2251, "sugars": 55, "saturated_fats": 19, "proteins": 6.5, "salt": 0.28, "fiber": 2.3}"#,
        )
        .output()
        .expect("run grade");

    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["grade"], "E");
}

#[test]
fn grade_explain_prints_breakdown() {
    let dir = TempDir::new().expect("temp dir");

    let mut cmd = cargo_bin_cmd!("nutri-grade");
    cmd.current_dir(dir.path())
        .args([
            "grade", "--energy", "96.232", "--sugars", "0.4", "--saturated-fats", "0.1",
            "--proteins", "2.9", "--salt", "0.1", "--fiber", "2.2", "--explain",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Grade: A"))
        .stdout(predicate::str::contains("Negative points"));
}

#[test]
fn grade_rejects_unknown_revision() {
    let dir = TempDir::new().expect("temp dir");

    let mut cmd = cargo_bin_cmd!("nutri-grade");
    cmd.current_dir(dir.path())
        .args(["grade", "--energy", "100", "--revision", "2030"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown revision"));
}

#[test]
fn rules_validate_fails_on_duplicate_rules() {
    let dir = TempDir::new().expect("temp dir");
    let rules_path = dir.path().join("rules.toml");
    fs::write(
        &rules_path,
        "[[rule]]\nkeyword = \"sýr\"\nflag = \"cheese\"\n\n[[rule]]\nkeyword = \"SÝR\"\nflag = \"cheese\"\n",
    )
    .expect("write rules");

    let mut cmd = cargo_bin_cmd!("nutri-grade");
    cmd.current_dir(dir.path())
        .args(["rules", "validate", "--rules"])
        .arg(&rules_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn rules_dump_validates() {
    let dir = TempDir::new().expect("temp dir");
    let rules_path = dir.path().join("rules.toml");

    let mut dump = cargo_bin_cmd!("nutri-grade");
    let output = dump
        .current_dir(dir.path())
        .args(["rules", "list", "--toml"])
        .output()
        .expect("run rules list");
    assert!(output.status.success());
    fs::write(&rules_path, &output.stdout).expect("write rules");

    let mut cmd = cargo_bin_cmd!("nutri-grade");
    cmd.current_dir(dir.path())
        .args(["rules", "validate", "--rules"])
        .arg(&rules_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation passed (11 rules)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn lookup_grades_then_serves_from_cache() {
    let dir = TempDir::new().expect("temp dir");
    let server = MockServer::start().await;
    // each endpoint is hit once; the second run is a cache hit
    mount_product(&server, "1234", &["Pekárna", "Chléb"], white_bread()).await;

    let badges = dir.path().join("badges.jsonl");
    let first = lookup_cmd(&dir, &server)
        .args(["lookup", "1234", "--json", "--badges"])
        .arg(&badges)
        .output()
        .expect("run lookup");
    assert!(first.status.success(), "lookup failed: {:?}", first);

    let value: Value = serde_json::from_slice(&first.stdout).expect("valid json");
    assert_eq!(value["backend"], "sqlite");
    assert_eq!(value["results"][0]["grade"], "C");
    assert_eq!(value["results"][0]["cached"], false);

    let badge_line = fs::read_to_string(&badges).expect("read badges");
    let badge: Value = serde_json::from_str(badge_line.trim()).expect("badge json");
    assert_eq!(badge["product_id"], "1234");
    assert_eq!(badge["grade"], "C");

    let second = lookup_cmd(&dir, &server)
        .args(["lookup", "1234", "--json"])
        .output()
        .expect("run lookup");
    let value: Value = serde_json::from_slice(&second.stdout).expect("valid json");
    assert_eq!(value["results"][0]["grade"], "C");
    assert_eq!(value["results"][0]["cached"], true);

    let stats = lookup_cmd(&dir, &server)
        .args(["cache", "stats", "--json"])
        .output()
        .expect("run cache stats");
    let value: Value = serde_json::from_slice(&stats.stdout).expect("valid json");
    assert_eq!(value["entries"], 1);
    assert_eq!(value["namespace"], "nutri_scores_v3_nutri_2022");

    let entry = lookup_cmd(&dir, &server)
        .args(["cache", "get", "1234", "--json"])
        .output()
        .expect("run cache get");
    let value: Value = serde_json::from_slice(&entry.stdout).expect("valid json");
    assert_eq!(value["entry"]["grade"], "C");
}

#[tokio::test(flavor = "multi_thread")]
async fn lookup_alcohol_skips_nutrition_and_keeps_order() {
    let dir = TempDir::new().expect("temp dir");
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products/7/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "categories": [{"name": "Nápoje"}, {"name": "Červené víno"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/products/7/composition"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_product(&server, "8", &["Pečivo"], white_bread()).await;

    let output = lookup_cmd(&dir, &server)
        .args(["lookup", "7", "8", "--json"])
        .output()
        .expect("run lookup");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["results"][0]["product_id"], "7");
    assert_eq!(value["results"][0]["grade"], Value::Null);
    assert_eq!(value["results"][0]["reason"], "not_applicable");
    assert_eq!(value["results"][1]["product_id"], "8");
    assert_eq!(value["results"][1]["grade"], "C");
}

#[tokio::test(flavor = "multi_thread")]
async fn lookup_catalog_failure_is_data_unavailable() {
    let dir = TempDir::new().expect("temp dir");
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products/9/categories"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let output = lookup_cmd(&dir, &server)
        .env("NUTRI_GRADE__CACHE__BACKEND", "memory")
        .args(["lookup", "9", "--json"])
        .output()
        .expect("run lookup");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["backend"], "memory");
    assert_eq!(value["results"][0]["grade"], Value::Null);
    assert_eq!(value["results"][0]["reason"], "data_unavailable");
}

#[test]
fn lookup_offline_catalog_file() {
    let dir = TempDir::new().expect("temp dir");
    let catalog = dir.path().join("catalog.json");
    fs::write(
        &catalog,
        r#"{
            "1234": {
                "categories": ["Pekárna", "Chléb"],
                "nutrition": {"energy": 1108.76, "sugars": 0, "saturated_fats": 0.5,
                              "proteins": 9, "fiber": 0, "salt": 0.9}
            },
            "7": {"categories": ["Červené víno"]}
        }"#,
    )
    .expect("write catalog");

    let mut cmd = cargo_bin_cmd!("nutri-grade");
    let output = cmd
        .current_dir(dir.path())
        .env("NUTRI_GRADE__CATALOG__BASE_URL", "http://127.0.0.1:9")
        .env("NUTRI_GRADE__CACHE__BACKEND", "memory")
        .args(["lookup", "1234", "7", "404", "--json", "--catalog-file"])
        .arg(&catalog)
        .output()
        .expect("run lookup");
    assert!(output.status.success(), "lookup failed: {:?}", output);

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["results"][0]["grade"], "C");
    assert_eq!(value["results"][1]["reason"], "not_applicable");
    assert_eq!(value["results"][2]["reason"], "data_unavailable");
}

#[test]
fn lookup_missing_catalog_file_fails() {
    let dir = TempDir::new().expect("temp dir");

    let mut cmd = cargo_bin_cmd!("nutri-grade");
    cmd.current_dir(dir.path())
        .env("NUTRI_GRADE__CACHE__BACKEND", "memory")
        .args(["lookup", "1", "--catalog-file", "absent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load catalog file"));
}

#[test]
fn doctor_reports_json() {
    let dir = TempDir::new().expect("temp dir");

    let mut cmd = cargo_bin_cmd!("nutri-grade");
    let output = cmd
        .current_dir(dir.path())
        .env("NUTRI_GRADE__CACHE__BACKEND", "kv")
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");

    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["config"]["status"], "ok");
    assert_eq!(value["cache"]["details"]["backend"], "kv");
    assert_eq!(value["overall"], "ok");
}
