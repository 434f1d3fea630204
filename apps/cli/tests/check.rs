use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE configuration PUBLIC "-//mapr//DTD Config 1.0//EN" "https://mapr.rs/dtd/mapr-config.dtd">
<configuration>
  <properties resource="db.properties">
    <property name="user" value="inline"/>
  </properties>
  <settings>
    <setting name="defaultExecutorType" value="${executor}"/>
  </settings>
  <environments default="dev">
    <environment id="dev">
      <transactionManager type="JDBC"/>
      <dataSource type="POOLED">
        <property name="url" value="${url}"/>
        <property name="username" value="${user}"/>
      </dataSource>
    </environment>
    <environment id="test">
      <transactionManager type="MANAGED"/>
      <dataSource type="UNPOOLED">
        <property name="url" value="jdbc:h2:mem:test"/>
      </dataSource>
    </environment>
  </environments>
  <databaseIdProvider type="DB_VENDOR"/>
  <mappers>
    <mapper resource="mappers/Blog.xml"/>
  </mappers>
</configuration>"#;

const BLOG_MAPPER: &str = r#"<mapper namespace="blog">
  <select id="selectBlog">select * from blog where id = #{id}</select>
  <delete id="deleteBlog">delete from blog where id = #{id}</delete>
</mapper>"#;

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mapr.xml", CONFIG);
    write(dir.path(), "db.properties", "url=jdbc:postgresql://localhost/app\nexecutor=REUSE\n");
    write(dir.path(), "mappers/Blog.xml", BLOG_MAPPER);
    dir
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn json_output(dir: &TempDir, extra: &[&str]) -> Value {
    let output = cargo_bin_cmd!("mapr")
        .arg("check")
        .arg(dir.path().join("mapr.xml"))
        .arg("--json")
        .args(extra)
        .output()
        .unwrap();
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn prints_a_summary_of_the_default_environment() {
    let dir = fixture();
    cargo_bin_cmd!("mapr")
        .arg("check")
        .arg(dir.path().join("mapr.xml"))
        .assert()
        .success()
        .stdout(
            predicate::str::contains("environment: dev (POOLED)")
                .and(predicate::str::contains("database id: postgresql"))
                .and(predicate::str::contains("executor: REUSE"))
                .and(predicate::str::contains("blog.selectBlog"))
                .and(predicate::str::contains("mapped statements: 2")),
        );
}

#[test]
fn json_summary_for_a_selected_environment() {
    let dir = fixture();
    let report = json_output(&dir, &["--environment", "test"]);
    assert_eq!(report["ok"], true);
    assert_eq!(report["configuration"]["environment"], "test");
    assert_eq!(report["configuration"]["dataSource"]["kind"], "UNPOOLED");
    assert_eq!(report["configuration"]["databaseId"], "h2");
}

#[test]
fn caller_variables_follow_precedence() {
    let dir = fixture();
    write(dir.path(), "vars.toml", "user = \"from-file\"\nurl = \"jdbc:mysql://db/app\"\n");

    let output = cargo_bin_cmd!("mapr")
        .env("MAPR__USER", "from-env")
        .env("MAPR__EXECUTOR", "BATCH")
        .arg("check")
        .arg(dir.path().join("mapr.xml"))
        .arg("--vars-file")
        .arg(dir.path().join("vars.toml"))
        .args(["--var", "url=jdbc:postgresql://override/app", "--json"])
        .output()
        .unwrap();
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    let configuration = &report["configuration"];

    assert_eq!(configuration["dataSource"]["username"], "from-file");
    assert_eq!(configuration["dataSource"]["url"], "jdbc:postgresql://override/app");
    assert_eq!(configuration["settings"]["defaultExecutorType"], "BATCH");
}

#[test]
fn unknown_environment_fails_with_the_stage() {
    let dir = fixture();
    cargo_bin_cmd!("mapr")
        .arg("check")
        .arg(dir.path().join("mapr.xml"))
        .args(["-e", "prod"])
        .assert()
        .failure()
        .code(1)
        .stderr(
            predicate::str::contains("error: Error building configuration at environments")
                .and(predicate::str::contains("Environment \"prod\" is not declared.")),
        );
}

#[test]
fn json_failure_report() {
    let dir = fixture();
    write(
        dir.path(),
        "mapr.xml",
        &CONFIG.replace("<settings>", "<settings>\n    <setting name=\"bogusSetting\" value=\"1\"/>"),
    );
    let report = json_output(&dir, &[]);
    assert_eq!(report["ok"], false);
    assert_eq!(report["error"]["kind"], "unknown_setting");
    assert_eq!(report["error"]["stage"], "settingsKeys");
}

#[test]
fn documents_without_doctype_need_no_validate() {
    let dir = fixture();
    let plain = CONFIG.lines().filter(|line| !line.starts_with("<!DOCTYPE")).collect::<Vec<_>>().join("\n");
    write(dir.path(), "mapr.xml", &plain);

    cargo_bin_cmd!("mapr").arg("check").arg(dir.path().join("mapr.xml")).assert().failure();
    cargo_bin_cmd!("mapr")
        .arg("check")
        .arg(dir.path().join("mapr.xml"))
        .arg("--no-validate")
        .assert()
        .success();
}

#[test]
fn missing_document_is_reported() {
    cargo_bin_cmd!("mapr")
        .args(["check", "does-not-exist.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open does-not-exist.xml"));
}
