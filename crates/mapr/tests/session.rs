use mapr::SessionFactoryBuilder;
use mapr::config::{Component, ComponentKind, Stage, TypeDescriptor, TypeRegistry};
use mapr::parsing::Properties;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const CONFIG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE configuration PUBLIC "-//mapr//DTD Config 1.0//EN" "https://mapr.rs/dtd/mapr-config.dtd">
<configuration>
  <properties resource="db.properties"/>
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
    <mapper class="app::mappers::BlogMapper"/>
  </mappers>
</configuration>"#;

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("db.properties"), "url=jdbc:postgresql://localhost/app\nuser=app\n").unwrap();
    dir
}

fn builder(dir: &TempDir) -> SessionFactoryBuilder {
    let mut types = TypeRegistry::default();
    types.register(TypeDescriptor::new("app::mappers::BlogMapper", Component::Named(ComponentKind::Mapper)));
    SessionFactoryBuilder::new().types(Arc::new(types)).base_dir(dir.path())
}

#[test]
fn builds_a_shared_factory() {
    let dir = fixture();
    let factory = builder(&dir).build(CONFIG.as_bytes(), None, None).unwrap();

    let configuration = factory.configuration();
    let data_source = configuration.environment().unwrap().data_source();
    assert_eq!(data_source.url.as_deref(), Some("jdbc:postgresql://localhost/app"));
    assert_eq!(data_source.username.as_deref(), Some("app"));
    assert_eq!(configuration.database_id(), Some("postgresql"));
    assert!(configuration.mapper_registry().has_mapper("app::mappers::BlogMapper"));

    let shared = factory.shared();
    let handle = thread::spawn(move || shared.environment().map(|env| env.id().to_owned()));
    assert_eq!(handle.join().unwrap().as_deref(), Some("dev"));
}

#[test]
fn environment_and_variables_are_forwarded() {
    let dir = fixture();
    let vars: Properties = [("user", "override")].into_iter().collect();
    let factory = builder(&dir).build(CONFIG.as_bytes(), Some("test"), Some(vars)).unwrap();
    let configuration = factory.configuration();
    assert_eq!(configuration.environment().unwrap().id(), "test");
    assert_eq!(configuration.database_id(), Some("h2"));
    assert_eq!(configuration.variables().get("user"), Some("override"));
}

#[test]
fn failures_name_the_stage() {
    let dir = fixture();
    let err = builder(&dir).build(CONFIG.as_bytes(), Some("prod"), None).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Environments));
}
