use mapr_parsing::{DocumentNavigator, NavigatorOptions, ParsingError, Properties};

const CONFIG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE configuration PUBLIC "-//mapr//DTD Config 1.0//EN" "https://mapr.rs/dtd/mapr-config.dtd">
<configuration>
  <!-- inline defaults -->
  <properties>
    <property name="driver" value="app::Driver"/>
    <property name="url" value="jdbc:postgres://${host}/app"/>
  </properties>
  <environments default="development">
    <environment id="development">
      <transactionManager type="JDBC"/>
      <dataSource type="POOLED">
        <property name="url" value="${url}"/>
        <property name="poolMaximumActiveConnections" value="${max}"/>
      </dataSource>
    </environment>
  </environments>
  <mappers>
    <mapper resource="mappers/Blog.xml"/>
  </mappers>
</configuration>"#;

fn vars(entries: &[(&str, &str)]) -> Properties {
    entries.iter().copied().collect()
}

fn navigator(validation: bool) -> DocumentNavigator {
    DocumentNavigator::parse(CONFIG, NavigatorOptions::default().validation(validation))
        .expect("configuration parses")
}

#[test]
fn validates_against_the_bundled_grammar() {
    let nav = navigator(true);
    assert!(nav.eval_boolean("/configuration/mappers/mapper").unwrap());
}

#[test]
fn legacy_doctype_is_accepted() {
    let legacy = CONFIG.replace(
        r#"PUBLIC "-//mapr//DTD Config 1.0//EN" "https://mapr.rs/dtd/mapr-config.dtd""#,
        r#"PUBLIC "-//mybatis.org//DTD Config 3.0//EN" "http://mybatis.org/dtd/mybatis-3-config.dtd""#,
    );
    DocumentNavigator::parse(&legacy, NavigatorOptions::default().validation(true))
        .expect("legacy identifiers resolve to the bundled grammar");
}

#[test]
fn unknown_grammar_is_never_fetched() {
    let foreign = CONFIG.replace(
        r#"PUBLIC "-//mapr//DTD Config 1.0//EN" "https://mapr.rs/dtd/mapr-config.dtd""#,
        r#"SYSTEM "http://localhost:1/other.dtd""#,
    );
    let err = DocumentNavigator::parse(&foreign, NavigatorOptions::default().validation(true))
        .expect_err("grammar is not bundled");
    assert!(matches!(err, ParsingError::Entity { .. }));

    // Without validation the declaration is irrelevant.
    DocumentNavigator::parse(&foreign, NavigatorOptions::default()).expect("parses unvalidated");
}

#[test]
fn missing_required_attribute_fails_validation() {
    let broken = CONFIG.replace(r#"<mapper resource="mappers/Blog.xml"/>"#, "<plugins/>");
    let err = DocumentNavigator::parse(&broken, NavigatorOptions::default().validation(true))
        .expect_err("plugins is not allowed inside mappers");
    assert_eq!(err.kind(), "validation");
}

#[test]
fn children_as_properties_projects_name_value_pairs() {
    let nav = navigator(false);
    let props = nav
        .eval_node("/configuration/properties")
        .unwrap()
        .expect("properties section")
        .children_as_properties();
    assert_eq!(props.len(), 2);
    assert_eq!(props.get("driver"), Some("app::Driver"));
    assert_eq!(props.get("url"), Some("jdbc:postgres://${host}/app"));
}

#[test]
fn children_as_properties_skips_incomplete_entries() {
    let nav = DocumentNavigator::parse(
        r#"<properties><property name="a" value="1"/><property name="b"/><property value="2"/></properties>"#,
        NavigatorOptions::default(),
    )
    .unwrap();
    let props = nav.root().expect("root").children_as_properties();
    assert_eq!(props.sorted(), vec![("a", "1")]);
}

#[test]
fn nodes_keep_the_table_they_were_created_with() {
    let nav = navigator(false);
    nav.set_variables(vars(&[("url", "jdbc:h2:mem"), ("max", "8")]));
    let data_source = nav
        .eval_node("/configuration/environments/environment/dataSource")
        .unwrap()
        .expect("data source");

    nav.set_variables(vars(&[("url", "jdbc:other"), ("max", "16")]));

    let props = data_source.children_as_properties();
    assert_eq!(props.get("url"), Some("jdbc:h2:mem"));
    assert_eq!(props.get("poolMaximumActiveConnections"), Some("8"));

    // Queries issued from the node see the navigator's current table.
    assert_eq!(data_source.eval_int("property[2]/@value").unwrap(), 16);
    let fresh = data_source.eval_nodes("property").unwrap();
    assert_eq!(fresh[0].string_attribute("value").as_deref(), Some("jdbc:other"));
}

#[test]
fn diagnostic_path_names_identifying_attributes() {
    let nav = navigator(false);
    let ds = nav.eval_node("//dataSource").unwrap().expect("data source");
    assert_eq!(ds.path(), r#"configuration/environments/environment[@id="development"]/dataSource"#);
    assert_eq!(ds.parent().map(|p| p.name().to_owned()).as_deref(), Some("environment"));
}

#[test]
fn typed_attributes() {
    let nav = DocumentNavigator::parse(
        r#"<setting enabled="true" timeout=" 30 " ratio="2.5" broken="yes"/>"#,
        NavigatorOptions::default(),
    )
    .unwrap();
    let node = nav.root().expect("root element");
    assert_eq!(node.bool_attribute("enabled").unwrap(), Some(true));
    assert_eq!(node.int_attribute("timeout").unwrap(), Some(30));
    assert_eq!(node.long_attribute("missing").unwrap(), None);
    assert_eq!(node.double_attribute("ratio").unwrap(), Some(2.5));
    assert_eq!(node.string_attribute_or("missing", "fallback"), "fallback");
    assert!(matches!(node.bool_attribute("broken"), Err(ParsingError::Value { .. })));
}

#[test]
fn body_text_is_substituted_and_whitespace_preserved() {
    let nav = DocumentNavigator::parse(
        "<sql>  select * from ${table}  </sql>",
        NavigatorOptions::default().variables(vars(&[("table", "blog")])),
    )
    .unwrap();
    assert_eq!(nav.root().and_then(|n| n.body()).as_deref(), Some("  select * from blog  "));
    assert_eq!(nav.eval_string("/sql/text()").unwrap(), "  select * from blog  ");
}

#[test]
fn malformed_expressions_are_reported() {
    let nav = navigator(false);
    assert!(matches!(nav.eval_string("/configuration/["), Err(ParsingError::Expression { .. })));
}
