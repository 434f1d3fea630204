use mapr_derive::mapr_error;
use std::borrow::Cow;

#[mapr_error]
pub enum ProbeError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Missing entry{}: {message}", format_context(.context))]
    MissingEntry { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn open_missing() -> Result<String, ProbeError> {
    Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")).context("opening probe.xml")
}

#[test]
fn mapr_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/mapr_error_pass.rs");
    t.pass("tests/ui/mapr_error_staged.rs");
}

#[test]
fn source_context_is_rendered() {
    let err = open_missing().expect_err("io error expected");
    assert_eq!(err.kind(), "io");
    assert_eq!(err.to_string(), "IO error (opening probe.xml): gone");
}

#[test]
fn context_overrides_on_own_result() {
    let res: Result<(), ProbeError> =
        Err(ProbeError::MissingEntry { message: "alias".into(), context: None });
    let err = res.context("typeAliases").expect_err("error expected");
    assert_eq!(err.kind(), "missing_entry");
    assert_eq!(err.to_string(), "Missing entry (typeAliases): alias");
}

#[test]
fn internal_from_str() {
    let err: ProbeError = "unexpected".into();
    assert!(matches!(err, ProbeError::Internal { .. }));
    assert_eq!(err.to_string(), "Internal error: unexpected");
}
