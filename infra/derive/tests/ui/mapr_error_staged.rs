use mapr_derive::mapr_error;
use std::borrow::Cow;

#[mapr_error]
pub enum StagedError {
    #[error("Leaf error{}: {message}", format_context(.context))]
    Leaf { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Stage {stage} failed{}: {source}", format_context(.context))]
    Stage { stage: &'static str, source: Box<StagedError>, context: Option<Cow<'static, str>> },
}

fn main() {
    let err = StagedError::Stage {
        stage: "settings",
        source: Box::new(StagedError::Leaf { message: "boom".into(), context: None }),
        context: None,
    };
    assert_eq!(err.kind(), "stage");
}
