use super::*;
use crate::node::parse_single_doc;

fn node(yaml: &str) -> Node {
    parse_single_doc(yaml).unwrap().unwrap()
}

fn conflict(key: &str) -> Conflict {
    Conflict::new(key, node("Type: String\nDefault: a\n"), node("Type: String\nDefault: b\n"))
}

#[test]
fn every_section_has_its_own_phrasing() {
    let messages: Vec<String> = Section::ALL
        .iter()
        .map(|section| classify(*section, conflict("Key")).to_string())
        .collect();

    assert_eq!(
        messages,
        [
            "metadata key \"Key\" already exists with a different definition",
            "parameter logical id \"Key\" already exists with a different definition",
            "mapping \"Key\" already exists with a different definition",
            "condition \"Key\" already exists with a different definition",
        ]
    );
}

#[test]
fn classify_keeps_the_payload() {
    let err = classify(Section::Parameters, conflict("Env"));

    assert_eq!(err.section, Section::Parameters);
    assert_eq!(err.key(), "Env");
    assert_eq!(err.first_yaml(), "Type: String\nDefault: a\n");
    assert_eq!(err.second_yaml(), "Type: String\nDefault: b\n");
}

#[test]
fn nested_conflicts_use_dotted_keys() {
    let nested = Conflict::new("WCU", node("5"), node("10")).nested_under("test");
    assert_eq!(nested.key, "test.WCU");
}

#[test]
fn human_error_shows_both_definitions() {
    // Conditions render the same way as every other section.
    let err = classify(Section::Conditions, conflict("IsProd"));

    let expected = "\
condition \"IsProd\" already exists with a different definition.
first definition:
    Type: String
    Default: a
second definition:
    Type: String
    Default: b
Make both definitions of condition \"IsProd\" identical, or rename one of them.";
    assert_eq!(err.human_error(), expected);
}

#[test]
fn missing_files_are_reported_together() {
    let err = AddonsError::MissingFiles {
        dir: PathBuf::from("addons"),
        missing: vec!["params.yaml".to_string(), "outputs.yaml".to_string()],
    };

    assert_eq!(
        err.to_string(),
        "addons directory addons is missing required files: params.yaml, outputs.yaml"
    );
}
