use std::{fs, path::Path};

use super::*;
use crate::node::{parse_yaml_str, Node};

macro_rules! testlist {
    ($($name:ident,)*) => {
    $(
        #[test]
        fn $name() {
            run_test(stringify!($name))
        }
    )*
    }
}

testlist! {
    condition_conflict,
    disjoint_parameters,
    identical_with_different_quotes,
    mapping_inner_conflict,
    mappings_two_level_union,
    metadata_type_conflict,
    parameter_conflict,
    section_order_is_fixed,
}

// Each test file is a stream of fragments, merged in document order.
fn run_test(name: &str) {
    let rootdir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let test_data_dir = rootdir.join("src/merge/tests/testdata");

    let test_file = test_data_dir.join(format!("tests/{}.yaml", name));
    let expected_file = test_data_dir.join(format!("expected/{}.txt", name));
    let actual_dir = test_data_dir.join("actual");
    let actual_file = actual_dir.join(format!("{}.txt", name));

    let test = fs::read_to_string(test_file).unwrap();
    let fragments = parse_yaml_str(&test)
        .unwrap()
        .into_iter()
        .map(|doc| TemplateFragment::from_node(doc).unwrap());

    let result = merge_all(fragments);
    let actual = format_result(result);

    fs::create_dir_all(actual_dir).unwrap();
    fs::write(actual_file, &actual).unwrap();

    let expected = fs::read_to_string(expected_file).unwrap();
    assert_eq!(expected, actual);
}

fn format_result(result: Result<TemplateFragment, ConflictError>) -> String {
    let mut string = String::new();

    string.push_str("ERROR: ");
    let template = match result {
        Ok(template) => template,
        Err(err) => {
            string.push_str(&err.human_error());
            string.push('\n');
            return string;
        }
    };

    string.push_str("<None>\n");
    string.push_str("OUTPUT:\n");
    string.push_str(&template.emit());

    string
}

fn fragment(yaml: &str) -> TemplateFragment {
    TemplateFragment::parse(yaml).unwrap()
}

fn keys(mapping: Option<&Mapping>) -> Vec<&str> {
    mapping.unwrap().keys().collect()
}

#[test]
fn merging_identical_fragment_is_a_no_op() {
    let yaml = r#"
Metadata:
  Owner: payments
Parameters:
  Env:
    Type: String
    AllowedValues: [test, prod]
Mappings:
  ScalingMap:
    test: {WCU: 5, RCU: 5}
Conditions:
  IsProd: !Equals [!Ref Env, prod]
"#;
    let mut accumulator = fragment(yaml);
    let before = accumulator.to_node();

    merge(&mut accumulator, fragment(yaml)).unwrap();

    assert!(accumulator.to_node().is_equal(&before));
}

#[test]
fn disjoint_keys_are_unioned_in_order() {
    let mut accumulator = fragment("Parameters:\n  B:\n    Type: String\n  A:\n    Type: String\n");
    merge(
        &mut accumulator,
        fragment("Parameters:\n  D:\n    Type: Number\n  C:\n    Type: String\n"),
    )
    .unwrap();

    let parameters = accumulator.parameters.as_ref().unwrap();
    assert_eq!(keys(Some(parameters)), ["B", "A", "D", "C"]);
    let d = parameters.get("D").unwrap().as_mapping().unwrap();
    assert_eq!(d.get("Type").unwrap().as_str(), Some("Number"));
}

#[test]
fn styling_differences_do_not_conflict() {
    let mut accumulator = fragment(
        "Metadata:\n  Description: 'hello world'\n  Tags: {team: core}\nConditions:\n  HasName: !Not [!Equals [!Ref Name, '']]\n",
    );
    let incoming = fragment(
        "Metadata:\n  Description: \"hello world\"   # same\n  Tags:\n    team: \"core\"\nConditions:\n  HasName: !Not\n    - !Equals\n      - !Ref Name\n      - \"\"\n",
    );

    merge(&mut accumulator, incoming).unwrap();
}

#[test]
fn differing_subtrees_conflict_on_exact_key() {
    let mut accumulator = fragment("Conditions:\n  IsProd: !Equals [!Ref Env, prod]\n  IsTest: !Equals [!Ref Env, test]\n");
    let err = merge(
        &mut accumulator,
        fragment("Conditions:\n  IsTest: !Equals [!Ref Env, staging]\n"),
    )
    .unwrap_err();

    assert_eq!(err.section, Section::Conditions);
    assert_eq!(err.key(), "IsTest");
    assert_eq!(err.to_string(), "condition \"IsTest\" already exists with a different definition");
}

#[test]
fn sequence_order_matters() {
    let mut accumulator = fragment("Parameters:\n  Env:\n    AllowedValues: [test, prod]\n");
    let err = merge(
        &mut accumulator,
        fragment("Parameters:\n  Env:\n    AllowedValues: [prod, test]\n"),
    )
    .unwrap_err();

    assert_eq!(err.section, Section::Parameters);
    assert_eq!(err.key(), "Env");
}

#[test]
fn two_level_conflict_reports_dotted_path() {
    let mut accumulator = fragment("Mappings:\n  test:\n    WCU: 5\n");
    let err = merge(&mut accumulator, fragment("Mappings:\n  test:\n    WCU: 10\n")).unwrap_err();

    assert_eq!(err.section, Section::Mappings);
    assert_eq!(err.key(), "test.WCU");
    assert_eq!(err.first_yaml(), "5\n");
    assert_eq!(err.second_yaml(), "10\n");
}

#[test]
fn two_level_merge_unions_inner_keys() {
    let mut accumulator = fragment("Mappings:\n  EnvMap:\n    test:\n      Size: small\n");
    merge(
        &mut accumulator,
        fragment("Mappings:\n  EnvMap:\n    prod:\n      Size: large\n    test:\n      Size: small\n"),
    )
    .unwrap();

    let env_map = accumulator.mappings.as_ref().unwrap().get("EnvMap").unwrap();
    assert_eq!(keys(env_map.as_mapping()), ["test", "prod"]);
}

#[test]
fn two_level_non_mapping_values_compare_whole() {
    let mut accumulator = fragment("Mappings:\n  Odd: [a, b]\n");
    let err = merge(&mut accumulator, fragment("Mappings:\n  Odd: [a, c]\n")).unwrap_err();
    assert_eq!(err.key(), "Odd");

    merge(&mut accumulator, fragment("Mappings:\n  Odd: [a, b]\n")).unwrap();
}

#[test]
fn conflict_in_mappings_keeps_earlier_sections() {
    let first = fragment(
        "Metadata:\n  Owner: team-a\nParameters:\n  Env:\n    Type: String\nMappings:\n  test:\n    WCU: 5\n",
    );
    let second = fragment(
        "Metadata:\n  Service: api\nParameters:\n  Size:\n    Type: Number\nMappings:\n  test:\n    WCU: 10\nConditions:\n  IsProd: !Equals [!Ref Env, prod]\n",
    );

    let failure = MergeSession::new(first).merge(second).unwrap_err();

    assert_eq!(failure.merged_sections(), [Section::Metadata, Section::Parameters]);
    assert_eq!(failure.error().section, Section::Mappings);
    assert_eq!(failure.error().key(), "test.WCU");

    let partial = failure.into_partial();
    assert_eq!(keys(partial.metadata.as_ref()), ["Owner", "Service"]);
    assert_eq!(keys(partial.parameters.as_ref()), ["Env", "Size"]);
    // Conditions come after the failing section and are never reached.
    assert!(partial.conditions.is_none());
}

#[test]
fn in_place_merge_keeps_earlier_sections_on_conflict() {
    let mut accumulator = fragment("Metadata:\n  Owner: team-a\nMappings:\n  test:\n    WCU: 5\n");
    let err = merge(
        &mut accumulator,
        fragment("Metadata:\n  Service: api\nMappings:\n  test:\n    WCU: 10\n"),
    )
    .unwrap_err();

    assert_eq!(err.section, Section::Mappings);
    assert_eq!(keys(accumulator.metadata.as_ref()), ["Owner", "Service"]);
}

#[test]
fn missing_section_leaves_accumulator_unchanged() {
    let mut accumulator = fragment("Conditions:\n  IsProd: !Equals [!Ref Env, prod]\n  HasName: !Not [!Equals [!Ref Name, '']]\n");
    let before = accumulator.conditions.clone().map(Node::Mapping).unwrap();

    merge(&mut accumulator, fragment("Parameters:\n  Env:\n    Type: String\n")).unwrap();

    let after = accumulator.conditions.clone().map(Node::Mapping).unwrap();
    assert!(after.is_equal(&before));
    assert_eq!(keys(accumulator.conditions.as_ref()), ["IsProd", "HasName"]);
}

#[test]
fn first_contributor_sets_section_order() {
    let mut accumulator = TemplateFragment::default();
    merge(&mut accumulator, fragment("Metadata:\n  Z: 1\n  A: 2\n  M: 3\n")).unwrap();

    assert_eq!(keys(accumulator.metadata.as_ref()), ["Z", "A", "M"]);
}

#[test]
fn empty_section_is_not_absent() {
    let mut accumulator = fragment("Parameters: {}\n");
    merge(&mut accumulator, fragment("Metadata:\n  Owner: me\n")).unwrap();

    assert!(accumulator.parameters.as_ref().unwrap().is_empty());
    assert!(accumulator.conditions.is_none());
}

#[test]
fn merge_all_stops_at_first_conflict() {
    let fragments = vec![
        fragment("Parameters:\n  Env:\n    Type: String\n"),
        fragment("Parameters:\n  Env:\n    Type: Number\n"),
        fragment("Parameters:\n  Other:\n    Type: String\n"),
    ];

    let err = merge_all(fragments).unwrap_err();
    assert_eq!(err.section, Section::Parameters);
    assert_eq!(err.key(), "Env");
}

#[test]
fn merge_all_of_nothing_is_empty() {
    let template = merge_all(Vec::<TemplateFragment>::new()).unwrap();
    assert!(template.is_empty());
}
