use std::path::PathBuf;

use retrotree_chem::{ChemError, Molecule, ProblemSpec, SeedStrategy, compile_yaml, load_yaml, save_yaml};
use retrotree_core::Chemistry;

const VALID_PROBLEM_YAML: &str = r#"
version: 1
name: ester
target: Ph-COO-CH3
building_blocks:
  - Ph-COOH
  - CH3-OH
  - Ph-CH3
groups:
  - id: carboxyl
    fragments: [COOH]
  - id: methyl
    fragments: [CH3]
templates:
  - id: esterification
    groups: [carboxyl]
    consume: [COOH]
    partner: [OH]
    produce: [COO]
  - id: methyl_oxidation
    groups: [methyl]
    consume: [CH3]
    produce: [COOH]
"#;

fn mol(text: &str) -> Molecule {
    text.parse().expect("valid molecule")
}

fn amide_problem_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("problems/amide.yaml")
}

#[test]
fn yaml_parse_and_compile_success() {
    let spec: ProblemSpec = serde_yaml::from_str(VALID_PROBLEM_YAML).expect("valid yaml");
    let problem = spec.compile().expect("compile should succeed");

    assert_eq!(problem.name, "ester");
    assert_eq!(problem.target, mol("CH3-COO-Ph"));
    assert_eq!(problem.library.catalog().len(), 3);
    assert_eq!(problem.library.templates().len(), 2);
}

#[test]
fn validation_fails_for_unknown_group() {
    let yaml = r#"
name: broken
target: Ph-OH
building_blocks: [Ph-Br]
groups: []
templates:
  - id: hydrolysis
    groups: [bromide]
    consume: [Br]
    produce: [OH]
"#;
    let spec: ProblemSpec = serde_yaml::from_str(yaml).expect("valid syntax");
    let err = spec.validate().expect_err("validation should fail");
    assert!(matches!(err, ChemError::UnknownGroup { ref group, .. } if group == "bromide"));
}

#[test]
fn validation_fails_for_duplicate_template_and_bad_molecule() {
    let mut spec: ProblemSpec = serde_yaml::from_str(VALID_PROBLEM_YAML).unwrap();
    let first = spec.templates[0].clone();
    spec.templates.push(first);
    assert!(matches!(
        spec.validate(),
        Err(ChemError::DuplicateTemplateId { .. })
    ));

    let mut spec: ProblemSpec = serde_yaml::from_str(VALID_PROBLEM_YAML).unwrap();
    spec.building_blocks.push("Ph--OH".into());
    assert!(matches!(
        spec.validate(),
        Err(ChemError::InvalidMolecule { .. })
    ));

    let mut spec: ProblemSpec = serde_yaml::from_str(VALID_PROBLEM_YAML).unwrap();
    spec.building_blocks.clear();
    assert!(matches!(spec.validate(), Err(ChemError::NoBuildingBlocks)));
}

#[test]
fn templates_are_indexed_by_functional_group_and_arity() {
    let problem = ProblemSpec::compile(&serde_yaml::from_str(VALID_PROBLEM_YAML).unwrap()).unwrap();
    let library = &problem.library;

    let single = library.applicable_templates(&mol("Ph-CH3"), true).unwrap();
    assert_eq!(single.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), vec!["methyl_oxidation"]);
    assert!(library.applicable_templates(&mol("Ph-CH3"), false).unwrap().is_empty());

    let double = library.applicable_templates(&mol("Ph-COOH"), false).unwrap();
    assert_eq!(double.len(), 1);
    assert_eq!(library.groups_of(&mol("Ph-COOH")), vec!["carboxyl"]);
}

#[test]
fn single_template_produces_a_reaction() {
    let problem = ProblemSpec::compile(&serde_yaml::from_str(VALID_PROBLEM_YAML).unwrap()).unwrap();
    let library = &problem.library;
    let template = library.applicable_templates(&mol("Ph-CH3"), true).unwrap().remove(0);

    let reaction = library
        .apply_template(&mol("Ph-CH3"), &template)
        .unwrap()
        .expect("oxidation applies");
    assert_eq!(reaction.to_string(), "CH3-Ph>>COOH-Ph");
    assert_eq!(library.products(&reaction), vec![mol("Ph-COOH")]);
}

#[test]
fn two_reactant_template_finds_a_partner_in_the_catalog() {
    let problem = ProblemSpec::compile(&serde_yaml::from_str(VALID_PROBLEM_YAML).unwrap()).unwrap();
    let library = &problem.library;
    let template = library.applicable_templates(&mol("Ph-COOH"), false).unwrap().remove(0);

    let reaction = library
        .apply_template_two(&problem.target, &mol("Ph-COOH"), &template)
        .unwrap()
        .expect("methanol is found as partner");
    assert_eq!(reaction.reactants, vec![mol("Ph-COOH"), mol("CH3-OH")]);
    assert_eq!(reaction.products, vec![problem.target.clone()]);
}

#[test]
fn wrong_arity_is_reported_as_a_reaction_error() {
    let problem = ProblemSpec::compile(&serde_yaml::from_str(VALID_PROBLEM_YAML).unwrap()).unwrap();
    let library = &problem.library;
    let two = library.applicable_templates(&mol("Ph-COOH"), false).unwrap().remove(0);
    let err = library.apply_template(&mol("Ph-COOH"), &two).unwrap_err();
    assert!(err.to_string().contains("esterification"));
}

#[test]
fn seed_strategies_rank_building_blocks() {
    let problem = compile_yaml(amide_problem_path()).expect("bundled problem compiles");
    let catalog = problem.library.catalog();

    let similar = SeedStrategy::similarity(3).candidates(catalog, &problem.target);
    assert_eq!(similar.len(), 3);
    assert!(similar.windows(2).all(|pair| pair[0].1 >= pair[1].1));

    let screened = SeedStrategy::Tversky { threshold: 0.0, limit: 100 }.candidates(catalog, &problem.target);
    assert!(screened.iter().all(|(_, score)| *score > 0.0));
    assert_eq!(screened[0].0, mol("NH2-CH2-CH2-OH"));
}

#[test]
fn save_and_reload_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("problem.yaml");
    let spec = load_yaml(amide_problem_path()).unwrap();
    save_yaml(&path, &spec).unwrap();

    let reloaded = compile_yaml(&path).unwrap();
    assert_eq!(reloaded.name, "amide");
    assert_eq!(reloaded.library.templates().len(), 6);
}
