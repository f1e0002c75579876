use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tmatrix_explore::solver::universe::{estimated_obligations, ObligationUniverse};
use tmatrix_explore::{AetgGenerator, CoverageReport, TestCase};
use tmatrix_ir::{DomainSpec, ParameterSpace, RequirementSet, Value};

fn abr() -> ParameterSpace {
    ParameterSpace::from_domains([
        ("a", DomainSpec::from(vec![1, 2, 3])),
        ("b", DomainSpec::from(vec!["a", "b"])),
        ("r", DomainSpec::from(vec![3, 4, 5])),
    ])
    .unwrap()
}

fn five_by_five() -> ParameterSpace {
    ParameterSpace::from_domains([
        ("a", DomainSpec::from(11..=15)),
        ("b", DomainSpec::from(21..=25)),
        ("c", DomainSpec::from(31..=35)),
        ("d", DomainSpec::from(41..=45)),
        ("e", DomainSpec::from(51..=55)),
    ])
    .unwrap()
}

fn uniform(params: usize, values: i64) -> ParameterSpace {
    ParameterSpace::from_domains(
        (0..params).map(|i| (format!("p{i}"), DomainSpec::from(0..values))),
    )
    .unwrap()
}

fn generate(space: &ParameterSpace, requirements: &RequirementSet, seed: u64) -> Vec<TestCase> {
    AetgGenerator::with_seed(space.clone(), requirements.clone(), seed)
        .unwrap()
        .collect()
}

#[test]
fn test_pairwise_example_covers_every_pair() {
    let space = abr();
    let reqs = RequirementSet::pairwise(&space);
    let cases = generate(&space, &reqs, 0);

    let mut ab = HashSet::new();
    let mut ar = HashSet::new();
    let mut br = HashSet::new();
    for case in &cases {
        let t = case.tuple();
        ab.insert((t[0].clone(), t[1].clone()));
        ar.insert((t[0].clone(), t[2].clone()));
        br.insert((t[1].clone(), t[2].clone()));
    }
    assert_eq!(ab.len(), 6);
    assert_eq!(ar.len(), 9);
    assert_eq!(br.len(), 6);

    // Nine (a, r) pairs need nine cases; the full product has 18.
    assert!(cases.len() >= 9);
    assert!(cases.len() < 18);
}

#[test]
fn test_every_case_assigns_every_parameter_from_its_domain() {
    let space = abr();
    let reqs = RequirementSet::pairwise(&space);
    for case in generate(&space, &reqs, 11) {
        assert_eq!(case.len(), 3);
        for param in space.parameters() {
            let value = case.get(&param.name).unwrap();
            assert!(param.domain.contains(value));
        }
    }
}

#[test]
fn test_explicit_requirements_regression() {
    let space = five_by_five();
    let reqs =
        RequirementSet::from_names(&space, [vec!["a", "c"], vec!["b", "d"], vec!["e"]]).unwrap();

    let first = generate(&space, &reqs, 0);
    let second = generate(&space, &reqs, 0);
    assert_eq!(first, second);

    // Seed 0 is part of the public contract: this exact sequence must not
    // drift across releases.
    const EXPECTED: [[i64; 5]; 30] = [
        [14, 23, 33, 44, 55],
        [13, 22, 31, 41, 54],
        [15, 24, 34, 42, 53],
        [11, 21, 35, 45, 52],
        [12, 25, 32, 43, 51],
        [12, 25, 33, 45, 55],
        [13, 25, 32, 44, 55],
        [15, 25, 35, 42, 52],
        [14, 25, 31, 41, 52],
        [11, 24, 34, 45, 55],
        [11, 24, 32, 44, 52],
        [14, 24, 33, 43, 52],
        [12, 24, 34, 41, 52],
        [14, 23, 33, 45, 52],
        [15, 23, 35, 43, 54],
        [13, 23, 33, 42, 54],
        [14, 23, 35, 41, 52],
        [15, 22, 31, 45, 51],
        [15, 22, 33, 44, 55],
        [13, 22, 34, 43, 54],
        [14, 22, 32, 42, 55],
        [12, 21, 35, 44, 55],
        [11, 21, 31, 43, 53],
        [15, 21, 35, 42, 55],
        [15, 21, 34, 41, 55],
        [15, 24, 32, 41, 55],
        [14, 22, 34, 44, 54],
        [13, 25, 35, 44, 54],
        [12, 24, 31, 41, 53],
        [11, 25, 33, 45, 52],
    ];
    let actual: Vec<Vec<Value>> = first.iter().map(TestCase::tuple).collect();
    let expected: Vec<Vec<Value>> = EXPECTED
        .iter()
        .map(|row| row.iter().map(|&v| Value::Int(v)).collect())
        .collect();
    assert_eq!(actual, expected);

    // 25 (a, c) pairs, each case covers one; 55 obligations in total.
    assert!(first.len() >= 25);
    assert!(first.len() <= 55);
    assert!(CoverageReport::measure(&space, &reqs, &first).is_complete());

    for case in &first {
        let e = case.get("e").unwrap();
        assert!(matches!(e, Value::Int(51..=55)));
    }
}

#[test]
fn test_same_seed_same_sequence() {
    let space = uniform(6, 3);
    let reqs = RequirementSet::pairwise(&space);

    for seed in [0, 1, 42, u64::MAX] {
        assert_eq!(generate(&space, &reqs, seed), generate(&space, &reqs, seed));
    }
}

#[test]
fn test_injected_rng_matches_seed() {
    let space = uniform(4, 3);
    let reqs = RequirementSet::pairwise(&space);

    let injected: Vec<TestCase> =
        AetgGenerator::new(space.clone(), reqs.clone(), ChaCha8Rng::seed_from_u64(5))
            .unwrap()
            .collect();
    assert_eq!(injected, generate(&space, &reqs, 5));
}

#[test]
fn test_different_seeds_still_cover() {
    let space = uniform(5, 3);
    let reqs = RequirementSet::pairwise(&space);

    for seed in 0..20 {
        let cases = generate(&space, &reqs, seed);
        let report = CoverageReport::measure(&space, &reqs, &cases);
        assert!(report.is_complete(), "seed {seed}: {:?}", report.uncovered);
        assert_eq!(report.covered, report.total);
    }
}

#[test]
fn test_entropy_generator_covers() {
    let space = uniform(4, 2);
    let reqs = RequirementSet::pairwise(&space);
    let cases: Vec<TestCase> = AetgGenerator::from_entropy(space.clone(), reqs.clone())
        .unwrap()
        .collect();
    assert!(CoverageReport::measure(&space, &reqs, &cases).is_complete());
}

#[test]
fn test_three_wise_coverage() {
    let space = uniform(5, 2);
    let reqs = RequirementSet::with_level(&space, 3);
    assert_eq!(reqs.len(), 10);

    let cases = generate(&space, &reqs, 0);
    assert!(CoverageReport::measure(&space, &reqs, &cases).is_complete());
    // 3-wise over five binary parameters; the full product is 32.
    assert!(cases.len() >= 8);
    assert!(cases.len() <= 24);
}

#[test]
fn test_output_well_below_cartesian() {
    let space = uniform(6, 3);
    let reqs = RequirementSet::pairwise(&space);
    let cases = generate(&space, &reqs, 0);

    assert!(CoverageReport::measure(&space, &reqs, &cases).is_complete());
    assert!(cases.len() >= 9);
    assert!(cases.len() <= 30, "{} cases", cases.len());
    assert!(cases.len() < space.cartesian_size());
}

#[test]
fn test_termination_bound() {
    let space = uniform(5, 4);
    let reqs = RequirementSet::pairwise(&space);
    let mut gen = AetgGenerator::with_seed(space, reqs, 9).unwrap();
    let total = gen.total_obligations();

    let mut produced = 0;
    while gen.next().is_some() {
        produced += 1;
        assert!(produced <= total, "exceeded {total} rounds");
    }
    assert_eq!(gen.remaining(), 0);
}

#[test]
fn test_removing_last_case_loses_coverage() {
    let space = uniform(4, 3);
    let reqs = RequirementSet::pairwise(&space);
    let mut cases = generate(&space, &reqs, 3);
    cases.pop();
    assert!(!CoverageReport::measure(&space, &reqs, &cases).is_complete());
}

#[test]
fn test_subsumption_is_idempotent() {
    let space = uniform(5, 2);
    let maximal = RequirementSet::from_names(&space, [vec!["p0", "p1", "p4"], vec!["p1", "p2"]])
        .unwrap();
    let redundant = RequirementSet::from_names(
        &space,
        [
            vec!["p0", "p1", "p4"],
            vec!["p1", "p2"],
            vec!["p0", "p4"],
            vec!["p1"],
            vec!["p2", "p1"],
        ],
    )
    .unwrap();

    assert_eq!(maximal, redundant);
    assert_eq!(
        ObligationUniverse::build(&space, &maximal).total(),
        ObligationUniverse::build(&space, &redundant).total()
    );
    assert_eq!(generate(&space, &maximal, 4), generate(&space, &redundant, 4));
}

#[test]
fn test_estimated_obligations_matches_universe() {
    let space = five_by_five();
    let reqs =
        RequirementSet::from_names(&space, [vec!["a", "c"], vec!["b", "d"], vec!["e"]]).unwrap();
    assert_eq!(estimated_obligations(&space, &reqs), 55);
    assert_eq!(ObligationUniverse::build(&space, &reqs).total(), 55);
}

#[test]
fn test_single_value_domains() {
    let space = ParameterSpace::from_domains([
        ("mode", DomainSpec::from(Value::from("fast"))),
        ("level", DomainSpec::from(vec![1, 2, 3])),
    ])
    .unwrap();
    let reqs = RequirementSet::pairwise(&space);
    let cases = generate(&space, &reqs, 0);

    assert_eq!(cases.len(), 3);
    assert!(cases
        .iter()
        .all(|c| c.get("mode") == Some(&Value::from("fast"))));
}

#[test]
fn test_no_requirements_no_cases() {
    let space = abr();
    assert!(generate(&space, &RequirementSet::default(), 0).is_empty());

    let empty = ParameterSpace::new(vec![]).unwrap();
    let reqs = RequirementSet::pairwise(&empty);
    assert!(generate(&empty, &reqs, 0).is_empty());
}

#[test]
fn test_single_parameter_covers_each_value() {
    let space = ParameterSpace::from_domains([("only", DomainSpec::from(vec![1, 2, 3]))]).unwrap();
    let reqs = RequirementSet::pairwise(&space);
    let mut values: Vec<Value> = generate(&space, &reqs, 0)
        .into_iter()
        .map(|c| c.into_tuple().remove(0))
        .collect();
    values.sort();
    assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}
