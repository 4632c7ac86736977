//! End-to-end tests for opportunity discovery over whole programs.

use shader_ast::{NodeId, TranslationUnit, parse, validate};
use shader_reduction::finders::{LoopMergeFinder, RemoveStructFieldFinder, StatementFinder};
use shader_reduction::{
    FinderRegistry, Opportunity, OpportunityAggregator, OpportunityFinder, OpportunityKind,
    ReductionErrorKind, ReductionResult, ScanContext, ValidityCheck, discover,
};

const FUZZED: &str = "uniform float u;
    float _GLF_scale(float a) { return a * 2.0; }
    void main() {
        float x = _GLF_scale(u);
        if (_GLF_DEAD(false)) { x = 0.0; }
        x = _GLF_IDENTITY(x, x + 0.0);
        gl_FragColor = vec4(x, 0.0, 0.0, 1.0);
    }";

const LOOPS_AND_STRUCTS: &str = "struct S { float a; float b; };
    void main() {
        S s = S(1.0, 2.0);
        for (int i = 0; i < 2; i++) { gl_FragColor = vec4(s.a); }
        for (int i = 2; i < 4; i++) { gl_FragColor = vec4(s.a); }
    }";

const SWITCHED: &str = "#version 300 es
    precision mediump float;
    uniform int k;
    out vec4 color;
    void main() {
        vec2 v = vec2(1.0, 2.0);
        switch (_GLF_SWITCH(k)) {
            case 0:
                color = vec4(v.x);
                break;
            default:
                color = vec4(v.y);
        }
    }";

const FIXPOINT: &str = "void main() { gl_FragColor = vec4(1.0); }";

fn parsed(source: &str) -> TranslationUnit {
    parse(source).expect("test program should parse")
}

fn descriptions(unit: &TranslationUnit, context: &ScanContext) -> Vec<String> {
    discover(unit, context, false)
        .expect("discovery should succeed")
        .iter()
        .map(Opportunity::describe)
        .collect()
}

#[test]
fn test_discovery_is_deterministic() {
    for source in [FUZZED, LOOPS_AND_STRUCTS, SWITCHED] {
        let unit = parsed(source);
        let context = ScanContext::everywhere(unit.version);
        assert_eq!(descriptions(&unit, &context), descriptions(&unit, &context));
    }
}

#[test]
fn test_discovery_leaves_the_tree_untouched() {
    let unit = parsed(FUZZED);
    let before = unit.clone();
    let context = ScanContext::everywhere(unit.version);
    let found = discover(&unit, &context, true).expect("discovery should succeed");
    assert!(!found.is_empty());
    assert_eq!(unit, before);
}

#[test]
fn test_checked_opportunities_keep_programs_valid() {
    for source in [FUZZED, LOOPS_AND_STRUCTS, SWITCHED] {
        let unit = parsed(source);
        for everywhere in [false, true] {
            let context = ScanContext::new(unit.version).with_exhaustive_scan(everywhere);
            let found = discover(&unit, &context, true)
                .unwrap_or_else(|error| panic!("{error}\nin program:\n{source}"));
            for proposal in &found {
                assert!(proposal.validated);
                let mut edited = unit.clone();
                proposal.apply(&mut edited);
                assert!(
                    validate(&edited, edited.version).is_ok(),
                    "{}",
                    proposal.describe()
                );
            }
        }
    }
}

#[test]
fn test_targeted_scan_finds_less() {
    let unit = parsed(FUZZED);
    let targeted = discover(&unit, &ScanContext::new(unit.version), false).unwrap();
    let exhaustive = discover(&unit, &ScanContext::everywhere(unit.version), false).unwrap();
    assert!(!targeted.is_empty());
    assert!(targeted.len() < exhaustive.len());
}

#[test]
fn test_fixpoint_program_has_nothing_to_reduce() {
    let unit = parsed(FIXPOINT);
    let context = ScanContext::everywhere(unit.version);
    assert!(descriptions(&unit, &context).is_empty());
}

#[test]
fn test_results_follow_registry_order() {
    let unit = parsed(LOOPS_AND_STRUCTS);
    let context = ScanContext::everywhere(unit.version);
    let found = discover(&unit, &context, false).unwrap();
    let kinds: Vec<OpportunityKind> = found.iter().map(|proposal| proposal.kind).collect();

    assert_eq!(kinds.first(), Some(&OpportunityKind::LoopMerge));
    assert!(kinds.contains(&OpportunityKind::RemoveStructField));
    let position = |kind: OpportunityKind| {
        OpportunityKind::ALL
            .iter()
            .position(|candidate| *candidate == kind)
            .unwrap()
    };
    assert!(kinds.windows(2).all(|pair| position(pair[0]) <= position(pair[1])));
}

#[test]
fn test_output_is_a_concatenation_of_finder_results() {
    let unit = parsed(LOOPS_AND_STRUCTS);
    let context = ScanContext::everywhere(unit.version);
    let run = |registry: FinderRegistry| -> Vec<String> {
        OpportunityAggregator::new(registry)
            .discover(&unit, &context, ValidityCheck::Disabled)
            .unwrap()
            .iter()
            .map(Opportunity::describe)
            .collect()
    };

    let mut separate = run(FinderRegistry::new().with(LoopMergeFinder));
    separate.extend(run(FinderRegistry::new().with(RemoveStructFieldFinder)));
    separate.extend(run(FinderRegistry::new().with(StatementFinder)));
    let combined = run(
        FinderRegistry::new()
            .with(LoopMergeFinder)
            .with(RemoveStructFieldFinder)
            .with(StatementFinder),
    );
    assert_eq!(combined, separate);
}

/// Deletes the first statement of `main`, whatever it is.
struct DropFirstStatement;

#[derive(Debug)]
struct DropStatement(NodeId);

impl Opportunity for DropStatement {
    fn apply(&self, unit: &mut TranslationUnit) {
        unit.remove_stmt(self.0);
    }

    fn describe(&self) -> String {
        format!("drop statement {}", self.0)
    }
}

impl OpportunityFinder for DropFirstStatement {
    type Opportunity = DropStatement;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::Statement
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        _context: &ScanContext,
    ) -> ReductionResult<Vec<DropStatement>> {
        Ok(unit
            .find_function("main")
            .and_then(|main| main.body.stmts.first())
            .map(|stmt| DropStatement(stmt.id))
            .into_iter()
            .collect())
    }
}

#[test]
fn test_validity_check_reports_broken_finders() {
    let unit = parsed("void main() { float x = 1.0; gl_FragColor = vec4(x); }");
    let context = ScanContext::new(unit.version);
    let aggregator = OpportunityAggregator::new(FinderRegistry::new().with(DropFirstStatement));

    let unchecked = aggregator
        .discover(&unit, &context, ValidityCheck::Disabled)
        .expect("unchecked discovery passes edits through");
    assert_eq!(unchecked.len(), 1);
    assert!(!unchecked[0].validated);

    let error = aggregator
        .discover(&unit, &context, ValidityCheck::Enabled)
        .unwrap_err();
    assert_eq!(error.opportunity_kind(), Some(OpportunityKind::Statement));
    match error.kind() {
        ReductionErrorKind::InvalidOpportunity { reason, .. } => {
            assert!(reason.contains("undeclared identifier 'x'"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_emptying_the_entry_function_is_flagged() {
    let unit = parsed(FIXPOINT);
    let context = ScanContext::everywhere(unit.version);
    let aggregator = OpportunityAggregator::new(FinderRegistry::new().with(DropFirstStatement));

    let error = aggregator
        .discover(&unit, &context, ValidityCheck::Enabled)
        .unwrap_err();
    let message = error.to_string();
    assert!(
        message.starts_with("statement finder proposed an invalid opportunity 'drop statement #"),
        "{message}"
    );
    assert!(
        message.contains("function 'main' has an empty body"),
        "{message}"
    );
}

#[test]
fn test_invalid_input_is_reported_before_scanning() {
    let unit = parsed("void main() { gl_FragColor = vec4(y); }");
    let context = ScanContext::everywhere(unit.version);
    let aggregator = OpportunityAggregator::new(FinderRegistry::new().with(DropFirstStatement));

    let error = aggregator
        .discover(&unit, &context, ValidityCheck::Enabled)
        .unwrap_err();
    assert_eq!(error.opportunity_kind(), None);
    match error.kind() {
        ReductionErrorKind::InvalidInput { reason } => {
            assert!(reason.starts_with("undeclared identifier 'y'"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_scans_run_on_several_threads() {
    let unit = parsed(LOOPS_AND_STRUCTS);
    let context = ScanContext::everywhere(unit.version);
    let aggregator = OpportunityAggregator::default();
    let expected = descriptions(&unit, &context);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                scope.spawn(|| {
                    aggregator
                        .discover(&unit, &context, ValidityCheck::Enabled)
                        .unwrap()
                        .iter()
                        .map(Opportunity::describe)
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
