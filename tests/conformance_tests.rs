#![cfg(test)]

use std::sync::{Arc, Mutex};

use fuzz_shape::error::TranscodeError;
use fuzz_shape::harness::{FuzzTarget, ReplayReport, SeedReplayEngine, TargetConfig, Ticket};
use fuzz_shape::primitives::{Field, FieldShape, ShapeNode, StructuredValue};
use fuzz_shape::testing::{init_tracing, Batch, Holder, Pair, Parent, Sealed};
use fuzz_shape::transcode::{FlatParam, ParamType};
use fuzz_shape::types::{ScalarType, ScalarValue};

// --- Helpers ---

fn text(v: &str) -> ScalarValue {
    ScalarValue::Text(v.to_string())
}

/// Runs a typed target and collects every argument list the test function saw.
fn collect<A>(target: FuzzTarget<SeedReplayEngine>) -> (ReplayReport, Vec<A>)
where
    A: fuzz_shape::ArgList + Clone + Send + 'static,
{
    let seen: Arc<Mutex<Vec<A>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let report = target
        .fuzz(move |_t: &mut Ticket, args: A| {
            sink.lock().unwrap().push(args);
        })
        .unwrap();
    let seen = seen.lock().unwrap().clone();
    (report, seen)
}

fn even(n: i64) -> bool {
    n % 2 == 0
}

// --- Records ---

#[test]
fn test_record_seeds_expose_leaf_signature() {
    init_tracing();
    let engine = SeedReplayEngine::new().with_input(vec![ScalarValue::I64(7), text("x")]);
    let mut target = FuzzTarget::new(engine);
    target.add((Pair::new(1, "hallo"),)).unwrap();
    target.add((Pair::new(2, "bye"),)).unwrap();

    let (report, seen) = collect::<(Pair,)>(target);

    assert_eq!(
        report.signature.params(),
        &[FlatParam::Context, FlatParam::Scalar(ScalarType::I64), FlatParam::Scalar(ScalarType::Text)]
    );
    assert_eq!(report.runs(), 3);
    assert_eq!(report.desyncs().count(), 0);
    assert_eq!(seen, vec![(Pair::new(1, "hallo"),), (Pair::new(2, "bye"),), (Pair::new(7, "x"),)]);
}

#[test]
fn test_nested_records_report_assertion_failures() {
    init_tracing();
    let mut target = FuzzTarget::new(SeedReplayEngine::new());
    target
        .add((Parent { child1: Pair::new(1, "hallo"), child2: Pair::new(2, "bye") },))
        .unwrap();
    target
        .add((Parent { child1: Pair::new(4, "a"), child2: Pair::new(3, "b") },))
        .unwrap();

    let report = target
        .fuzz(|t: &mut Ticket, (parent,): (Parent,)| {
            if !even(parent.child1.first) {
                t.error(format!("child1.first is odd: {}", parent.child1.first));
            }
        })
        .unwrap();

    assert_eq!(report.signature.arity(), 4);
    let failed: Vec<u64> = report.failures().map(|o| o.run).collect();
    assert_eq!(failed, vec![0]);
    assert_eq!(report.outcomes[0].failures, vec!["child1.first is odd: 1".to_string()]);
    assert!(report.outcomes[0].desync.is_none());
}

#[test]
fn test_multiple_parameters_share_one_tuple() {
    let engine = SeedReplayEngine::new().with_input(vec![
        ScalarValue::F64(0.5),
        ScalarValue::F64(1.5),
        ScalarValue::Bool(true),
        ScalarValue::I64(9),
        text("z"),
    ]);
    let mut target = FuzzTarget::new(engine);
    target.add((Holder { x1: 1.0, x2: 2.0 }, false, Pair::new(0, ""))).unwrap();

    let (report, seen) = collect::<(Holder, bool, Pair)>(target);
    assert_eq!(report.signature.arity(), 5);
    assert_eq!(seen[1], (Holder { x1: 0.5, x2: 1.5 }, true, Pair::new(9, "z")));
}

#[test]
fn test_no_seeds_without_sequences() {
    let engine = SeedReplayEngine::new().with_input(vec![ScalarValue::I64(4), ScalarValue::U8(1)]);
    let target = FuzzTarget::new(engine);
    let (report, seen) = collect::<(i64, u8)>(target);
    assert_eq!(report.runs(), 1);
    assert_eq!(seen, vec![(4, 1)]);
}

// --- Sequences ---

#[test]
fn test_nested_sequences_reconstruct_from_spans() {
    init_tracing();
    let engine = SeedReplayEngine::new().with_input((5..=8).map(ScalarValue::I64).collect());
    let mut target = FuzzTarget::new(engine);
    target.add((vec![vec![1i64, 2], vec![3, 4]],)).unwrap();

    let (report, seen) = collect::<(Vec<Vec<i64>>,)>(target);
    assert_eq!(report.signature.arity(), 4);
    assert_eq!(seen, vec![(vec![vec![1, 2], vec![3, 4]],), (vec![vec![5, 6], vec![7, 8]],)]);
}

#[test]
fn test_empty_sequences_round_trip() {
    let mut target = FuzzTarget::new(SeedReplayEngine::new());
    target.add((Vec::<i32>::new(), vec![Vec::<u16>::new(), Vec::new()], 3u8)).unwrap();

    let (report, seen) = collect::<(Vec<i32>, Vec<Vec<u16>>, u8)>(target);
    assert_eq!(report.signature.arity(), 1);
    assert_eq!(seen, vec![(vec![], vec![vec![], vec![]], 3)]);
}

#[test]
fn test_records_inside_sequences() {
    let batch = Batch {
        id: 11,
        pairs: vec![Pair::new(1, "a"), Pair::new(2, "b")],
        grid: vec![vec![1], vec![], vec![2, 3]],
        flag: true,
    };
    let mut target = FuzzTarget::new(SeedReplayEngine::new());
    target.add((batch.clone(),)).unwrap();

    let (report, seen) = collect::<(Batch,)>(target);
    // id, two pairs of two leaves, three grid cells, flag.
    assert_eq!(report.signature.arity(), 1 + 4 + 3 + 1);
    assert_eq!(seen, vec![(batch,)]);
}

#[test]
fn test_sequence_lengths_may_differ_latest_seed_wins() {
    init_tracing();
    let mut target = FuzzTarget::new(SeedReplayEngine::new());
    target.add((vec![1i64, 2],)).unwrap();
    target.add((vec![1i64, 2, 3],)).unwrap();

    let (report, seen) = collect::<(Vec<i64>,)>(target);
    assert_eq!(report.signature.arity(), 3);
    let desynced: Vec<u64> = report.desyncs().map(|o| o.run).collect();
    assert_eq!(desynced, vec![0]);
    assert!(matches!(report.outcomes[0].desync, Some(TranscodeError::ShapeDesync(_))));
    assert_eq!(seen, vec![(vec![1, 2, 3],)]);
}

#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_superseded_spans_are_warned() {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut target = FuzzTarget::new(SeedReplayEngine::new());
        target.add((vec![1i64],)).unwrap();
        target.add((vec![1i64, 2],)).unwrap();
    });

    let logs = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("WARN"), "{}", logs);
    assert!(logs.contains("sequence spans superseded by newer seed"), "{}", logs);
}

#[test]
fn test_strict_seeds_reject_differing_lengths() {
    let config = TargetConfig { strict_seeds: true };
    let mut target = FuzzTarget::with_config(SeedReplayEngine::new(), config);
    target.add((vec![1i64, 2],)).unwrap();
    target.add((vec![1i64, 2, 3],)).unwrap();

    let err = target.fuzz(|_t: &mut Ticket, _args: (Vec<i64>,)| {}).unwrap_err();
    assert!(matches!(err, TranscodeError::ShapeMismatch(_)));
}

#[test]
fn test_no_seeds_with_sequence_fails_setup() {
    let target = FuzzTarget::new(SeedReplayEngine::new());
    let err = target.fuzz(|_t: &mut Ticket, _args: (Vec<i64>,)| {}).unwrap_err();
    assert!(matches!(err, TranscodeError::ShapeMismatch(_)));
}

// --- Setup errors ---

#[test]
fn test_private_field_is_unsupported() {
    let mut target = FuzzTarget::new(SeedReplayEngine::new());
    assert_eq!(
        target.add((Sealed::new(1, 2),)).unwrap_err(),
        TranscodeError::UnsupportedField { record: "Sealed".into(), field: "closed".into() }
    );

    let target = FuzzTarget::new(SeedReplayEngine::new());
    let err = target.fuzz(|_t: &mut Ticket, _args: (Sealed,)| {}).unwrap_err();
    assert!(matches!(err, TranscodeError::UnsupportedField { .. }));
}

#[test]
fn test_seed_record_arity_mismatch() {
    let record = |n: i64| {
        StructuredValue::record(
            "R",
            (0..n).map(|i| Field::new(format!("f{}", i), StructuredValue::scalar(i))).collect(),
        )
    };
    let mut target = FuzzTarget::new(SeedReplayEngine::new());
    target.add_values(&[record(2)]).unwrap();
    let err = target.add_values(&[record(3)]).unwrap_err();
    assert!(matches!(err, TranscodeError::ShapeMismatch(_)));
}

#[test]
fn test_seeds_must_match_declared_parameters() {
    let mut target = FuzzTarget::new(SeedReplayEngine::new());
    target.add((Pair::new(1, "a"),)).unwrap();
    let err = target.fuzz(|_t: &mut Ticket, _args: (Holder,)| {}).unwrap_err();
    assert!(matches!(err, TranscodeError::ShapeMismatch(_)));
}

#[test]
fn test_untyped_signature_validation() {
    let target = FuzzTarget::new(SeedReplayEngine::new());
    let err = target
        .fuzz_values(&[ParamType::Value(ShapeNode::Scalar(ScalarType::I64))], |_t, _args| {})
        .unwrap_err();
    assert!(matches!(err, TranscodeError::InvalidSignature(_)));

    let target = FuzzTarget::new(SeedReplayEngine::new());
    assert!(matches!(target.fuzz_values(&[], |_t, _args| {}), Err(TranscodeError::InvalidSignature(_))));
}

#[test]
fn test_untyped_target_runs() {
    let shape = ShapeNode::record("Point", vec![FieldShape::new("x", ShapeNode::Scalar(ScalarType::I32))]);
    let point = |x: i32| StructuredValue::record("Point", vec![Field::new("x", StructuredValue::scalar(x))]);

    let engine = SeedReplayEngine::new().with_input(vec![ScalarValue::I32(-3)]);
    let mut target = FuzzTarget::new(engine);
    target.add_values(&[point(5)]).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let report = target
        .fuzz_values(&[ParamType::Context, ParamType::Value(shape)], move |_t, args| {
            sink.lock().unwrap().push(args);
        })
        .unwrap();
    assert_eq!(report.runs(), 2);
    assert_eq!(*seen.lock().unwrap(), vec![vec![point(5)], vec![point(-3)]]);
}

// --- Per-invocation failures ---

#[test]
fn test_wrong_kind_input_desyncs_without_calling() {
    let engine = SeedReplayEngine::new()
        .with_input(vec![text("x"), ScalarValue::I64(1)])
        .with_input(vec![ScalarValue::I64(1)]);
    let mut target = FuzzTarget::new(engine);
    target.add((Pair::new(1, "a"),)).unwrap();

    let (report, seen) = collect::<(Pair,)>(target);
    assert_eq!(report.runs(), 3);
    assert_eq!(report.desyncs().count(), 2);
    assert!(report.desyncs().all(|o| o.desync.as_ref().is_some_and(TranscodeError::is_per_invocation)));
    assert_eq!(seen.len(), 1);
}

// --- Configuration ---

#[test]
fn test_target_config_from_json() {
    let default: TargetConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(default, TargetConfig::default());
    let strict: TargetConfig = serde_json::from_str(r#"{"strict_seeds": true}"#).unwrap();
    assert!(strict.strict_seeds);
}
