use advice_composition::{AdviceError, Interceptor};
use advice_kernel::Runtime;
use advice_test_utils::{family, int, method, plus, times, Recorder};
use proptest::prelude::*;
use serde_json::{json, Value};

fn zero_arity_runtime(log: &Recorder) -> (Runtime, advice_composition::TypeKey) {
    let rt = Runtime::default();
    let ty = rt.define_type("Widget", None).unwrap();
    rt.define_method(ty, "f", log.body("original", 0, json!("done"))).unwrap();
    (rt, ty)
}

#[test]
fn test_before_law() {
    let log = Recorder::new();
    let (rt, ty) = zero_arity_runtime(&log);
    rt.before(ty, &["f"], log.zero("B1")).unwrap();
    rt.before(ty, &["f"], log.zero("B2")).unwrap();

    let obj = rt.instantiate(ty).unwrap();
    assert_eq!(rt.invoke(&obj, "f", vec![]).unwrap(), json!("done"));
    assert_eq!(log.entries(), vec!["B2", "B1", "original"]);
}

#[test]
fn test_after_law() {
    let log = Recorder::new();
    let (rt, ty) = zero_arity_runtime(&log);
    rt.after(ty, &["f"], log.zero("A1")).unwrap();
    rt.after(ty, &["f"], log.zero("A2")).unwrap();

    let obj = rt.instantiate(ty).unwrap();
    rt.invoke(&obj, "f", vec![]).unwrap();
    assert_eq!(log.entries(), vec!["original", "A1", "A2"]);
}

#[test]
fn test_after_receives_previous_after_result() {
    let f = family();
    let seen = Recorder::new();
    f.runtime.after(f.child, &["one"], times(3)).unwrap();
    let witness = seen.clone();
    f.runtime
        .after(
            f.child,
            &["one"],
            Interceptor::nary(move |_, result| {
                witness.push(result[0].to_string());
                Ok(result[0].clone())
            }),
        )
        .unwrap();

    assert_eq!(f.child_one(1), 6);
    assert_eq!(seen.entries(), vec!["6"]);
}

#[test]
fn test_zero_arity_after_passes_result_through() {
    let log = Recorder::new();
    let f = family();
    f.runtime.after(f.child, &["one"], plus(1)).unwrap();
    f.runtime.after(f.child, &["one"], log.zero("audit")).unwrap();
    f.runtime.after(f.child, &["one"], plus(1)).unwrap();

    assert_eq!(f.child_one(5), 8);
    assert_eq!(log.entries(), vec!["audit"]);
}

#[test]
fn test_mixed_chain_full_order() {
    let log = Recorder::new();
    let (rt, ty) = zero_arity_runtime(&log);
    rt.after(ty, &["f"], log.pass("A1")).unwrap();
    rt.before(ty, &["f"], log.zero("B1")).unwrap();
    rt.after(ty, &["f"], log.zero("A2")).unwrap();
    rt.before(ty, &["f"], log.pass("B2")).unwrap();

    let obj = rt.instantiate(ty).unwrap();
    assert_eq!(rt.invoke(&obj, "f", vec![]).unwrap(), json!("done"));
    assert_eq!(log.entries(), vec!["B2", "B1", "original", "A1", "A2"]);
}

#[test]
fn test_nary_before_on_zero_arity_runs_for_effect() {
    let log = Recorder::new();
    let (rt, ty) = zero_arity_runtime(&log);
    rt.before(
        ty,
        &["f"],
        Interceptor::nary(|_, args| {
            assert!(args.is_empty());
            Ok(json!("ignored"))
        }),
    )
    .unwrap();

    let obj = rt.instantiate(ty).unwrap();
    assert_eq!(rt.invoke(&obj, "f", vec![]).unwrap(), json!("done"));
}

fn arg_values(count: usize) -> Vec<Value> {
    (0..count).map(|i| json!(i)).collect()
}

proptest! {
    #[test]
    fn prop_signature_preserved(
        arity in 0usize..5,
        befores in 0usize..4,
        afters in 0usize..4,
    ) {
        let rt = Runtime::default();
        let ty = rt.define_type("Sig", None).unwrap();
        rt.define_method(ty, "f", method(arity, |args| json!(args.len()))).unwrap();

        for _ in 0..befores {
            rt.before(ty, &["f"], Interceptor::nary(|_, args| Ok(Value::Array(args)))).unwrap();
        }
        for _ in 0..afters {
            rt.after(ty, &["f"], Interceptor::nary(|_, r| Ok(r[0].clone()))).unwrap();
        }

        let installed = rt.resolve_method(ty, "f").unwrap().unwrap();
        prop_assert_eq!(installed.arity(), arity);

        let obj = rt.instantiate(ty).unwrap();
        prop_assert_eq!(rt.invoke(&obj, "f", arg_values(arity)).unwrap(), json!(arity));

        let wrong = rt.invoke(&obj, "f", arg_values(arity + 1)).unwrap_err();
        prop_assert_eq!(
            wrong,
            AdviceError::ArityMismatch { op: "f".parse().unwrap(), expected: arity, actual: arity + 1 }
        );
    }

    #[test]
    fn prop_before_order_is_reverse_of_registration(count in 1usize..6) {
        let log = Recorder::new();
        let (rt, ty) = zero_arity_runtime(&log);
        for i in 0..count {
            rt.before(ty, &["f"], log.zero(&format!("B{i}"))).unwrap();
        }

        let obj = rt.instantiate(ty).unwrap();
        rt.invoke(&obj, "f", vec![]).unwrap();

        let mut expected: Vec<String> = (0..count).rev().map(|i| format!("B{i}")).collect();
        expected.push("original".to_string());
        prop_assert_eq!(log.entries(), expected);
    }

    #[test]
    fn prop_after_additions_compose(deltas in proptest::collection::vec(-50i64..50, 0..6)) {
        let f = family();
        for delta in &deltas {
            f.runtime.after(f.child, &["one"], plus(*delta)).unwrap();
        }
        prop_assert_eq!(f.child_one(7), 8 + deltas.iter().sum::<i64>());
        prop_assert_eq!(int(&f.call(f.parent, "one", vec![json!(7)])), 8);
    }
}
