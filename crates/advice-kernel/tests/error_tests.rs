use advice_composition::{AdviceError, AdviceState, Interceptor, Method};
use advice_kernel::RuntimeConfig;
use advice_test_utils::{family, family_with, int, plus, times};
use serde_json::{json, Value};

#[test]
fn test_advice_on_missing_name_is_lookup_error() {
    let f = family();
    let err = f.runtime.before(f.child, &["missing"], times(2)).unwrap_err();
    assert_eq!(
        err,
        AdviceError::Lookup {
            type_name: "Child".to_string(),
            op: "missing".parse().unwrap(),
        }
    );
    assert!(f.runtime.snapshot(f.child, "missing").unwrap().is_none());
}

#[test]
fn test_multi_name_advice_is_not_transactional() {
    let f = family();
    let err = f.runtime.after(f.child, &["one", "missing", "two"], plus(1)).unwrap_err();
    assert!(matches!(err, AdviceError::Lookup { .. }));

    assert_eq!(f.child_one(5), 7);
    assert_eq!(f.child_two(3, 4), 12);
    assert_eq!(f.runtime.advice_state(f.child, "two").unwrap(), AdviceState::Unadvised);
}

#[test]
fn test_before_result_with_wrong_arity_fails_at_invoke() {
    let f = family();
    f.runtime
        .before(f.child, &["two"], Interceptor::nary(|_, args| Ok(json!([int(&args[0])]))))
        .unwrap();

    let obj = f.runtime.instantiate(f.child).unwrap();
    let err = f.runtime.invoke(&obj, "two", vec![json!(3), json!(4)]).unwrap_err();
    assert_eq!(
        err,
        AdviceError::ArityMismatch {
            op: "two".parse().unwrap(),
            expected: 2,
            actual: 1,
        }
    );
}

#[test]
fn test_null_before_result_means_no_arguments() {
    let f = family();
    f.runtime
        .before(f.child, &["one"], Interceptor::nary(|_, _| Ok(Value::Null)))
        .unwrap();

    let obj = f.runtime.instantiate(f.child).unwrap();
    let err = f.runtime.invoke(&obj, "one", vec![json!(5)]).unwrap_err();
    assert!(matches!(err, AdviceError::ArityMismatch { expected: 1, actual: 0, .. }));
}

#[test]
fn test_wrong_argument_count_on_effective_operation() {
    let f = family();
    f.runtime.after(f.child, &["one"], plus(1)).unwrap();

    let obj = f.runtime.instantiate(f.child).unwrap();
    let err = f.runtime.invoke(&obj, "one", vec![]).unwrap_err();
    assert!(matches!(err, AdviceError::ArityMismatch { expected: 1, actual: 0, .. }));
    assert!(err.to_string().contains("given 0, expected 1"));
}

#[test]
fn test_interceptor_failure_propagates_unmodified() {
    let f = family();
    f.runtime
        .before(f.child, &["one"], Interceptor::nary(|_, _| Err(AdviceError::raised("refused"))))
        .unwrap();
    f.runtime.after(f.child, &["one"], plus(1)).unwrap();

    let obj = f.runtime.instantiate(f.child).unwrap();
    let err = f.runtime.invoke(&obj, "one", vec![json!(5)]).unwrap_err();
    assert_eq!(err, AdviceError::Raised("refused".to_string()));
    assert!(err.is_raised());
}

#[test]
fn test_body_failure_skips_after_chain() {
    let f = family();
    f.runtime
        .define_method(
            f.parent,
            "fail",
            Method::new(0, |_, _| Err(AdviceError::raised("body failed"))),
        )
        .unwrap();
    let ran = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = std::sync::Arc::clone(&ran);
    f.runtime
        .after(
            f.child,
            &["fail"],
            Interceptor::zero(move |_| {
                flag.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();

    let obj = f.runtime.instantiate(f.child).unwrap();
    let err = f.runtime.invoke(&obj, "fail", vec![]).unwrap_err();
    assert_eq!(err, AdviceError::Raised("body failed".to_string()));
    assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
}

#[test]
fn test_undefined_operation() {
    let f = family();
    let obj = f.runtime.instantiate(f.child).unwrap();
    let err = f.runtime.invoke(&obj, "three", vec![]).unwrap_err();
    assert_eq!(
        err,
        AdviceError::NoMethod {
            type_name: "Child".to_string(),
            op: "three".parse().unwrap(),
        }
    );
}

#[test]
fn test_advice_requires_enablement_when_auto_is_off() {
    let f = family_with(RuntimeConfig::default().with_auto_enable_advice(false));

    let err = f.runtime.before(f.parent, &["one"], times(2)).unwrap_err();
    assert_eq!(err, AdviceError::AdviceNotEnabled("Parent".to_string()));

    // Child enabled advice explicitly; Grandchild inherits it.
    f.runtime.before(f.grandchild, &["one"], times(2)).unwrap();
    assert_eq!(int(&f.call(f.grandchild, "one", vec![json!(5)])), 11);
}

#[test]
fn test_failed_advice_does_not_enable_type() {
    let f = family();
    let err = f.runtime.before(f.parent, &["missing"], times(2)).unwrap_err();
    assert!(matches!(err, AdviceError::Lookup { .. }));
    assert!(!f.runtime.is_advice_enabled(f.parent));

    // Definitions on Parent still bypass the hook.
    f.runtime
        .define_method(f.parent, "one", Method::new(1, |_, a| Ok(json!(int(&a[0]) + 2))))
        .unwrap();
    assert!(f.runtime.snapshot(f.parent, "one").unwrap().is_none());
    assert_eq!(int(&f.call(f.parent, "one", vec![json!(5)])), 7);
}

#[test]
fn test_duplicate_and_unknown_types() {
    let f = family();
    assert_eq!(
        f.runtime.define_type("Child", None).unwrap_err(),
        AdviceError::DuplicateType("Child".to_string())
    );
    assert!(matches!(
        f.runtime.type_key("Nobody"),
        Err(AdviceError::UnknownType(_))
    ));
}

#[test]
fn test_receiver_send_reaches_advised_operation() {
    let f = family();
    f.runtime
        .define_method(
            f.parent,
            "twice_one",
            Method::new(1, |rx, args| {
                let once = rx.send("one", args)?;
                rx.send("one", vec![once])
            }),
        )
        .unwrap();
    f.runtime.after(f.child, &["one"], times(10)).unwrap();

    // (((2 + 1) * 10) + 1) * 10
    assert_eq!(int(&f.call(f.child, "twice_one", vec![json!(2)])), 310);
    // Parent still sees the raw operation.
    assert_eq!(int(&f.call(f.parent, "twice_one", vec![json!(2)])), 4);
}

#[test]
fn test_invalid_operation_name() {
    let f = family();
    let obj = f.runtime.instantiate(f.child).unwrap();
    assert!(matches!(
        f.runtime.invoke(&obj, "not a name", vec![]),
        Err(AdviceError::Symbol(_))
    ));
}
