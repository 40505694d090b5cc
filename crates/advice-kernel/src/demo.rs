//! Canonical scenarios
//!
//! Each scenario runs on a fresh Parent < Child < Grandchild family where
//! Parent defines `one(x) = x + 1` and `two(x, y) = x * y`, and Child
//! enables advice.

use crate::config::RuntimeConfig;
use crate::runtime::Runtime;
use advice_composition::{AdviceError, Interceptor, Method, RecordSnapshot};
use advice_symbol::TypeKey;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Keys of the demo family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyKeys {
    /// Base type, advice not enabled
    pub parent: TypeKey,
    /// Advice-enabled subtype
    pub child: TypeKey,
    /// Subtype of `child`
    pub grandchild: TypeKey,
}

/// Declare the demo family on `runtime`
///
/// # Errors
/// Returns [`AdviceError::DuplicateType`] if the names are already taken.
pub fn declare_family(runtime: &Runtime) -> Result<FamilyKeys, AdviceError> {
    let parent = runtime.define_type("Parent", None)?;
    let child = runtime.define_type("Child", Some(parent))?;
    let grandchild = runtime.define_type("Grandchild", Some(child))?;

    runtime.define_method(parent, "one", Method::new(1, |_, args| Ok(json!(int(&args[0]) + 1))))?;
    runtime.define_method(
        parent,
        "two",
        Method::new(2, |_, args| Ok(json!(int(&args[0]) * int(&args[1])))),
    )?;
    runtime.enable_advice(child)?;

    Ok(FamilyKeys {
        parent,
        child,
        grandchild,
    })
}

/// Integer view of a value; non-integers read as zero
#[must_use]
pub fn int(value: &Value) -> i64 {
    value.as_i64().unwrap_or_default()
}

type Scenario = fn(&Runtime, FamilyKeys) -> Result<Value, AdviceError>;

const SCENARIOS: &[(&str, Scenario, i64)] = &[
    ("before_doubles_one", before_doubles_one, 11),
    ("stacked_before_on_one", stacked_before_on_one, 211),
    ("after_increments_two", after_increments_two, 13),
    ("before_rewrites_two_args", before_rewrites_two_args, 8),
    ("side_effect_before_on_one", side_effect_before_on_one, 6),
    ("side_effect_before_on_two", side_effect_before_on_two, 3),
    ("override_keeps_advice", override_keeps_advice, 20),
    ("reset_restores_raw", reset_restores_raw, 6),
];

fn doubler() -> Interceptor {
    Interceptor::nary(|_, args| Ok(json!(int(&args[0]) * 2)))
}

fn before_doubles_one(rt: &Runtime, family: FamilyKeys) -> Result<Value, AdviceError> {
    rt.before(family.child, &["one"], doubler().labelled("double"))?;
    rt.invoke(&rt.instantiate(family.child)?, "one", vec![json!(5)])
}

fn stacked_before_on_one(rt: &Runtime, family: FamilyKeys) -> Result<Value, AdviceError> {
    rt.before(family.child, &["one"], doubler().labelled("double"))?;
    rt.before(
        family.child,
        &["one"],
        Interceptor::nary(|_, args| Ok(json!(int(&args[0]) + 100))).labelled("add_100"),
    )?;
    rt.invoke(&rt.instantiate(family.child)?, "one", vec![json!(5)])
}

fn after_increments_two(rt: &Runtime, family: FamilyKeys) -> Result<Value, AdviceError> {
    rt.after(
        family.child,
        &["two"],
        Interceptor::nary(|_, result| Ok(json!(int(&result[0]) + 1))).labelled("increment"),
    )?;
    rt.invoke(&rt.instantiate(family.child)?, "two", vec![json!(3), json!(4)])
}

fn before_rewrites_two_args(rt: &Runtime, family: FamilyKeys) -> Result<Value, AdviceError> {
    rt.before(
        family.child,
        &["two"],
        Interceptor::nary(|_, args| {
            let (x, y) = (int(&args[0]), int(&args[1]));
            Ok(json!([x + y, x - y]))
        })
        .labelled("sum_and_difference"),
    )?;
    rt.invoke(&rt.instantiate(family.child)?, "two", vec![json!(3), json!(1)])
}

fn counting_before(rt: &Runtime, family: FamilyKeys, op: &str) -> Result<Arc<AtomicUsize>, AdviceError> {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    rt.before(
        family.child,
        &[op],
        Interceptor::zero(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
        .labelled("count"),
    )?;
    Ok(hits)
}

fn expect_hits(hits: &AtomicUsize, op: &str) -> Result<(), AdviceError> {
    match hits.load(Ordering::Relaxed) {
        1 => Ok(()),
        n => Err(AdviceError::raised(format!("side effect on {op} ran {n} times"))),
    }
}

fn side_effect_before_on_one(rt: &Runtime, family: FamilyKeys) -> Result<Value, AdviceError> {
    let hits = counting_before(rt, family, "one")?;
    let result = rt.invoke(&rt.instantiate(family.child)?, "one", vec![json!(5)])?;
    expect_hits(&hits, "one")?;
    Ok(result)
}

fn side_effect_before_on_two(rt: &Runtime, family: FamilyKeys) -> Result<Value, AdviceError> {
    let hits = counting_before(rt, family, "two")?;
    let result = rt.invoke(&rt.instantiate(family.child)?, "two", vec![json!(3), json!(1)])?;
    expect_hits(&hits, "two")?;
    Ok(result)
}

fn override_keeps_advice(rt: &Runtime, family: FamilyKeys) -> Result<Value, AdviceError> {
    rt.before(family.child, &["one"], doubler().labelled("double"))?;
    rt.define_method(
        family.grandchild,
        "one",
        Method::new(1, |_, args| Ok(json!(int(&args[0]) + 10))),
    )?;
    rt.invoke(&rt.instantiate(family.grandchild)?, "one", vec![json!(5)])
}

fn reset_restores_raw(rt: &Runtime, family: FamilyKeys) -> Result<Value, AdviceError> {
    rt.before(family.child, &["one"], doubler().labelled("double"))?;
    rt.after(family.child, &["one"], doubler().labelled("double"))?;
    rt.reset(family.child, &["one"])?;
    rt.invoke(&rt.instantiate(family.child)?, "one", vec![json!(5)])
}

/// Outcome of one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// Expected result
    pub expected: Value,
    /// Actual result, `null` on error
    pub actual: Value,
    /// Error message, if the scenario failed to run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Records left behind by the scenario
    pub records: Vec<RecordSnapshot>,
}

impl ScenarioResult {
    /// Check if the scenario produced the expected value
    #[must_use]
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.actual == self.expected
    }
}

/// Results of all scenarios
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoReport {
    /// Per-scenario results in run order
    pub scenarios: Vec<ScenarioResult>,
}

impl DemoReport {
    /// Check if every scenario passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.scenarios.iter().all(ScenarioResult::passed)
    }

    /// Number of failed scenarios
    #[must_use]
    pub fn failures(&self) -> usize {
        self.scenarios.iter().filter(|s| !s.passed()).count()
    }

    /// Scenario outcomes as text
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();
        report.push_str("=== Method Advice Demo ===\n\n");
        for scenario in &self.scenarios {
            let status = if scenario.passed() { "ok" } else { "FAILED" };
            let _ = write!(
                report,
                "{:<28} expected {:<5} got {:<5} {}",
                scenario.name,
                scenario.expected.to_string(),
                scenario.actual.to_string(),
                status
            );
            if let Some(error) = &scenario.error {
                let _ = write!(report, " ({error})");
            }
            report.push('\n');
        }
        let _ = write!(
            report,
            "\n=== Result: {} ({}/{} passed) ===\n",
            if self.passed() { "PASS" } else { "FAIL" },
            self.scenarios.len() - self.failures(),
            self.scenarios.len()
        );
        report
    }

    /// Record snapshots of every scenario as text
    #[must_use]
    pub fn generate_records_text(&self) -> String {
        let mut report = String::new();
        for scenario in &self.scenarios {
            let _ = writeln!(report, "[{}]", scenario.name);
            if scenario.records.is_empty() {
                report.push_str("  (no records)\n");
            }
            for record in &scenario.records {
                let _ = writeln!(
                    report,
                    "  {} {}:{} state={:?} before={:?} after={:?} arity={}",
                    record.id,
                    record.owner_name,
                    record.op.as_str(),
                    record.state,
                    record.before,
                    record.after,
                    record.original_arity
                );
            }
        }
        report
    }
}

/// Run every scenario, each on its own runtime built from `config`
///
/// # Errors
/// Returns an error only if the family cannot be declared; scenario
/// failures are reported in the [`DemoReport`].
pub fn run_demo(config: &RuntimeConfig) -> Result<DemoReport, AdviceError> {
    let mut scenarios = Vec::with_capacity(SCENARIOS.len());
    for &(name, scenario, expected) in SCENARIOS {
        let runtime = Runtime::new(config.clone());
        let family = declare_family(&runtime)?;

        let (actual, error) = match scenario(&runtime, family) {
            Ok(value) => (value, None),
            Err(err) => (Value::Null, Some(err.to_string())),
        };
        tracing::info!(scenario = name, %actual, ok = error.is_none(), "scenario finished");

        scenarios.push(ScenarioResult {
            name: name.to_string(),
            expected: json!(expected),
            actual,
            error,
            records: runtime.snapshots(),
        });
    }
    Ok(DemoReport { scenarios })
}
