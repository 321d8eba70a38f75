//! Rule execution engine with parallel support
//!
//! The RuleEngine orchestrates one evaluation run:
//! - Refuses graphs that fail referential validation
//! - Estimates attacker attractiveness once
//! - Runs every registered rule in parallel using rayon
//! - Isolates failing or panicking rules and keeps going
//! - Merges all risks into one collection sorted by synthetic id
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      RuleEngine                         │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Validate graph                                      │
//! │  2. Estimate attractiveness (side table)                │
//! │  3. Run rules in parallel (rayon, catch_unwind)         │
//! │  4. Summarize per-rule results                          │
//! │  5. Merge and sort risks                                │
//! └─────────────────────────────────────────────────────────┘
//! ```

use crate::graph::ThreatGraph;
use crate::risks::RiskCollection;
use crate::rules::base::{EvaluationSummary, ProgressCallback, RiskRule, RuleContext, RuleResult};
use crate::scoring::{AttractivenessEstimator, AttractivenessScores, WeightedAttractiveness};
use anyhow::Result;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything one evaluation run produced
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// Per-rule outcome, in registration order
    pub results: Vec<RuleResult>,
    pub summary: EvaluationSummary,
    /// All risks of successful rules, sorted by synthetic id
    pub risks: RiskCollection,
    /// Side table the rules were evaluated against
    pub attractiveness: AttractivenessScores,
}

impl EvaluationReport {
    /// Rules that failed or panicked, with their error message
    pub fn failed_rules(&self) -> Vec<(&str, &str)> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| (r.rule_id.as_str(), r.error.as_deref().unwrap_or("")))
            .collect()
    }
}

/// Orchestrates risk evaluation across all registered rules
pub struct RuleEngine {
    /// Registered rules
    rules: Vec<Arc<dyn RiskRule>>,
    /// Attractiveness policy run before the rules
    estimator: Arc<dyn AttractivenessEstimator>,
    /// Number of worker threads for parallel execution
    workers: usize,
    /// Progress callback for reporting execution status
    progress_callback: Option<ProgressCallback>,
}

impl RuleEngine {
    /// Create a new rule engine
    ///
    /// # Arguments
    /// * `workers` - Number of worker threads (0 = auto-detect)
    pub fn new(workers: usize) -> Self {
        let actual_workers = if workers == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
                .min(16)
        } else {
            workers
        };

        Self {
            rules: Vec::new(),
            estimator: Arc::new(WeightedAttractiveness::default()),
            workers: actual_workers,
            progress_callback: None,
        }
    }

    /// Replace the attractiveness estimator
    pub fn with_estimator(mut self, estimator: Arc<dyn AttractivenessEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Set a progress callback
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Register a single rule
    pub fn register(&mut self, rule: Arc<dyn RiskRule>) {
        debug!("Registered rule: {}", rule.id());
        self.rules.push(rule);
    }

    /// Register multiple rules
    pub fn register_all(&mut self, rules: impl IntoIterator<Item = Arc<dyn RiskRule>>) {
        for rule in rules {
            self.register(rule);
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn estimator_name(&self) -> &'static str {
        self.estimator.name()
    }

    /// Evaluate the graph with every registered rule
    ///
    /// Fails only when the graph is invalid or the worker pool cannot be
    /// built. A failing rule becomes a failed [`RuleResult`].
    pub fn evaluate(&self, graph: &ThreatGraph) -> Result<EvaluationReport> {
        let start = Instant::now();
        graph.validate()?;

        let attractiveness = self.estimator.estimate(graph);
        debug!(
            "Attractiveness estimated by {} for {} assets",
            self.estimator.name(),
            attractiveness.len()
        );
        let ctx = RuleContext::new(graph, &attractiveness);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        let total = self.rules.len();
        let completed = AtomicUsize::new(0);
        let results: Vec<RuleResult> = pool.install(|| {
            self.rules
                .par_iter()
                .map(|rule| {
                    let result = self.run_single_rule(rule, &ctx);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(rule.id(), done, total);
                    }
                    result
                })
                .collect()
        });

        let mut summary = EvaluationSummary::default();
        for result in &results {
            summary.add_result(result);
            if !result.success {
                warn!(
                    "Rule {} failed: {}",
                    result.rule_id,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        summary.total_duration_ms = start.elapsed().as_millis() as u64;

        let risks = RiskCollection::new(
            results
                .iter()
                .filter(|r| r.success)
                .flat_map(|r| r.risks.iter().cloned())
                .collect(),
        );

        info!(
            "Evaluated {} rules ({} failed), {} risks in {}ms",
            summary.rules_run,
            summary.rules_failed,
            risks.len(),
            summary.total_duration_ms
        );

        Ok(EvaluationReport {
            results,
            summary,
            risks,
            attractiveness,
        })
    }

    /// Run a single rule with error and panic isolation
    fn run_single_rule(&self, rule: &Arc<dyn RiskRule>, ctx: &RuleContext) -> RuleResult {
        let id = rule.id().to_string();
        let start = Instant::now();

        debug!("Running rule: {}", id);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            rule.generate_risks(ctx)
        }));

        let duration = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(Ok(risks)) => {
                debug!("Rule {} found {} risks in {}ms", id, risks.len(), duration);
                RuleResult::success(id, risks, duration)
            }
            Ok(Err(e)) => {
                debug!("Rule {} returned an error: {}", id, e);
                RuleResult::failure(id, e.to_string(), duration)
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                error!("Rule {} panicked: {}", id, panic_msg);
                RuleResult::failure(id, format!("Panic: {}", panic_msg), duration)
            }
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Builder for creating a configured RuleEngine
pub struct RuleEngineBuilder {
    workers: usize,
    estimator: Option<Arc<dyn AttractivenessEstimator>>,
    rules: Vec<Arc<dyn RiskRule>>,
}

impl RuleEngineBuilder {
    pub fn new() -> Self {
        Self {
            workers: 0,
            estimator: None,
            rules: Vec::new(),
        }
    }

    /// Set number of worker threads
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the attractiveness estimator
    pub fn estimator(mut self, estimator: Arc<dyn AttractivenessEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Add a rule
    pub fn rule(mut self, rule: Arc<dyn RiskRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add multiple rules
    pub fn rules(mut self, rules: impl IntoIterator<Item = Arc<dyn RiskRule>>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn build(self) -> RuleEngine {
        let mut engine = RuleEngine::new(self.workers);
        if let Some(estimator) = self.estimator {
            engine = engine.with_estimator(estimator);
        }
        engine.register_all(self.rules);
        engine
    }
}

impl Default for RuleEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, TechnicalAsset};
    use crate::models::test_support::TEST_CATEGORY;
    use crate::models::{Risk, RiskCategory};
    use crate::scoring::{ConstantAttractiveness, Impact, Likelihood};
    use anyhow::bail;
    use std::sync::Mutex;

    enum Behaviour {
        Emit(&'static [&'static str]),
        Fail,
        Panic,
    }

    struct MockRule {
        id: &'static str,
        behaviour: Behaviour,
    }

    impl RiskRule for MockRule {
        fn category(&self) -> RiskCategory {
            RiskCategory {
                id: self.id,
                ..TEST_CATEGORY
            }
        }

        fn generate_risks(&self, _ctx: &RuleContext) -> Result<Vec<Risk>> {
            match self.behaviour {
                Behaviour::Emit(ids) => Ok(ids
                    .iter()
                    .map(|id| {
                        Risk::new(self.category(), Likelihood::Likely, Impact::Medium, *id)
                            .identified_by(&[id])
                    })
                    .collect()),
                Behaviour::Fail => bail!("model not supported"),
                Behaviour::Panic => panic!("rule exploded"),
            }
        }
    }

    fn graph() -> ThreatGraph {
        GraphBuilder::new("t")
            .technical_asset(TechnicalAsset::new("a", "A"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_engine_creation() {
        let engine = RuleEngine::new(4);
        assert_eq!(engine.workers(), 4);
        assert_eq!(engine.rule_count(), 0);
        assert_eq!(engine.estimator_name(), "weighted");
    }

    #[test]
    fn test_engine_default_workers() {
        let engine = RuleEngine::new(0);
        assert!(engine.workers() > 0);
        assert!(engine.workers() <= 16);
    }

    #[test]
    fn test_builder() {
        let engine = RuleEngineBuilder::new()
            .workers(2)
            .estimator(Arc::new(ConstantAttractiveness::default()))
            .rule(Arc::new(MockRule {
                id: "first",
                behaviour: Behaviour::Emit(&[]),
            }))
            .build();

        assert_eq!(engine.workers(), 2);
        assert_eq!(engine.rule_ids(), vec!["first"]);
        assert_eq!(engine.estimator_name(), "constant");
    }

    #[test]
    fn test_failures_are_isolated() {
        let engine = RuleEngineBuilder::new()
            .workers(2)
            .rule(Arc::new(MockRule {
                id: "zeta",
                behaviour: Behaviour::Emit(&["z1", "a1"]),
            }))
            .rule(Arc::new(MockRule {
                id: "broken",
                behaviour: Behaviour::Fail,
            }))
            .rule(Arc::new(MockRule {
                id: "explosive",
                behaviour: Behaviour::Panic,
            }))
            .build();

        let report = engine.evaluate(&graph()).unwrap();

        assert_eq!(report.summary.rules_run, 3);
        assert_eq!(report.summary.rules_succeeded, 1);
        assert_eq!(report.summary.rules_failed, 2);
        assert_eq!(report.risks.len(), 2);
        let ids: Vec<&str> = report.risks.iter().map(|r| r.synthetic_id()).collect();
        assert_eq!(ids, vec!["zeta@a1", "zeta@z1"]);

        let failed = report.failed_rules();
        assert!(failed.contains(&("broken", "model not supported")));
        assert!(failed.contains(&("explosive", "Panic: rule exploded")));
    }

    #[test]
    fn test_progress_is_reported() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let engine = RuleEngineBuilder::new()
            .workers(1)
            .rule(Arc::new(MockRule {
                id: "only",
                behaviour: Behaviour::Emit(&["x"]),
            }))
            .build()
            .with_progress_callback(Box::new(move |id, done, total| {
                sink.lock().unwrap().push((id.to_string(), done, total));
            }));

        engine.evaluate(&graph()).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![("only".to_string(), 1, 1)]);
    }
}
