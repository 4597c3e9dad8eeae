//! Optimizer: filters to hard-eligible trains, scores and
//! ranks them with a deterministic tie-break, and packages the result.

use chrono::{DateTime, Utc};
use std::time::Instant;

use crate::constraint_evaluator;
use crate::model::{
    AiModelInfo, ConstraintAttribution, EvaluatedConstraints, OptimizationMetrics,
    OptimizationResult, RankedEntry, Train,
};
use crate::scorer::{self, FleetContext};

/// Run the local rule-based optimizer over a candidate fleet.
///
/// Tolerates an empty `trains` slice by returning an empty ranking; the
/// Plan Service, not the Optimizer, is responsible for rejecting an empty
/// fleet as a `BadRequest`.
pub fn optimize(trains: &[Train], constraints: &serde_json::Value, now: DateTime<Utc>) -> OptimizationResult {
    let started = Instant::now();

    let evaluated: Vec<(&Train, EvaluatedConstraints)> =
        trains.iter().map(|t| (t, constraint_evaluator::evaluate(t, now))).collect();

    let eligible: Vec<&(&Train, EvaluatedConstraints)> =
        evaluated.iter().filter(|(_, eval)| eval.hard_eligible).collect();

    if eligible.is_empty() {
        return OptimizationResult {
            ranked_trains: Vec::new(),
            metrics: OptimizationMetrics {
                total_trains_evaluated: trains.len() as u32,
                constraints_satisfied: 0,
                average_confidence: 0.0,
                processing_time_ms: started.elapsed().as_millis() as u64,
            },
            model_info: AiModelInfo::local_fallback(constraints.clone()),
        };
    }

    let pool: Vec<&Train> = eligible.iter().map(|(t, _)| *t).collect();
    let ctx = FleetContext::from_pool(&pool, now);

    let mut scored: Vec<(&Train, EvaluatedConstraints, scorer::ScoredTrain)> = eligible
        .iter()
        .map(|(t, eval)| {
            let s = scorer::score(t, eval, &ctx);
            (*t, *eval, s)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.2.score
            .partial_cmp(&a.2.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.code.cmp(&b.0.code))
    });

    let ranked_trains: Vec<RankedEntry> = scored
        .iter()
        .enumerate()
        .map(|(i, (train, eval, scored))| RankedEntry {
            train_ref: train.train_ref(),
            rank: (i + 1) as u32,
            reasoning: scored.reasoning.clone(),
            confidence_score: scored.confidence,
            constraints: ConstraintAttribution {
                fitness_valid: eval.fitness_valid,
                maintenance_ready: eval.maintenance_ready,
                cleaning_status: train.cleaning.status,
                branding_priority: train.branding.priority,
                mileage_balance: scored.mileage_balance,
            },
        })
        .collect();

    let average_confidence = if ranked_trains.is_empty() {
        0.0
    } else {
        ranked_trains.iter().map(|e| e.confidence_score as f64).sum::<f64>() / ranked_trains.len() as f64
    };

    let metrics = OptimizationMetrics {
        total_trains_evaluated: trains.len() as u32,
        constraints_satisfied: ranked_trains.len() as u32,
        average_confidence,
        processing_time_ms: started.elapsed().as_millis() as u64,
    };

    OptimizationResult {
        ranked_trains,
        metrics,
        model_info: AiModelInfo::local_fallback(constraints.clone()),
    }
}
