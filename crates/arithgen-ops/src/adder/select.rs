//! Choosing an adder architecture

use arithgen_target::Target;
use serde::Serialize;
use tracing::{debug, trace};

use super::chunking::InputTiming;
use super::short_latency::ShortLatencyPlan;
use super::{alternative, classical, short_latency, AdderObjective, AdderRequest, ChunkPlan};
use crate::error::{GenerationError, Result};

/// A costed architecture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AdderVariant {
    Classical(ChunkPlan),
    Alternative(ChunkPlan),
    ShortLatency(ShortLatencyPlan),
}

impl AdderVariant {
    /// Component name prefix
    pub fn kind(&self) -> &'static str {
        match self {
            AdderVariant::Classical(_) => "IntAdderClassical",
            AdderVariant::Alternative(_) => "IntAdderAlternative",
            AdderVariant::ShortLatency(_) => "IntAdderShortLatency",
        }
    }

    pub fn cost(&self) -> i64 {
        match self {
            AdderVariant::Classical(p) | AdderVariant::Alternative(p) => p.cost,
            AdderVariant::ShortLatency(p) => p.cost,
        }
    }

    pub fn chunks(&self) -> &[usize] {
        match self {
            AdderVariant::Classical(p) | AdderVariant::Alternative(p) => &p.chunks,
            AdderVariant::ShortLatency(p) => &p.chunks,
        }
    }
}

/// The selected architecture and the operand timing it was costed for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdderChoice {
    pub variant: AdderVariant,
    pub timing: InputTiming,
}

/// Every implementable architecture for `width` bits
pub fn candidates(
    target: &Target,
    width: usize,
    timing: &InputTiming,
    objective: AdderObjective,
    srl: bool,
) -> Vec<AdderVariant> {
    let mut variants = vec![
        AdderVariant::Classical(classical::plan(target, width, timing, objective, srl)),
        AdderVariant::Alternative(alternative::plan(target, width, timing, objective, srl)),
    ];
    if let Some(plan) = short_latency::plan(target, width, timing, objective, srl) {
        variants.push(AdderVariant::ShortLatency(plan));
    }
    variants
}

/// Cheapest architecture for `request`; ties go to fewer chunks
pub fn select_adder(target: &Target, request: &AdderRequest) -> Result<AdderChoice> {
    let width = request.width;
    if !target.suggest_subadd_size(width).feasible {
        return Err(GenerationError::AdditionInfeasible {
            width,
            frequency_mhz: target.frequency_mhz,
        });
    }
    let srl = request.use_srl.unwrap_or(target.has_srl);
    let timing = InputTiming::new(target, request.max_input_delay());

    let variants = candidates(target, width, &timing, request.objective, srl);
    for v in &variants {
        trace!(variant = v.kind(), cost = v.cost(), chunks = ?v.chunks(), "adder candidate");
    }
    let best = variants
        .into_iter()
        .min_by_key(|v| (v.cost(), v.chunks().len()))
        .ok_or(GenerationError::AdditionInfeasible {
            width,
            frequency_mhz: target.frequency_mhz,
        })?;
    debug!(
        width,
        objective = %request.objective,
        variant = best.kind(),
        cost = best.cost(),
        chunks = ?best.chunks(),
        "adder selected"
    );
    Ok(AdderChoice {
        variant: best,
        timing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_is_cheapest() {
        let target = Target::virtex5();
        for width in [8, 40, 64, 100, 300] {
            for objective in [
                AdderObjective::Luts,
                AdderObjective::Registers,
                AdderObjective::Slices,
            ] {
                let request = AdderRequest::new(width).with_objective(objective);
                let choice = select_adder(&target, &request).unwrap();
                let timing = InputTiming::new(&target, 0.0);
                let min = candidates(&target, width, &timing, objective, true)
                    .iter()
                    .map(AdderVariant::cost)
                    .min()
                    .unwrap();
                assert_eq!(choice.variant.cost(), min);
                assert_eq!(choice.variant.chunks().iter().sum::<usize>(), width);
            }
        }
    }

    #[test]
    fn test_small_adder_is_one_chunk() {
        let target = Target::virtex5();
        let choice = select_adder(&target, &AdderRequest::new(16)).unwrap();
        // ties with the two-halves carry-select adder on slices
        assert!(matches!(choice.variant, AdderVariant::Classical(_)));
        assert_eq!(choice.variant.chunks(), &[16]);
    }

    #[test]
    fn test_infeasible_frequency() {
        let target = Target::virtex5().with_frequency_mhz(900.0).unwrap();
        let err = select_adder(&target, &AdderRequest::new(32)).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::AdditionInfeasible { width: 32, .. }
        ));
    }
}
