//! Two-operand and multi-operand adders against integer sums

use arithgen_netlist::{GenerationContext, Simulator};
use arithgen_ops::adder::{chunking, select_adder, AdderRequest, IntAdder};
use arithgen_ops::multi_adder::{IntMultiAdder, MultiAdderStrategy};
use arithgen_target::Target;
use malachite::Natural;
use proptest::prelude::*;

#[test]
fn more_slack_never_shrinks_the_first_chunk() {
    let target = Target::virtex5();
    let period = target.clock_period();
    let mut previous = 0;
    // arrival times from late to early: the available slack grows
    for step in (0..=20).rev() {
        let delay = period * step as f64 / 20.0;
        let first = target.suggest_slack_subadd_size(64, delay);
        if first.feasible {
            assert!(first.size >= previous, "delay {delay}");
            previous = first.size;
        }
        match chunking::with_first_chunk(&target, 64, delay) {
            Some(c) => assert_eq!(c.chunks.iter().sum::<usize>(), 64),
            None => assert!(!first.feasible),
        }
    }
}

#[test]
fn selection_stays_feasible_at_any_arrival_time() {
    let target = Target::virtex5();
    let period = target.clock_period();
    for width in [8, 33, 64, 128] {
        for step in 0..=30 {
            let delay = period * step as f64 / 15.0;
            let request = AdderRequest::new(width)
                .with_input_delay("X", delay)
                .with_input_delay("Y", delay / 2.0);
            let choice = select_adder(&target, &request).unwrap();
            assert_eq!(choice.variant.chunks().iter().sum::<usize>(), width);
        }
    }
}

#[test]
fn earlier_inputs_never_cost_more_cycles_or_delay() {
    let target = Target::virtex5();
    let period = target.clock_period();
    for width in [8, 33, 64, 128] {
        let mut previous: Option<(u32, f64)> = None;
        // arrival times from late to early
        for step in (0..=30).rev() {
            let delay = period * step as f64 / 30.0;
            let request = AdderRequest::new(width)
                .with_input_delay("X", delay)
                .with_input_delay("Y", delay);
            let mut ctx = GenerationContext::new();
            let adder = IntAdder::new(&target, &mut ctx, &request).unwrap();
            let component = ctx.component(adder.name()).unwrap();
            let current = (component.latency, component.output_delay);
            if let Some((latency, output_delay)) = previous {
                assert!(
                    current.0 < latency || (current.0 == latency && current.1 <= output_delay + 1e-9),
                    "w={width} delay={delay}: {current:?} after {:?}",
                    (latency, output_delay)
                );
            }
            previous = Some(current);
        }
    }
}

fn check_multi_adder(strategy: MultiAdderStrategy, operands: &[u128], width: usize) {
    let target = Target::virtex5();
    let mut ctx = GenerationContext::new();
    let adder = IntMultiAdder::new(&target, &mut ctx, operands.len(), width, Some(strategy)).unwrap();
    let component = ctx.component(adder.name()).unwrap();
    let names: Vec<String> = (0..operands.len()).map(|i| format!("X{i}")).collect();
    let mut inputs: Vec<(&str, u128)> = names
        .iter()
        .map(String::as_str)
        .zip(operands.iter().copied())
        .collect();
    inputs.push(("Cin", 0));
    let out = Simulator::new(&ctx).run_u128(component, &inputs).unwrap()["R"];
    let naturals: Vec<Natural> = operands.iter().map(|&v| Natural::from(v)).collect();
    assert_eq!(
        Natural::from(out),
        IntMultiAdder::emulate(width, &naturals, false),
        "{strategy} n={} w={width}",
        operands.len()
    );
}

fn operands_strategy() -> impl Strategy<Value = (usize, Vec<u128>)> {
    (
        prop::sample::select(vec![8usize, 16, 33]),
        prop::sample::select(vec![1usize, 2, 3, 5, 8]),
    )
        .prop_flat_map(|(width, n)| {
            (
                Just(width),
                prop::collection::vec(0u128..1u128 << width, n),
            )
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn multi_operand_sum_wraps((width, operands) in operands_strategy()) {
        check_multi_adder(MultiAdderStrategy::NAdder, &operands, width);
        check_multi_adder(MultiAdderStrategy::CompressorTree, &operands, width);
    }

    #[test]
    fn int_adder_sums_at_any_arrival_time(
        x in any::<u64>(),
        y in any::<u64>(),
        cin in 0u128..2,
        late in 0.0f64..1.5,
    ) {
        let target = Target::virtex4();
        let mut ctx = GenerationContext::new();
        let request = AdderRequest::new(64).with_input_delay("Y", late * target.clock_period());
        let adder = IntAdder::new(&target, &mut ctx, &request).unwrap();
        let component = ctx.component(adder.name()).unwrap();
        let out = Simulator::new(&ctx)
            .run_u128(component, &[("X", x as u128), ("Y", y as u128), ("Cin", cin)])
            .unwrap()["R"];
        prop_assert_eq!(out, (x as u128 + y as u128 + cin) & u64::MAX as u128);
    }
}
