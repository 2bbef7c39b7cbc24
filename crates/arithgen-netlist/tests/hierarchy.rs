//! Hierarchical emission and simulation

use arithgen_netlist::{ComponentBuilder, Expr, GenerationContext, Simulator};
use indexmap::IndexMap;
use proptest::prelude::*;

fn build_adder(ctx: &mut GenerationContext, width: usize) -> String {
    let mut b = ComponentBuilder::new(format!("add{width}"), 2.0, true);
    let x = b.add_input("X", width).unwrap();
    let y = b.add_input("Y", width).unwrap();
    let cin = b.add_input("Cin", 1).unwrap();
    let r = b.add_output("R", width).unwrap();
    b.manage_critical_path(1.0);
    b.assign(
        r,
        Expr::add(
            vec![Expr::signal(x), Expr::signal(y), Expr::signal(cin)],
            width,
        ),
    )
    .unwrap();
    ctx.register(b.finish().unwrap())
}

/// Three-operand sum built from two chained adder instances
fn build_chain(ctx: &mut GenerationContext, width: usize) -> String {
    let adder = build_adder(ctx, width);
    let mut b = ComponentBuilder::new(format!("chain{width}"), 2.0, true);
    let a = b.add_input("A", width).unwrap();
    let c = b.add_input("B", width).unwrap();
    let d = b.add_input("C", width).unwrap();
    let r = b.add_output("R", width).unwrap();

    let child = ctx.component(&adder).unwrap();
    let mut inputs = IndexMap::new();
    inputs.insert("X".to_string(), Expr::signal(a));
    inputs.insert("Y".to_string(), Expr::signal(c));
    inputs.insert("Cin".to_string(), Expr::zeros(1));
    let first = b.instantiate(child, "add_0", inputs, &[("R", "s0")]).unwrap()[0];
    b.sync_cycle_from_signal(first).unwrap();
    b.set_critical_path(child.output_delay);

    let mut inputs = IndexMap::new();
    inputs.insert("X".to_string(), Expr::signal(first));
    inputs.insert("Y".to_string(), Expr::signal(d));
    inputs.insert("Cin".to_string(), Expr::zeros(1));
    let second = b.instantiate(child, "add_1", inputs, &[("R", "s1")]).unwrap()[0];
    b.sync_cycle_from_signal(second).unwrap();
    b.assign(r, Expr::signal(second)).unwrap();
    ctx.register(b.finish().unwrap())
}

#[test]
fn test_chain_of_instances() {
    let mut ctx = GenerationContext::new();
    let name = build_chain(&mut ctx, 8);
    let top = ctx.component(&name).unwrap();
    let out = Simulator::new(&ctx)
        .run_u128(top, &[("A", 200), ("B", 50), ("C", 10)])
        .unwrap();
    assert_eq!(out["R"], (200 + 50 + 10) % 256);
    assert_eq!(ctx.len(), 2);
}

proptest! {
    #[test]
    fn prop_chain_matches_integer_sum(a in 0u128..(1 << 40), b in 0u128..(1 << 40), c in 0u128..(1 << 40)) {
        let mut ctx = GenerationContext::new();
        let name = build_chain(&mut ctx, 40);
        let top = ctx.component(&name).unwrap();
        let out = Simulator::new(&ctx)
            .run_u128(top, &[("A", a), ("B", b), ("C", c)])
            .unwrap();
        prop_assert_eq!(out["R"], (a + b + c) % (1 << 40));
    }
}
