//! Weighted bit accumulation
//!
//! A [`BitHeap`] collects single-bit contributions at integer weights and
//! compresses them into one two's-complement sum modulo `2^width`.
//! Constant ones are folded into a single exact constant before any
//! hardware is emitted; negation is expressed by complemented bits plus
//! compensating constant ones.

use arithgen_netlist::{ComponentBuilder, Expr, GenerationContext, SignalId, Timing};
use arithgen_target::Target;
use malachite::base::num::arithmetic::traits::PowerOf2;
use malachite::base::num::logic::traits::BitAccess;
use malachite::Integer;
use tracing::{debug, trace};

use super::compressor::{compressor_outputs, CompressorSearch};
use crate::adder;
use crate::error::Result;
use crate::numeric;

/// Where a heap bit comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitSource {
    Wire { signal: SignalId, bit: usize },
    NotWire { signal: SignalId, bit: usize },
    One,
}

impl BitSource {
    fn to_expr(&self) -> Expr {
        match self {
            BitSource::Wire { signal, bit } => Expr::bit(*signal, *bit),
            BitSource::NotWire { signal, bit } => Expr::bit(*signal, *bit).not(),
            BitSource::One => Expr::ones(1),
        }
    }

    fn signal(&self) -> Option<SignalId> {
        match self {
            BitSource::Wire { signal, .. } | BitSource::NotWire { signal, .. } => Some(*signal),
            BitSource::One => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BitHeap {
    uid: u64,
    min_weight: usize,
    max_weight: usize,
    /// Variable bits, indexed by `weight - min_weight`
    columns: Vec<Vec<BitSource>>,
    /// Sum of all constant contributions, relative to `min_weight`
    constant: Integer,
}

impl BitHeap {
    /// Heap covering weights `0..width`
    pub fn new(ctx: &mut GenerationContext, width: usize) -> Self {
        Self::with_weights(ctx, 0, width.saturating_sub(1))
    }

    /// Heap covering weights `min_weight..=max_weight`
    pub fn with_weights(ctx: &mut GenerationContext, min_weight: usize, max_weight: usize) -> Self {
        assert!(min_weight <= max_weight, "empty bit heap");
        Self {
            uid: ctx.next_uid(),
            min_weight,
            max_weight,
            columns: vec![Vec::new(); max_weight - min_weight + 1],
            constant: Integer::from(0u32),
        }
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn min_weight(&self) -> usize {
        self.min_weight
    }

    pub fn max_weight(&self) -> usize {
        self.max_weight
    }

    pub fn width(&self) -> usize {
        self.max_weight - self.min_weight + 1
    }

    /// Name of the sum signal produced by [`BitHeap::compress`]
    pub fn sum_name(&self) -> String {
        format!("heap{}_sum", self.uid)
    }

    /// Variable bits currently in the column of `weight`
    pub fn height(&self, weight: usize) -> usize {
        self.columns[weight - self.min_weight].len()
    }

    pub fn add_bit(&mut self, weight: usize, source: BitSource) {
        assert!(
            (self.min_weight..=self.max_weight).contains(&weight),
            "bit weight {weight} outside heap [{}, {}]",
            self.min_weight,
            self.max_weight
        );
        match source {
            BitSource::One => self.constant += Integer::power_of_2((weight - self.min_weight) as u64),
            other => self.columns[weight - self.min_weight].push(other),
        }
    }

    pub fn add_constant_one_bit(&mut self, weight: usize) {
        self.add_bit(weight, BitSource::One);
    }

    /// Add `value * 2^weight`; parts above the heap vanish
    pub fn add_constant(&mut self, value: &Integer, weight: usize) {
        assert!(weight >= self.min_weight, "constant below the heap");
        if weight <= self.max_weight {
            self.constant += value * Integer::power_of_2((weight - self.min_weight) as u64);
        }
    }

    /// Add bits `0..size` of `signal` as an unsigned number at `weight`
    pub fn add_unsigned_bit_vector(&mut self, weight: usize, signal: SignalId, size: usize) {
        for bit in 0..size {
            if weight + bit <= self.max_weight {
                self.add_bit(weight + bit, BitSource::Wire { signal, bit });
            }
        }
    }

    /// Subtract bits `0..size` of `signal`, read as unsigned, at `weight`
    pub fn subtract_unsigned_bit_vector(&mut self, weight: usize, signal: SignalId, size: usize) {
        for bit in 0..size {
            if weight + bit <= self.max_weight {
                self.add_bit(weight + bit, BitSource::NotWire { signal, bit });
            }
        }
        self.add_ones_from(weight + size);
        self.add_constant_one_bit(weight);
    }

    /// Add bits `0..size` of `signal` as a two's-complement number at `weight`
    pub fn add_signed_bit_vector(&mut self, weight: usize, signal: SignalId, size: usize) {
        if size == 0 {
            return;
        }
        for bit in 0..size - 1 {
            if weight + bit <= self.max_weight {
                self.add_bit(weight + bit, BitSource::Wire { signal, bit });
            }
        }
        let msb = weight + size - 1;
        if msb <= self.max_weight {
            self.add_bit(
                msb,
                BitSource::NotWire {
                    signal,
                    bit: size - 1,
                },
            );
        }
        self.add_ones_from(msb);
    }

    /// Subtract bits `0..size` of `signal`, read as two's complement, at `weight`
    pub fn subtract_signed_bit_vector(&mut self, weight: usize, signal: SignalId, size: usize) {
        if size == 0 {
            return;
        }
        for bit in 0..size - 1 {
            if weight + bit <= self.max_weight {
                self.add_bit(weight + bit, BitSource::NotWire { signal, bit });
            }
        }
        let msb = weight + size - 1;
        if msb <= self.max_weight {
            // complementing then sign-extending the complement cancels out on the MSB
            self.add_bit(
                msb,
                BitSource::Wire {
                    signal,
                    bit: size - 1,
                },
            );
        }
        self.add_ones_from(msb);
        self.add_constant_one_bit(weight);
    }

    /// Constant ones from `weight` up to the top of the heap
    pub fn add_ones_from(&mut self, weight: usize) {
        for w in weight..=self.max_weight {
            self.add_constant_one_bit(w);
        }
    }

    /// Emit the compression network and return the `width`-bit sum
    ///
    /// Compression starts once the last contributing signal is available.
    pub fn compress(
        self,
        builder: &mut ComponentBuilder,
        target: &Target,
        ctx: &mut GenerationContext,
    ) -> Result<SignalId> {
        let width = self.width();
        let uid = self.uid;
        let sum_name = self.sum_name();

        let mut ready: Option<Timing> = None;
        for source in self.columns.iter().flatten() {
            if let Some(signal) = source.signal() {
                let t = builder.timing(signal)?;
                ready = Some(ready.map_or(t, |r| r.latest(t)));
            }
        }
        if let Some(t) = ready {
            builder.sync_to(t);
        }

        let folded = numeric::wrap(&self.constant, width);
        let mut columns: Vec<Vec<Expr>> = self
            .columns
            .iter()
            .map(|c| c.iter().map(BitSource::to_expr).collect())
            .collect();
        for (w, column) in columns.iter_mut().enumerate() {
            if folded.get_bit(w as u64) {
                column.push(Expr::ones(1));
            }
        }
        debug!(
            heap = uid,
            width,
            bits = columns.iter().map(Vec::len).sum::<usize>(),
            max_height = columns.iter().map(Vec::len).max().unwrap_or(0),
            "compressing bit heap"
        );

        let mut search = CompressorSearch::new(target.lut_inputs().max(3));
        let mut stage = 0;
        while columns.iter().any(|c| c.len() > 2) {
            builder.manage_critical_path(target.lut_delay() + target.local_wire_delay());
            let mut next: Vec<Vec<Expr>> = vec![Vec::new(); width];
            for (w, column) in columns.into_iter().enumerate() {
                if column.is_empty() {
                    continue;
                }
                let partition = search.best(column.len());
                let mut bits = column.into_iter();
                for (i, k) in partition.sizes().enumerate() {
                    let group: Vec<Expr> = bits.by_ref().take(k).collect();
                    if k == 1 {
                        next[w].extend(group);
                        continue;
                    }
                    let outs = compressor_outputs(k);
                    let name = format!("heap{uid}_s{stage}_w{w}_c{i}");
                    let counted = builder.declare(&name, outs, Expr::add(group, outs))?;
                    for j in 0..outs {
                        if w + j < width {
                            next[w + j].push(Expr::bit(counted, j));
                        }
                    }
                }
            }
            trace!(
                heap = uid,
                stage,
                max_height = next.iter().map(Vec::len).max().unwrap_or(0),
                "compression stage"
            );
            columns = next;
            stage += 1;
        }
        debug!(heap = uid, stages = stage, "bit heap reduced to two rows");

        let bit_or_zero = |column: &[Expr], i: usize| column.get(i).cloned().unwrap_or_else(|| Expr::zeros(1));
        let first_double = columns.iter().position(|c| c.len() == 2);
        let low_width = first_double.unwrap_or(width);
        let low: Vec<Expr> = columns[..low_width]
            .iter()
            .rev()
            .map(|c| bit_or_zero(c, 0))
            .collect();

        let sum = match first_double {
            None => builder.declare(&sum_name, width, Expr::concat(low))?,
            Some(f) => {
                let high_width = width - f;
                let row = |i: usize| {
                    Expr::concat(columns[f..].iter().rev().map(|c| bit_or_zero(c, i)).collect())
                };
                let op0 = builder.declare(&format!("heap{uid}_op0"), high_width, row(0))?;
                let op1 = builder.declare(&format!("heap{uid}_op1"), high_width, row(1))?;
                let high = if high_width == 1 {
                    builder.manage_critical_path(target.lut_delay());
                    builder.declare(
                        &format!("heap{uid}_high"),
                        1,
                        Expr::signal(op0).xor(Expr::signal(op1)),
                    )?
                } else {
                    adder::emit_addition(
                        builder,
                        target,
                        ctx,
                        adder::AdditionOperands {
                            x: Expr::signal(op0),
                            y: Expr::signal(op1),
                            carry_in: Expr::zeros(1),
                            width: high_width,
                            label: format!("heap{uid}_adder"),
                            result: format!("heap{uid}_high"),
                        },
                    )?
                };
                let mut parts = vec![Expr::signal(high)];
                parts.extend(low);
                builder.declare(&sum_name, width, Expr::concat(parts))?
            }
        };
        Ok(sum)
    }
}
