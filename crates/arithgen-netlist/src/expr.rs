//! Combinational expressions
//!
//! Expressions are trees over previously declared signals. Widths are not
//! stored in the tree; [`crate::Component::expr_width`] derives and checks
//! them against the owning component.

use serde::{Deserialize, Serialize};

use crate::bits::{self, Bits};
use crate::signal::SignalId;

/// A combinational expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Whole signal
    Signal(SignalId),
    /// Literal bits
    Const(Bits),
    /// Bits `hi..=lo` of an operand
    Slice { expr: Box<Expr>, hi: usize, lo: usize },
    /// Concatenation, most significant part first
    Concat(Vec<Expr>),
    /// Bitwise complement
    Not(Box<Expr>),
    /// Bitwise AND of equal-width operands
    And(Box<Expr>, Box<Expr>),
    /// Bitwise OR of equal-width operands
    Or(Box<Expr>, Box<Expr>),
    /// Bitwise XOR of equal-width operands
    Xor(Box<Expr>, Box<Expr>),
    /// Sum modulo `2^width`; each term is zero-extended or truncated to `width`
    Add { terms: Vec<Expr>, width: usize },
    /// `select ? if_one : if_zero` with a 1-bit select
    Mux {
        select: Box<Expr>,
        if_one: Box<Expr>,
        if_zero: Box<Expr>,
    },
    /// Read a lookup table of the owning component
    Lookup { index: Box<Expr>, table: usize },
}

impl Expr {
    pub fn signal(id: SignalId) -> Self {
        Expr::Signal(id)
    }

    /// Single bit of a signal
    pub fn bit(id: SignalId, index: usize) -> Self {
        Expr::Slice {
            expr: Box::new(Expr::Signal(id)),
            hi: index,
            lo: index,
        }
    }

    /// Bits `hi..=lo` of a signal
    pub fn range(id: SignalId, hi: usize, lo: usize) -> Self {
        Expr::Slice {
            expr: Box::new(Expr::Signal(id)),
            hi,
            lo,
        }
    }

    pub fn constant_u64(value: u64, width: usize) -> Self {
        Expr::Const(bits::from_u128(value as u128, width))
    }

    pub fn zeros(width: usize) -> Self {
        Expr::Const(Bits::repeat(false, width))
    }

    pub fn ones(width: usize) -> Self {
        Expr::Const(Bits::repeat(true, width))
    }

    pub fn slice(self, hi: usize, lo: usize) -> Self {
        Expr::Slice {
            expr: Box::new(self),
            hi,
            lo,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    pub fn xor(self, other: Expr) -> Self {
        Expr::Xor(Box::new(self), Box::new(other))
    }

    pub fn and(self, other: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(other))
    }

    pub fn concat(parts: Vec<Expr>) -> Self {
        Expr::Concat(parts)
    }

    pub fn add(terms: Vec<Expr>, width: usize) -> Self {
        Expr::Add { terms, width }
    }

    pub fn mux(select: Expr, if_one: Expr, if_zero: Expr) -> Self {
        Expr::Mux {
            select: Box::new(select),
            if_one: Box::new(if_one),
            if_zero: Box::new(if_zero),
        }
    }

    pub fn lookup(index: Expr, table: usize) -> Self {
        Expr::Lookup {
            index: Box::new(index),
            table,
        }
    }

    /// Widen a `width`-bit operand to `to` bits with zeros
    pub fn zero_extend(self, width: usize, to: usize) -> Self {
        if to <= width {
            return self;
        }
        Expr::Concat(vec![Expr::zeros(to - width), self])
    }

    /// Widen a `width`-bit operand to `to` bits by replicating its MSB
    pub fn sign_extend(self, width: usize, to: usize) -> Self {
        if to <= width || width == 0 {
            return self;
        }
        let msb = self.clone().slice(width - 1, width - 1);
        let mut parts = vec![msb; to - width];
        parts.push(self);
        Expr::Concat(parts)
    }

    /// Signals read by this expression
    pub fn signals(&self, out: &mut Vec<SignalId>) {
        match self {
            Expr::Signal(id) => out.push(*id),
            Expr::Const(_) => {}
            Expr::Slice { expr, .. } | Expr::Not(expr) => expr.signals(out),
            Expr::Concat(parts) | Expr::Add { terms: parts, .. } => {
                for part in parts {
                    part.signals(out);
                }
            }
            Expr::And(a, b) | Expr::Or(a, b) | Expr::Xor(a, b) => {
                a.signals(out);
                b.signals(out);
            }
            Expr::Mux {
                select,
                if_one,
                if_zero,
            } => {
                select.signals(out);
                if_one.signals(out);
                if_zero.signals(out);
            }
            Expr::Lookup { index, .. } => index.signals(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_signals() {
        let e = Expr::add(
            vec![
                Expr::signal(SignalId(0)),
                Expr::bit(SignalId(2), 3).xor(Expr::ones(1)),
            ],
            8,
        );
        let mut seen = Vec::new();
        e.signals(&mut seen);
        assert_eq!(seen, vec![SignalId(0), SignalId(2)]);
    }

    #[test]
    fn test_extend_noop_when_wide_enough() {
        let e = Expr::signal(SignalId(1));
        assert_eq!(e.clone().zero_extend(8, 8), e);
        assert_eq!(e.clone().sign_extend(8, 4), e);
    }

    #[test]
    fn test_sign_extend_shape() {
        let e = Expr::signal(SignalId(1)).sign_extend(4, 6);
        match e {
            Expr::Concat(parts) => assert_eq!(parts.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
    }
}
