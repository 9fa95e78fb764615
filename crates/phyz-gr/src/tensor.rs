//! Fixed-size component arrays for four-dimensional tensors.

use phyz_symbolic::Expr;

pub const DIM: usize = 4;

/// `[μ][ν]`
pub type Components2 = [[Expr; DIM]; DIM];
/// `[λ][μ][ν]`, upper index first.
pub type Components3 = [[[Expr; DIM]; DIM]; DIM];
/// `[ρ][σ][μ][ν]`, upper index first.
pub type Components4 = [[[[Expr; DIM]; DIM]; DIM]; DIM];

pub fn zeros2() -> Components2 {
    std::array::from_fn(|_| std::array::from_fn(|_| Expr::zero()))
}

pub fn zeros3() -> Components3 {
    std::array::from_fn(|_| zeros2())
}

pub fn zeros4() -> Components4 {
    std::array::from_fn(|_| zeros3())
}

/// Number of components that are not the literal zero.
pub(crate) fn count_nonzero<'a>(items: impl IntoIterator<Item = &'a Expr>) -> usize {
    items.into_iter().filter(|e| !e.is_zero()).count()
}

pub(crate) fn iter2(t: &Components2) -> impl Iterator<Item = &Expr> {
    t.iter().flatten()
}

pub(crate) fn iter3(t: &Components3) -> impl Iterator<Item = &Expr> {
    t.iter().flatten().flatten()
}

pub(crate) fn iter4(t: &Components4) -> impl Iterator<Item = &Expr> {
    t.iter().flatten().flatten().flatten()
}
