//! Fixed-capacity correction history and the two-loop recursion.
//!
//! The history keeps the `m` most recent pairs
//!
//! ```text
//! sₖ = xₖ₊₁ − xₖ        (step actually taken)
//! yₖ = gₖ₊₁ − gₖ        (gradient change)
//! ρₖ = 1 / ⟨yₖ, sₖ⟩
//! ```
//!
//! in two circular buffers of preallocated vectors. Once full, every new
//! pair overwrites the oldest one.
//!
//! ## Two-Loop Recursion
//!
//! ```text
//! q = −g
//! for i = newest … oldest:
//!     αᵢ = ρᵢ ⟨sᵢ, q⟩
//!     q  = q − αᵢ yᵢ
//! q = D q                  // diagonal initial inverse Hessian
//! for i = oldest … newest:
//!     β = ρᵢ ⟨yᵢ, q⟩
//!     q = q + (αᵢ − β) sᵢ
//! d = q
//! ```
//!
//! The result equals `−H g` for the BFGS inverse Hessian `H` obtained by
//! applying the stored updates, oldest first, to `D`, at O(n·m) cost.

use lbfgsrc_core::types::{DVector, Scalar};

/// Circular buffer of the most recent correction pairs.
#[derive(Debug, Clone)]
pub struct CorrectionHistory<T>
where
    T: Scalar,
{
    s: Vec<DVector<T>>,
    y: Vec<DVector<T>>,
    rho: Vec<T>,
    /// Scratch for the first loop
    alpha: Vec<T>,
    /// Slot the next pair is written to
    head: usize,
    len: usize,
}

impl<T> CorrectionHistory<T>
where
    T: Scalar,
{
    /// Allocates room for `capacity` pairs of length `n`.
    pub fn new(n: usize, capacity: usize) -> Self {
        Self {
            s: vec![DVector::zeros(n); capacity],
            y: vec![DVector::zeros(n); capacity],
            rho: vec![T::zero(); capacity],
            alpha: vec![T::zero(); capacity],
            head: 0,
            len: 0,
        }
    }

    /// Maximum number of stored pairs.
    pub fn capacity(&self) -> usize {
        self.s.len()
    }

    /// Number of stored pairs, `min(pushed, capacity)`.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no pair has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forgets every stored pair. Storage is kept.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Stores `(s, y)`, evicting the oldest pair when full, and returns `⟨y, s⟩`.
    pub fn push(&mut self, s: &DVector<T>, y: &DVector<T>) -> T {
        let slot = self.head;
        self.s[slot].copy_from(s);
        self.y[slot].copy_from(y);
        self.commit()
    }

    /// Stores `s = step · direction` and `y = gradient − previous_gradient`
    /// without temporaries, and returns `⟨y, s⟩`.
    pub fn push_step(
        &mut self,
        step: T,
        direction: &DVector<T>,
        gradient: &DVector<T>,
        previous_gradient: &DVector<T>,
    ) -> T {
        let slot = self.head;
        self.s[slot].copy_from(direction);
        self.s[slot] *= step;
        self.y[slot].copy_from(gradient);
        self.y[slot] -= previous_gradient;
        self.commit()
    }

    fn commit(&mut self) -> T {
        let slot = self.head;
        let ys = self.y[slot].dot(&self.s[slot]);
        self.rho[slot] = T::one() / ys;
        self.head = (slot + 1) % self.capacity();
        self.len = (self.len + 1).min(self.capacity());
        ys
    }

    fn newest_slot(&self) -> usize {
        (self.head + self.capacity() - 1) % self.capacity()
    }

    /// The most recent `(s, y)` pair.
    pub fn latest(&self) -> Option<(&DVector<T>, &DVector<T>)> {
        if self.is_empty() {
            return None;
        }
        let slot = self.newest_slot();
        Some((&self.s[slot], &self.y[slot]))
    }

    /// Stored pairs from oldest to newest.
    pub fn pairs(&self) -> impl Iterator<Item = (&DVector<T>, &DVector<T>)> + '_ {
        let capacity = self.capacity();
        let oldest = (self.head + capacity - self.len) % capacity.max(1);
        (0..self.len).map(move |k| {
            let slot = (oldest + k) % capacity;
            (&self.s[slot], &self.y[slot])
        })
    }

    /// Writes `−H g` into `direction`, with `diag` as the initial inverse Hessian.
    pub fn two_loop(&mut self, gradient: &DVector<T>, diag: &DVector<T>, direction: &mut DVector<T>) {
        direction.copy_from(gradient);
        direction.neg_mut();

        let capacity = self.capacity();
        let newest = if capacity == 0 { 0 } else { self.newest_slot() };

        for k in 0..self.len {
            let slot = (newest + capacity - k) % capacity;
            let alpha = self.rho[slot] * self.s[slot].dot(direction);
            direction.axpy(-alpha, &self.y[slot], T::one());
            self.alpha[slot] = alpha;
        }

        direction.component_mul_assign(diag);

        for k in (0..self.len).rev() {
            let slot = (newest + capacity - k) % capacity;
            let beta = self.rho[slot] * self.y[slot].dot(direction);
            direction.axpy(self.alpha[slot] - beta, &self.s[slot], T::one());
        }
    }
}
