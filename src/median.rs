use std::{cmp::Reverse, collections::BinaryHeap};

use num::Integer;

/// Running median, count and total over a stream of integer amounts.
///
/// Amounts are split between a max-heap holding the lower half and a
/// min-heap holding the upper half. The lower half always holds the same
/// number of amounts as the upper half, or exactly one more, and no amount
/// in the lower half exceeds any amount in the upper half.
///
/// A tracker is built from its first amount, so it is never empty.
#[derive(Clone, Debug)]
pub struct RunningMedian {
    lower: BinaryHeap<i64>,
    upper: BinaryHeap<Reverse<i64>>,
    count: usize,
    total: i128,
}

impl RunningMedian {
    pub fn new(first: i64) -> RunningMedian {
        let mut lower = BinaryHeap::new();
        lower.push(first);
        RunningMedian {
            lower,
            upper: BinaryHeap::new(),
            count: 1,
            total: first as i128,
        }
    }

    pub fn insert(&mut self, amount: i64) {
        self.count += 1;
        self.total += amount as i128;

        match self.lower.peek() {
            Some(&lower_max) if amount > lower_max => self.upper.push(Reverse(amount)),
            _ => self.lower.push(amount),
        }

        while self.lower.len() > self.upper.len() + 1 {
            if let Some(x) = self.lower.pop() {
                self.upper.push(Reverse(x));
            }
        }
        while self.upper.len() > self.lower.len() {
            if let Some(Reverse(x)) = self.upper.pop() {
                self.lower.push(x);
            }
        }
    }

    /// The median, with the midpoint of an even-sized set rounded half up.
    pub fn median(&self) -> i64 {
        match (self.lower.peek(), self.upper.peek()) {
            (None, _) => unreachable!("running median with no amounts"),
            (Some(&lo), Some(&Reverse(hi))) if self.lower.len() == self.upper.len() => {
                midpoint(lo, hi)
            }
            (Some(&lo), _) => lo,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn total(&self) -> i128 {
        self.total
    }
}

// (a + b) / 2 rounded towards +inf, without overflowing i64.
fn midpoint(a: i64, b: i64) -> i64 {
    let (qa, ra) = a.div_mod_floor(&2);
    let (qb, rb) = b.div_mod_floor(&2);
    qa + qb + (ra + rb + 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn check_halves(m: &RunningMedian) {
        let nl = m.lower.len();
        let nu = m.upper.len();
        assert!(nl == nu || nl == nu + 1, "lower={} upper={}", nl, nu);
        if let (Some(lo), Some(Reverse(hi))) = (m.lower.peek(), m.upper.peek()) {
            assert!(lo <= hi, "lower max {} above upper min {}", lo, hi);
        }
    }

    fn sorted_median(xs: &[i64]) -> i64 {
        let mut v = xs.to_vec();
        v.sort();
        let n = v.len();
        if n % 2 == 1 {
            v[n / 2]
        } else {
            let s = v[n / 2 - 1] as i128 + v[n / 2] as i128;
            s.div_floor(&2) as i64 + if s.is_odd() { 1 } else { 0 }
        }
    }

    #[test]
    fn test_midpoint_1() {
        assert_eq!(midpoint(3, 4), 4);
        assert_eq!(midpoint(100, 200), 150);
        assert_eq!(midpoint(1, 2), 2);
        assert_eq!(midpoint(5, 5), 5);
        assert_eq!(midpoint(-3, -2), -2);
        assert_eq!(midpoint(-1, 0), 0);
        assert_eq!(midpoint(-4, 1), -1);
    }

    #[test]
    fn test_midpoint_2() {
        assert_eq!(midpoint(i64::MAX, i64::MAX), i64::MAX);
        assert_eq!(midpoint(i64::MIN, i64::MIN), i64::MIN);
        assert_eq!(midpoint(i64::MAX - 1, i64::MAX), i64::MAX);
        assert_eq!(midpoint(i64::MIN, i64::MAX), 0);
    }

    #[test]
    fn test_median_1() {
        let mut m = RunningMedian::new(100);
        assert_eq!((m.median(), m.count(), m.total()), (100, 1, 100));
        m.insert(200);
        assert_eq!((m.median(), m.count(), m.total()), (150, 2, 300));
        m.insert(300);
        assert_eq!((m.median(), m.count(), m.total()), (200, 3, 600));
    }

    #[test]
    fn test_median_2() {
        // descending input keeps pushing into the lower half
        let mut m = RunningMedian::new(50);
        for x in [40, 30, 20, 10] {
            m.insert(x);
            check_halves(&m);
        }
        assert_eq!(m.median(), 30);
        assert_eq!(m.count(), 5);
        assert_eq!(m.total(), 150);
    }

    #[test]
    fn test_median_3() {
        let mut m = RunningMedian::new(7);
        for _ in 0..6 {
            m.insert(7);
            check_halves(&m);
            assert_eq!(m.median(), 7);
        }
        m.insert(0);
        m.insert(-7);
        assert_eq!(m.median(), 7);
        assert_eq!(m.total(), 42);
    }

    #[test]
    fn test_median_4() {
        let mut m = RunningMedian::new(3);
        m.insert(4);
        assert_eq!(m.median(), 4);
        m.insert(-10);
        assert_eq!(m.median(), 3);
        m.insert(-11);
        assert_eq!(m.median(), -3);
    }

    #[test]
    fn test_median_5() {
        let mut m = RunningMedian::new(i64::MAX);
        m.insert(i64::MAX);
        m.insert(i64::MAX);
        assert_eq!(m.median(), i64::MAX);
        assert_eq!(m.total(), 3 * (i64::MAX as i128));
    }

    #[test]
    fn test_median_random_1() {
        let mut rng = StdRng::seed_from_u64(19);
        for _ in 0..50 {
            let n: usize = rng.gen_range(1..200);
            let xs: Vec<i64> = (0..n).map(|_| rng.gen_range(-1000..1000)).collect();
            let mut m = RunningMedian::new(xs[0]);
            check_halves(&m);
            assert_eq!(m.median(), xs[0]);
            for i in 1..n {
                m.insert(xs[i]);
                check_halves(&m);
                assert_eq!(m.median(), sorted_median(&xs[..=i]));
                assert_eq!(m.count(), i + 1);
                assert_eq!(m.total(), xs[..=i].iter().map(|x| *x as i128).sum::<i128>());
            }
        }
    }

    #[test]
    fn test_median_random_2() {
        // small value range, so plenty of duplicates around the boundary
        let mut rng = StdRng::seed_from_u64(7);
        let xs: Vec<i64> = (0..500).map(|_| rng.gen_range(0..4)).collect();
        let mut m = RunningMedian::new(xs[0]);
        for i in 1..xs.len() {
            m.insert(xs[i]);
            check_halves(&m);
            assert_eq!(m.median(), sorted_median(&xs[..=i]));
        }
    }
}
