use crate::schema::Color;
use log::debug;
use std::collections::HashSet;

const GOLDEN_RATIO_CONJUGATE: f64 = 0.618033988749895;

/// Twenty visually distinct colors handed out before any are synthesized.
pub const BASE_PALETTE: [Color; 20] = [
    Color::rgb(31, 119, 180),
    Color::rgb(174, 199, 232),
    Color::rgb(255, 127, 14),
    Color::rgb(255, 187, 120),
    Color::rgb(44, 160, 44),
    Color::rgb(152, 223, 138),
    Color::rgb(214, 39, 40),
    Color::rgb(255, 152, 150),
    Color::rgb(148, 103, 189),
    Color::rgb(197, 176, 213),
    Color::rgb(140, 86, 75),
    Color::rgb(196, 156, 148),
    Color::rgb(227, 119, 194),
    Color::rgb(247, 182, 210),
    Color::rgb(127, 127, 127),
    Color::rgb(199, 199, 199),
    Color::rgb(188, 189, 34),
    Color::rgb(219, 219, 141),
    Color::rgb(23, 190, 207),
    Color::rgb(158, 218, 229),
];

/// Hands out a distinct color per live series and takes colors back once
/// no entry uses them.
#[derive(Debug, Clone)]
pub struct ColorAllocator {
    available: Vec<Color>,
    in_use: HashSet<Color>,
    synthesized: usize,
}

impl Default for ColorAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorAllocator {
    pub fn new() -> Self {
        Self {
            available: BASE_PALETTE.to_vec(),
            in_use: HashSet::new(),
            synthesized: 0,
        }
    }

    /// Returns a color no live series is using, preferring the base palette.
    pub fn acquire(&mut self) -> Color {
        let color = if self.available.is_empty() {
            self.synthesize()
        } else {
            self.available.remove(0)
        };
        self.in_use.insert(color);
        color
    }

    /// Puts `color` back into the pool. Returns false if it was not handed out.
    pub fn release(&mut self, color: Color) -> bool {
        if !self.in_use.remove(&color) {
            return false;
        }
        self.insert_available(color);
        true
    }

    /// Brings the pool in line with the colors actually present in the ledger.
    ///
    /// Every handed-out color missing from `live` is released (and returned),
    /// and every live color the allocator did not know about is claimed so it
    /// cannot be handed to another series.
    pub fn reconcile<I>(&mut self, live: I) -> Vec<Color>
    where
        I: IntoIterator<Item = Color>,
    {
        let live: HashSet<Color> = live.into_iter().collect();

        let mut stale: Vec<Color> = self
            .in_use
            .iter()
            .filter(|c| !live.contains(c))
            .copied()
            .collect();
        stale.sort_by_key(|c| palette_rank(c).unwrap_or(usize::MAX));

        for color in &stale {
            self.release(*color);
        }

        for color in live {
            if self.in_use.insert(color) {
                self.available.retain(|c| *c != color);
            }
        }

        if !stale.is_empty() {
            debug!("Reclaimed {} color(s) no longer used by any series", stale.len());
        }
        stale
    }

    /// Returns every color to the pool.
    pub fn reset(&mut self) {
        let in_use: Vec<Color> = self.in_use.iter().copied().collect();
        for color in in_use {
            self.release(color);
        }
    }

    pub fn is_in_use(&self, color: &Color) -> bool {
        self.in_use.contains(color)
    }

    pub fn in_use_count(&self) -> usize {
        self.in_use.len()
    }

    pub fn synthesized_count(&self) -> usize {
        self.synthesized
    }

    fn synthesize(&mut self) -> Color {
        loop {
            let color = synthesized_color(self.synthesized);
            self.synthesized += 1;
            if palette_rank(&color).is_none() && !self.in_use.contains(&color) {
                debug!("Base palette exhausted, synthesized color {}", color);
                return color;
            }
        }
    }

    fn insert_available(&mut self, color: Color) {
        if self.available.contains(&color) {
            return;
        }
        match palette_rank(&color) {
            Some(rank) => {
                let position = self
                    .available
                    .iter()
                    .position(|c| palette_rank(c).map_or(true, |other| other > rank))
                    .unwrap_or(self.available.len());
                self.available.insert(position, color);
            }
            None => self.available.push(color),
        }
    }
}

/// The `n`-th color generated past the base palette. Deterministic in `n`.
pub fn synthesized_color(n: usize) -> Color {
    let hue = (n as f64 * GOLDEN_RATIO_CONJUGATE) % 1.0;
    let saturation = 0.6 + (n % 3) as f64 * 0.15;
    let value = 0.7 + (n % 2) as f64 * 0.2;
    Color::from_hsv(hue, saturation, value)
}

fn palette_rank(color: &Color) -> Option<usize> {
    BASE_PALETTE.iter().position(|c| c == color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_handed_out_in_order() {
        let mut colors = ColorAllocator::new();
        let first: Vec<Color> = (0..BASE_PALETTE.len()).map(|_| colors.acquire()).collect();
        assert_eq!(first, BASE_PALETTE.to_vec());
        assert_eq!(colors.in_use_count(), 20);
    }

    #[test]
    fn test_synthesis_is_deterministic_and_unique() {
        let mut a = ColorAllocator::new();
        let mut b = ColorAllocator::new();
        let run_a: Vec<Color> = (0..60).map(|_| a.acquire()).collect();
        let run_b: Vec<Color> = (0..60).map(|_| b.acquire()).collect();
        assert_eq!(run_a, run_b);

        let distinct: HashSet<Color> = run_a.iter().copied().collect();
        assert_eq!(distinct.len(), run_a.len());
        assert!(a.synthesized_count() >= 40);
    }

    #[test]
    fn test_release_restores_palette_order() {
        let mut colors = ColorAllocator::new();
        let c0 = colors.acquire();
        let c1 = colors.acquire();
        let c2 = colors.acquire();

        assert!(colors.release(c2));
        assert!(colors.release(c0));
        assert!(!colors.release(c0));

        assert_eq!(colors.acquire(), c0);
        assert_eq!(colors.acquire(), c2);
        assert!(colors.is_in_use(&c1));
    }

    #[test]
    fn test_reconcile_releases_and_claims() {
        let mut colors = ColorAllocator::new();
        let c0 = colors.acquire();
        let c1 = colors.acquire();

        let released = colors.reconcile(vec![c1, BASE_PALETTE[5]]);
        assert_eq!(released, vec![c0]);
        assert!(!colors.is_in_use(&c0));
        assert!(colors.is_in_use(&BASE_PALETTE[5]));

        let next: Vec<Color> = (0..5).map(|_| colors.acquire()).collect();
        assert!(!next.contains(&BASE_PALETTE[5]));
        assert_eq!(next[0], c0);
    }

    #[test]
    fn test_reset_returns_everything() {
        let mut colors = ColorAllocator::new();
        for _ in 0..25 {
            colors.acquire();
        }
        colors.reset();
        assert_eq!(colors.in_use_count(), 0);
        assert_eq!(colors.acquire(), BASE_PALETTE[0]);
    }
}
