//! Role skeleton: which strategy supplies each playlist slot.
//!
//! Interest and freshness slots are frequent at the start of a playlist and
//! sparsen towards the end; back-catalog slots are rare. The skeleton
//! depends on the length only.

use crate::catalog::Role;

/// Spacing schedule of one special role.
#[derive(Debug, Clone, Copy)]
struct Schedule {
    role: Role,
    next: usize,
    spacing: f64,
    growth: f64,
    max_spacing: f64,
}

impl Schedule {
    const fn new(role: Role, first: usize, spacing: f64, growth: f64, max_spacing: f64) -> Self {
        Self {
            role,
            next: first,
            spacing,
            growth,
            max_spacing,
        }
    }

    /// Offer slot `index`. Takes it when due and free; when due but already
    /// claimed, retries on the following slot without growing the spacing.
    fn offer(&mut self, index: usize, slot: &mut Role) {
        if index != self.next {
            return;
        }
        if *slot == Role::Regular {
            *slot = self.role;
            // Truncation matches the integer slot grid.
            self.next = (self.next as f64 + self.spacing) as usize;
            self.spacing = (self.spacing * self.growth).min(self.max_spacing);
        } else {
            self.next += 1;
        }
    }
}

/// Generates role skeletons.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkeletonGenerator;

impl SkeletonGenerator {
    /// Roles for a playlist of `length` slots.
    ///
    /// Claim priority is interest, then freshness, then back catalog.
    ///
    /// ```
    /// use dailymix::catalog::Role;
    /// use dailymix::skeleton::SkeletonGenerator;
    ///
    /// let skeleton = SkeletonGenerator.generate(20);
    /// assert_eq!(skeleton.len(), 20);
    /// assert_eq!(skeleton[0], Role::Interest);
    /// assert_eq!(skeleton[1], Role::Freshness);
    /// ```
    #[must_use]
    pub fn generate(&self, length: usize) -> Vec<Role> {
        let mut schedules = [
            Schedule::new(Role::Interest, 0, 2.0, 1.5, 7.0),
            Schedule::new(Role::Freshness, 1, 2.0, 1.3, 10.0),
            // Fixed spacing: growth of 1 never changes it.
            Schedule::new(Role::BackCatalog, 14, 14.0, 1.0, 14.0),
        ];

        (0..length)
            .map(|index| {
                let mut slot = Role::Regular;
                for schedule in &mut schedules {
                    schedule.offer(index, &mut slot);
                }
                slot
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Role::{BackCatalog as B, Freshness as F, Interest as I, Regular as R};

    #[test]
    fn test_length_is_exact() {
        for length in [0, 1, 2, 13, 14, 15, 100, 1000] {
            assert_eq!(SkeletonGenerator.generate(length).len(), length);
        }
    }

    #[test]
    fn test_first_twenty_slots() {
        assert_eq!(
            SkeletonGenerator.generate(20),
            vec![I, F, I, F, R, I, F, R, R, I, F, R, R, R, F, I, B, R, R, F]
        );
    }

    #[test]
    fn test_prefix_stable_across_lengths() {
        let long = SkeletonGenerator.generate(200);
        for length in [1, 17, 60, 150] {
            assert_eq!(SkeletonGenerator.generate(length), long[..length]);
        }
    }

    #[test]
    fn test_back_catalog_is_rare_and_spaced() {
        let skeleton = SkeletonGenerator.generate(100);
        let positions: Vec<usize> = skeleton
            .iter()
            .enumerate()
            .filter(|(_, role)| **role == B)
            .map(|(i, _)| i)
            .collect();

        assert_eq!(positions.first(), Some(&16));
        assert!(positions.windows(2).all(|w| w[1] - w[0] >= 14));
    }

    #[test]
    fn test_special_roles_sparsen() {
        let skeleton = SkeletonGenerator.generate(200);
        let special = |slots: &[Role]| slots.iter().filter(|r| **r != R).count();
        assert!(special(&skeleton[..20]) > special(&skeleton[180..]));
    }
}
