use crate::exemplar::ExemplarIndex;
use crate::neighborhood::{Grid, Neighborhood};
use crate::{Color, Error};

/// The result of a best match search
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Match {
    /// Center color of the best matching exemplar neighborhood
    pub color: Color,
    /// Summed color distance between the query and the best match
    pub distance: u32,
}

/// Exhaustive nearest neighborhood search over an `ExemplarIndex`.
///
/// Holds a scratch buffer for the resolved query colors, so each worker
/// should use its own `Matcher`.
pub struct Matcher<'a> {
    index: &'a ExemplarIndex,
    pattern: Vec<Color>,
}

impl<'a> Matcher<'a> {
    pub fn new(index: &'a ExemplarIndex) -> Self {
        Self {
            index,
            pattern: Vec::with_capacity(index.window().len()),
        }
    }

    /// Compares `query`, resolved against `grid`, with every exemplar
    /// neighborhood in row-major order. The first neighborhood with the
    /// lowest distance wins, later ties are ignored.
    pub fn find_best_match<G: Grid + ?Sized>(
        &mut self,
        query: &Neighborhood,
        grid: &G,
    ) -> Result<Match, Error> {
        if query.capacity() != self.index.window().len() {
            return Err(Error::IncompleteNeighborhood(
                query.len(),
                self.index.window().len(),
            ));
        }

        query.resolve_into(grid, &mut self.pattern)?;

        let exemplar = self.index.exemplar().cells();
        let mut best_match = 0;
        let mut lowest_cost = u32::MAX;

        for (i, candidate) in self.index.entries().iter().enumerate() {
            if let Some(cost) =
                better_match(candidate.indices(), exemplar, &self.pattern, lowest_cost)
            {
                lowest_cost = cost;
                best_match = i;
            }
        }

        let winner = &self.index.entries()[best_match];
        Ok(Match {
            color: exemplar[winner.center_index()?],
            distance: lowest_cost,
        })
    }
}

/// Returns the candidate's distance to `pattern` if it is strictly lower
/// than `current_best`. Gives up as soon as the running sum reaches
/// `current_best`, which can't change the outcome since the sum never
/// decreases.
#[inline]
fn better_match(
    candidate: &[u32],
    exemplar: &[Color],
    pattern: &[Color],
    current_best: u32,
) -> Option<u32> {
    let mut score = 0u32;

    for (&slot, &color) in candidate.iter().zip(pattern.iter()) {
        score += exemplar[slot as usize].distance(color);
        if score >= current_best {
            return None;
        }
    }

    Some(score)
}
