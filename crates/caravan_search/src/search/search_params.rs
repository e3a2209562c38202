use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

/// Which improving move to apply per dirty node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStrategy {
    /// Apply the first strictly improving move found.
    FirstImprovement,
    /// Evaluate all candidate moves for the node and apply the best one.
    BestImprovement,
}

/// Forced-stop conditions, checked between driver steps. A move that has
/// been selected is always applied and its routes updated before a budget
/// check is honoured.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SearchBudget {
    pub max_iterations: Option<usize>,
    pub max_duration: Option<SignedDuration>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        SearchBudget::default()
    }

    pub fn iterations(max_iterations: usize) -> Self {
        SearchBudget {
            max_iterations: Some(max_iterations),
            max_duration: None,
        }
    }

    pub fn duration(max_duration: SignedDuration) -> Self {
        SearchBudget {
            max_iterations: None,
            max_duration: Some(max_duration),
        }
    }

    pub fn is_exhausted(&self, iterations: usize, elapsed: SignedDuration) -> bool {
        if let Some(max_iterations) = self.max_iterations
            && iterations >= max_iterations
        {
            return true;
        }

        if let Some(max_duration) = self.max_duration
            && elapsed >= max_duration
        {
            return true;
        }

        false
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    pub strategy: SearchStrategy,
    pub budget: SearchBudget,
    pub seed: u64,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            strategy: SearchStrategy::FirstImprovement,
            budget: SearchBudget::unlimited(),
            seed: 0,
        }
    }
}
