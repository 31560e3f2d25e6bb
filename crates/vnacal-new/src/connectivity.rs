//! Port reachability through a standard.
//!
//! Two ports are connected if a signal path between them cannot be ruled
//! out. An S cell holding the zero parameter rules out a direct path; any
//! other cell, including one that is not known at all, may carry signal.
//! Connectivity is the transitive closure of that direct-path relation.

use vnacal_core::ParameterId;

/// Symmetric port × port reachability matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connectivity {
    ports: usize,
    reachable: Vec<bool>,
}

impl Connectivity {
    /// Compute connectivity from a row-major `ports × ports` S matrix,
    /// where `None` marks an unknown cell.
    pub fn from_s(s: &[Option<ParameterId>], ports: usize) -> Self {
        debug_assert_eq!(s.len(), ports * ports);
        let direct = |i: usize, j: usize| s[i * ports + j] != Some(ParameterId::ZERO);

        let mut reachable = vec![false; ports * ports];
        for i in 0..ports {
            for j in 0..ports {
                reachable[i * ports + j] = i == j || direct(i, j) || direct(j, i);
            }
        }

        // Floyd–Warshall closure.
        for k in 0..ports {
            for i in 0..ports {
                if !reachable[i * ports + k] {
                    continue;
                }
                for j in 0..ports {
                    if reachable[k * ports + j] {
                        reachable[i * ports + j] = true;
                    }
                }
            }
        }

        Self { ports, reachable }
    }

    /// Number of ports.
    pub fn ports(&self) -> usize {
        self.ports
    }

    /// True if ports `i` and `j` may be connected.
    pub fn is_connected(&self, i: usize, j: usize) -> bool {
        self.reachable[i * self.ports + j]
    }

    /// Matrix as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        self.reachable
            .chunks(self.ports.max(1))
            .map(<[bool]>::to_vec)
            .collect()
    }
}
