use std::fmt;

/// Zero-based index of the cluster center a sample was assigned to during fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterLabel(usize);

impl ClusterLabel {
    /// Create a new cluster label from a zero-based index.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based cluster index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }

    /// Return the one-based microstate value this cluster takes in a
    /// [`Segmentation`].
    #[must_use]
    pub fn microstate(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Microstate sequence produced by competitive fitting.
///
/// One entry per sample. `0` marks an unlabeled sample (a discarded boundary
/// segment or an excluded interval); `k + 1` marks assignment to cluster
/// center `k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation(Vec<usize>);

impl Segmentation {
    /// Value used for samples that carry no microstate.
    pub const UNLABELED: usize = 0;

    pub(crate) fn new(labels: Vec<usize>) -> Self {
        Self(labels)
    }

    /// Return the raw one-based labels, `0` meaning unlabeled.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.0
    }

    /// Return the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the sequence covers no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the cluster assigned to sample `t`, or `None` when unlabeled.
    ///
    /// # Panics
    ///
    /// Panics if `t >= len()`.
    #[must_use]
    pub fn get(&self, t: usize) -> Option<ClusterLabel> {
        match self.0[t] {
            Self::UNLABELED => None,
            label => Some(ClusterLabel::new(label - 1)),
        }
    }

    /// Return the number of labeled samples.
    #[must_use]
    pub fn n_labeled(&self) -> usize {
        self.0.iter().filter(|&&l| l != Self::UNLABELED).count()
    }

    /// Consume and return the inner label vector.
    #[must_use]
    pub fn into_inner(self) -> Vec<usize> {
        self.0
    }
}

impl AsRef<[usize]> for Segmentation {
    fn as_ref(&self) -> &[usize] {
        &self.0
    }
}
