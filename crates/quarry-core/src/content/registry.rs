use std::fmt;

/// A contiguous range of content ids assigned to one package in one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    pub start: usize,
    pub len: usize,
}

impl IdRange {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end())
    }
}

/// A shared, globally indexed content table populated during the register
/// phase. The concrete storage lives with the external content collaborator;
/// the core only drives the count/resize/reset discipline.
pub trait ContentRegistry: Send {
    /// Registry key, e.g. "items".
    fn key(&self) -> &str;

    /// Number of host-provided entries present before any package registers.
    fn baseline_len(&self) -> usize;

    /// Entries recorded since the last resize.
    fn pending(&self) -> usize;

    /// Record `count` entries and return the start index they will occupy
    /// once the registry is resized. Ids are assigned against the final
    /// layout; the backing storage does not grow here.
    fn reserve(&mut self, count: usize) -> usize;

    /// Grow the backing storage to its final aggregate size. Called exactly
    /// once per load batch, after every package has registered.
    fn resize(&mut self);

    /// Shrink back to the baseline, invalidating every assigned id.
    fn reset(&mut self);

    /// Current allocated size.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Count-tracking reference implementation, used for the host's own tables
/// and as the default collaborator in tests.
pub struct SlotRegistry {
    key: String,
    baseline: usize,
    pending: usize,
    allocated: usize,
}

impl SlotRegistry {
    pub fn new(key: &str, baseline: usize) -> Self {
        Self {
            key: key.to_string(),
            baseline,
            pending: 0,
            allocated: baseline,
        }
    }
}

impl ContentRegistry for SlotRegistry {
    fn key(&self) -> &str {
        &self.key
    }

    fn baseline_len(&self) -> usize {
        self.baseline
    }

    fn pending(&self) -> usize {
        self.pending
    }

    fn reserve(&mut self, count: usize) -> usize {
        let start = self.baseline + self.pending;
        self.pending += count;
        start
    }

    fn resize(&mut self) {
        self.allocated = self.baseline + self.pending;
    }

    fn reset(&mut self) {
        self.pending = 0;
        self.allocated = self.baseline;
    }

    fn len(&self) -> usize {
        self.allocated
    }
}

/// The set of shared registries a load batch populates.
///
/// Registration is two-pass: packages reserve counts first, and every
/// registry is resized exactly once afterwards, so no package observes a
/// registry resized mid-registration by another package.
pub struct RegistrySet {
    registries: Vec<Box<dyn ContentRegistry>>,
    journal: Vec<(String, IdRange)>,
}

impl RegistrySet {
    pub fn new() -> Self {
        Self {
            registries: Vec::new(),
            journal: Vec::new(),
        }
    }

    /// Add a registry to the set. Keys must be unique.
    pub fn add(&mut self, registry: Box<dyn ContentRegistry>) {
        debug_assert!(
            !self.registries.iter().any(|r| r.key() == registry.key()),
            "duplicate registry key"
        );
        self.registries.push(registry);
    }

    /// Reserve `count` ids in the named registry for the currently
    /// registering package. Returns the assigned range.
    pub fn reserve(&mut self, key: &str, count: usize) -> Option<IdRange> {
        let registry = self.registries.iter_mut().find(|r| r.key() == key)?;
        let start = registry.reserve(count);
        let range = IdRange { start, len: count };
        self.journal.push((key.to_string(), range));
        Some(range)
    }

    /// Take the ranges reserved since the last call; the orchestrator
    /// attributes them to the package whose callback just ran.
    pub fn take_journal(&mut self) -> Vec<(String, IdRange)> {
        std::mem::take(&mut self.journal)
    }

    /// Resize every registry to its final aggregate size, exactly once per
    /// batch.
    pub fn resize_all(&mut self) {
        for registry in &mut self.registries {
            registry.resize();
        }
    }

    /// Reset every registry to its baseline, invalidating assigned ids.
    pub fn reset_all(&mut self) {
        self.journal.clear();
        for registry in &mut self.registries {
            registry.reset();
        }
    }

    /// The baseline ranges, attributed to the host pseudo-package.
    pub fn baseline_ranges(&self) -> Vec<(String, IdRange)> {
        self.registries
            .iter()
            .map(|r| {
                (
                    r.key().to_string(),
                    IdRange {
                        start: 0,
                        len: r.baseline_len(),
                    },
                )
            })
            .collect()
    }

    /// Current (key, allocated size) snapshot, for round-trip checks.
    pub fn sizes(&self) -> Vec<(String, usize)> {
        self.registries
            .iter()
            .map(|r| (r.key().to_string(), r.len()))
            .collect()
    }
}

impl Default for RegistrySet {
    fn default() -> Self {
        Self::new()
    }
}
