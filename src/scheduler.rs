/*!
Feature manager: method registration, dependency ordering and parallel
batch execution over the ROI store.

Methods run strictly in topological order of the relation "A depends on B
iff A reads a feature B provides". A method is fully completed for every
label before any method that consumes its output begins, so a dependent
computation can always assume its prerequisites are present and final for
its label. Within one method the label set is split into contiguous
batches and dispatched to the rayon pool; labels are independent and the
stored results do not depend on batch size or worker count.
 */

use log::{debug, info};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::features::ngtdm::ProbabilityMode;
use crate::features::{default_methods, FeatureId, FeatureMethod};
use crate::roi::RoiStore;

/// Knobs shared by every feature method during one run.
#[derive(Debug, Clone, Default)]
pub struct ExtractConfig {
    pub ngtdm_probability: ProbabilityMode,
    /// Number of labels handed to a worker at once. Zero behaves as one.
    pub batch_size: usize,
}

impl ExtractConfig {
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }
}

/// Registry of feature methods plus the execution driver.
pub struct FeatureManager {
    methods: Vec<FeatureMethod>,
}

impl Default for FeatureManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureManager {
    pub fn new() -> Self {
        Self {
            methods: Vec::new(),
        }
    }

    /// Manager pre-loaded with the built-in method set.
    pub fn with_default_methods() -> Self {
        let mut manager = Self::new();
        for method in default_methods() {
            manager
                .register(method)
                .expect("built-in methods provide disjoint feature sets");
        }
        manager
    }

    /// Add a method to the registry. Fails if one of its provided feature
    /// ids already has a provider.
    pub fn register(&mut self, method: FeatureMethod) -> Result<()> {
        for &feature in method.provides {
            if let Some(existing) = self.provider_of(feature) {
                return Err(Error::DuplicateProvider {
                    feature,
                    first: existing.name,
                    second: method.name,
                });
            }
        }
        self.methods.push(method);
        Ok(())
    }

    fn provider_of(&self, feature: FeatureId) -> Option<&FeatureMethod> {
        self.methods
            .iter()
            .find(|method| method.provides.contains(&feature))
    }

    /// Topological order over the registered methods.
    ///
    /// Fails with a configuration error before any ROI work: an unresolved
    /// dependency names the consumer, a cycle names every method left
    /// unorderable.
    pub fn execution_order(&self) -> Result<Vec<&FeatureMethod>> {
        let count = self.methods.len();

        // Method-level dependency edges: i depends on j iff some feature
        // in depends_on(i) is provided by j.
        let mut depends_on_idx: Vec<Vec<usize>> = vec![Vec::new(); count];
        for (i, method) in self.methods.iter().enumerate() {
            for &feature in method.depends_on {
                let j = self
                    .methods
                    .iter()
                    .position(|candidate| candidate.provides.contains(&feature))
                    .ok_or(Error::UnresolvedDependency {
                        feature,
                        method: method.name,
                    })?;
                if !depends_on_idx[i].contains(&j) {
                    depends_on_idx[i].push(j);
                }
            }
        }

        // Kahn's algorithm, always picking the lowest registration index
        // so the order is stable for a given registry.
        let mut ordered = Vec::with_capacity(count);
        let mut placed = vec![false; count];
        loop {
            let next = (0..count).find(|&i| {
                !placed[i] && depends_on_idx[i].iter().all(|&j| placed[j])
            });
            match next {
                Some(i) => {
                    placed[i] = true;
                    ordered.push(&self.methods[i]);
                }
                None => break,
            }
        }

        if ordered.len() < count {
            let mut methods: Vec<&'static str> = (0..count)
                .filter(|&i| !placed[i])
                .map(|i| self.methods[i].name)
                .collect();
            methods.sort_unstable();
            return Err(Error::DependencyCycle { methods });
        }

        Ok(ordered)
    }

    /// Execute every registered method over the whole store, one method at
    /// a time with a full barrier in between.
    pub fn run(&self, store: &RoiStore, config: &ExtractConfig) -> Result<()> {
        let order = self.execution_order()?;
        info!(
            "computing {} feature methods over {} rois",
            order.len(),
            store.len()
        );
        for method in order {
            debug!("feature method {}", method.name);
            self.run_method(method, store, config)?;
        }
        Ok(())
    }

    fn run_method(
        &self,
        method: &FeatureMethod,
        store: &RoiStore,
        config: &ExtractConfig,
    ) -> Result<()> {
        let batch_size = config.batch_size.max(1);
        store
            .labels()
            .par_chunks(batch_size)
            .try_for_each(|batch| -> Result<()> {
                for &label in batch {
                    store.with_lock(label, |record| {
                        if record.bad_data {
                            return;
                        }
                        (method.calculate)(record, config);
                    })?;
                }
                Ok(())
            })
    }
}
