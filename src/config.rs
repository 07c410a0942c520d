use tracing::warn;

// Defaults for parameters
const CHUNK_SIZE_DEFAULT: usize = 1 << 16;
const NEIGHBOUR_WEIGHT_DEFAULT: f64 = f64::INFINITY;
const VERIFY_INVARIANTS_DEFAULT: bool = cfg!(debug_assertions);

// Valid minimums/left bounds of parameters
const CHUNK_SIZE_MINIMUM: usize = 1;

/// A wrapper around the settings used when building horizontal visibility graphs.
/// Only use if you want to tune them. Otherwise use `Hvg::default_config()` to
/// instantiate the builder with default settings.
#[derive(Debug, Clone, PartialEq)]
pub struct HvgConfig {
    pub(crate) chunk_size: usize,
    pub(crate) neighbour_weight: f64,
    pub(crate) verify_invariants: bool,
}

/// Builder object to set custom settings.
pub struct ConfigBuilder {
    chunk_size: Option<usize>,
    neighbour_weight: Option<f64>,
    verify_invariants: Option<bool>,
}

impl Default for HvgConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl HvgConfig {
    /// Enters the builder pattern, allowing custom settings to be set using
    /// various setter methods.
    ///
    /// # Returns
    /// * the configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            chunk_size: None,
            neighbour_weight: None,
            verify_invariants: None,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn neighbour_weight(&self) -> f64 {
        self.neighbour_weight
    }

    pub fn verify_invariants(&self) -> bool {
        self.verify_invariants
    }
}

impl ConfigBuilder {
    /// Sets the chunk size - the number of consecutive samples each independently built
    /// tree covers in chunked and parallel construction, before the trees are merged
    /// pairwise. Defaults to 65536.
    ///
    /// # Parameters
    /// * chunk_size - the number of samples per chunk
    ///
    /// # Returns
    /// * the configuration builder
    pub fn chunk_size(mut self, chunk_size: usize) -> ConfigBuilder {
        let valid_chunk_size =
            ConfigBuilder::validate_input_left_bound(chunk_size, CHUNK_SIZE_MINIMUM, "chunk_size");
        self.chunk_size = Some(valid_chunk_size);
        self
    }

    /// Sets the weight given to edges between adjacent positions, which have no intervening
    /// samples to measure a clearance against. Defaults to positive infinity.
    ///
    /// # Parameters
    /// * neighbour_weight - the weight of edges between neighbours
    ///
    /// # Returns
    /// * the configuration builder
    pub fn neighbour_weight(mut self, neighbour_weight: f64) -> ConfigBuilder {
        if neighbour_weight.is_nan() {
            warn!("neighbour_weight cannot be NaN. Set to {NEIGHBOUR_WEIGHT_DEFAULT}.");
            self.neighbour_weight = Some(NEIGHBOUR_WEIGHT_DEFAULT);
        } else {
            self.neighbour_weight = Some(neighbour_weight);
        }
        self
    }

    /// Sets whether every built tree is walked in full to check its structural invariants.
    /// A failed check panics, as it can only be caused by a defect in this crate.
    /// Defaults to true in debug builds and false in release builds.
    ///
    /// # Parameters
    /// * verify_invariants - whether to check built trees
    ///
    /// # Returns
    /// * the configuration builder
    pub fn verify_invariants(mut self, verify_invariants: bool) -> ConfigBuilder {
        self.verify_invariants = Some(verify_invariants);
        self
    }

    /// Finishes the building of the configuration. A call to this method is required to
    /// exit the builder pattern and complete the construction of the configuration.
    ///
    /// # Returns
    /// * The completed configuration.
    pub fn build(self) -> HvgConfig {
        HvgConfig {
            chunk_size: self.chunk_size.unwrap_or(CHUNK_SIZE_DEFAULT),
            neighbour_weight: self.neighbour_weight.unwrap_or(NEIGHBOUR_WEIGHT_DEFAULT),
            verify_invariants: self.verify_invariants.unwrap_or(VERIFY_INVARIANTS_DEFAULT),
        }
    }

    fn validate_input_left_bound(input_param: usize, left_bound: usize, param: &str) -> usize {
        if input_param < left_bound {
            warn!("{param} ({input_param}) cannot be lower than {left_bound}. Set to {left_bound}.");
            left_bound
        } else {
            input_param
        }
    }
}
