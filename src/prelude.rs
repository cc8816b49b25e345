//! The types most runs need, for a single glob import.
pub use crate::config::{
    ExcessPolicy, MatcherConfig, ProjectionConfig, SearchConfig, SearchStrategy, SecondWaveSearch,
    SimulatorSettings, TransmissionBounds,
};
pub use crate::data::{
    load_regions_csv, DailyRecord, HistoricalCorpusProvider, InMemoryInterventions,
    InMemoryParameterStore, InMemoryRegionData, InterventionDataProvider, ParameterStore,
    RegionDataProvider, RegionTimeSeries,
};
pub use crate::error::ProjectionError;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::numeric::ErrorMetric;
pub use crate::optimizer::{FitmentWindow, OptimizedParameters, ParameterOptimizer, SearchSeeds};
pub use crate::report::{write_projection_csv, JsonParameterStore};
pub use crate::runner::{
    ParameterOrigin, ParameterSource, ProjectionRequest, ProjectionResult, ProjectionRunner,
};
pub use crate::similarity::{CandidateWindow, CurveSimilarityMatcher};
pub use crate::simulator::{EpidemicSimulator, SecondWave, SimulationParameters};
