pub mod envelope;
pub mod filter;
pub mod job;
pub mod query;
pub mod table;
pub mod types;

pub mod prelude {
    // --- Filters ---
    pub use crate::filter::{
        eq_filter, gt_filter, gte_filter, in_filter, lt_filter, lte_filter, make_checked_filter,
        make_filter, ne_filter, nin_filter, Filter, FilterValue, Operator,
    };

    // --- Queries ---
    pub use crate::query::{Aggregation, AggregationFunc, Query, QueryBuilder};

    // --- Envelopes ---
    pub use crate::envelope::{ApiToken, BatchRequestEnvelope, RequestEnvelope, ResponseEnvelope};

    // --- Jobs ---
    pub use crate::job::{
        Geolevel, JobHandle, JobRef, JobRequest, JobResponse, JobStatus, ResponseFormat,
    };

    // --- Results ---
    pub use crate::table::{Row, Table, TableIter};
    pub use crate::types::Scalar;
    pub use crate::types::{FromScalar, ScalarExt};

    // --- Error Handling ---
    pub use crate::types::ProtoError;
}
