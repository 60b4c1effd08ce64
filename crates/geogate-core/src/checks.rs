//! Dataset checks that need no spatial index

pub mod consistency;
pub mod distribution;

pub use consistency::{check_crs_consistency, ConsistencyIssue, ConsistencyReport, DatasetCrs};
pub use distribution::{
    check_distribution, ClassRow, ClassShare, ClassStatus, DistributionReport, LabelledSplit,
};
