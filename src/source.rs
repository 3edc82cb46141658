use std::future::Future;

use anyhow::Result;

use crate::state::{MatchSnapshot, MatchStatus};

/// The external authority the board reads from. Implementations are cheap to clone;
/// each poll cycle runs on its own clone.
pub trait ScoreSource: Clone + Send + Sync + 'static {
    fn fetch_snapshot(&self) -> impl Future<Output = Result<MatchSnapshot>> + Send;

    fn fetch_status(&self) -> impl Future<Output = Result<MatchStatus>> + Send;

    fn describe(&self) -> String;
}
