//! CLI argument definitions for the consistency checker.

use clap::Args;
use serde::Deserialize;

use crate::checker::CheckerConfig;
use crate::error::VerifyError;
use crate::search::PageSize;
use crate::walker::DEFAULT_MAX_PAGES;

/// Options controlling how a collection is checked.
///
/// Also deserializable so a plan file can carry the same knobs.
#[derive(Args, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CheckArgs {
    /// The two relatively prime page sizes for the cross-stride walks
    #[arg(long, value_delimiter = ',', default_values_t = [3, 7])]
    pub cross_stride: Vec<u32>,

    /// Maximum search calls per walk before the server is declared non-terminating
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,

    /// Report items delivered twice across pages of one walk as a violation
    #[arg(long)]
    pub strict_duplicates: bool,

    /// Run independent walks concurrently
    #[arg(long)]
    pub concurrent: bool,

    /// Maximum item identities listed per set difference
    #[arg(long, default_value = "20")]
    pub max_reported_items: usize,
}

impl Default for CheckArgs {
    fn default() -> Self {
        Self {
            cross_stride: vec![3, 7],
            max_pages: DEFAULT_MAX_PAGES,
            strict_duplicates: false,
            concurrent: false,
            max_reported_items: 20,
        }
    }
}

impl CheckArgs {
    /// Build and validate a checker configuration.
    pub fn to_config(&self) -> Result<CheckerConfig, VerifyError> {
        let &[a, b] = self.cross_stride.as_slice() else {
            return Err(VerifyError::InvalidConfig(format!(
                "expected exactly two cross-stride page sizes, got {}",
                self.cross_stride.len()
            )));
        };
        let config = CheckerConfig {
            cross_stride: (PageSize::new(a)?, PageSize::new(b)?),
            max_pages: self.max_pages,
            strict_duplicates: self.strict_duplicates,
            concurrent: self.concurrent,
            max_reported_items: self.max_reported_items,
        };
        config.validate()?;
        Ok(config)
    }
}
