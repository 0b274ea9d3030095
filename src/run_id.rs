//! Structured identity for CMIP6 simulation runs
//!
//! A run is identified by six global attributes of its NetCDF file. Keeping
//! the fields separate (rather than a single joined string) lets splicing
//! match on the model field alone and lets reports group by experiment
//! without re-parsing keys.

use crate::errors::GmstError;
use std::fmt;
use std::str::FromStr;

/// Identity of one simulation run, assembled from CMIP6 global attributes
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId {
    /// `activity_id`, e.g. `CMIP` or `ScenarioMIP`
    pub activity: String,
    /// `institution_id`, the modelling centre
    pub institution: String,
    /// `source_id`, the climate model name
    pub model: String,
    /// `experiment_id`, e.g. `historical` or `ssp245`
    pub experiment: String,
    /// `variant_label`, the ensemble member such as `r1i1p1f1`
    pub member: String,
    /// `grid_label`, the grid variant such as `gn`
    pub variant: String,
}

impl RunId {
    pub fn new(
        activity: impl Into<String>,
        institution: impl Into<String>,
        model: impl Into<String>,
        experiment: impl Into<String>,
        member: impl Into<String>,
        variant: impl Into<String>,
    ) -> Self {
        Self {
            activity: activity.into(),
            institution: institution.into(),
            model: model.into(),
            experiment: experiment.into(),
            member: member.into(),
            variant: variant.into(),
        }
    }

    /// Whether this run belongs to the historical experiment
    pub fn is_historical(&self) -> bool {
        self.experiment == "historical"
    }

    /// Whether this run belongs to a future scenario experiment (`ssp*`)
    pub fn is_scenario(&self) -> bool {
        self.experiment.starts_with("ssp")
    }

    /// Identity of the spliced trajectory this scenario run produces:
    /// the scenario's own fields with the experiment kept, used to label
    /// output series
    pub fn splice_label(&self) -> String {
        format!("{}.{}.{}", self.model, self.experiment, self.member)
    }
}

impl fmt::Display for RunId {
    /// Dot-joined form, stable across the catalog, reports and output files
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}.{}",
            self.activity, self.institution, self.model, self.experiment, self.member, self.variant
        )
    }
}

impl FromStr for RunId {
    type Err = GmstError;

    /// Parse the dot-joined form back into its six fields, e.g.
    /// `CMIP.MOHC.UKESM1-0-LL.historical.r1i1p1f1.gn`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [activity, institution, model, experiment, member, variant]
                if parts.iter().all(|p| !p.is_empty()) =>
            {
                Ok(Self::new(
                    *activity,
                    *institution,
                    *model,
                    *experiment,
                    *member,
                    *variant,
                ))
            }
            _ => Err(GmstError::CatalogError(format!(
                "Invalid run identifier '{}' (expected 6 dot-separated fields)",
                s
            ))),
        }
    }
}
