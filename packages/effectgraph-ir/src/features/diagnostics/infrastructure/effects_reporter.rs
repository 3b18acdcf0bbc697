//! Effects reporter
//!
//! Position-scoped application of the propagation rules: only sites
//! textually before a marker and outside the marker's sibling arms count.
//! Pure query over a finished table.

use crate::features::call_graph::domain::{MarkerSite, RoutineSites};
use crate::features::call_graph::CallGraph;
use crate::features::diagnostics::domain::{Diagnostic, EffectReport, Severity};
use crate::features::effect_inference::domain::EffectTable;
use crate::features::effect_inference::infrastructure::{EffectRules, SiteFilter};
use crate::features::effect_lattice::Hierarchies;
use crate::shared::models::{Category, RoutineId};

pub struct EffectsReporter<'a> {
    graph: &'a CallGraph,
    hierarchies: &'a Hierarchies,
    table: &'a EffectTable,
}

impl<'a> EffectsReporter<'a> {
    pub fn new(graph: &'a CallGraph, hierarchies: &'a Hierarchies, table: &'a EffectTable) -> Self {
        Self {
            graph,
            hierarchies,
            table,
        }
    }

    /// Report at the `index`-th marker of `routine`
    pub fn report_at(&self, routine: &RoutineId, index: usize) -> Option<EffectReport> {
        let sites = self.graph.sites(routine)?;
        let marker = sites.marker(index)?;
        Some(self.report(sites, marker))
    }

    /// Report at the marker carrying `label`
    pub fn report_labeled(&self, routine: &RoutineId, label: &str) -> Option<EffectReport> {
        let sites = self.graph.sites(routine)?;
        let marker = sites.marker_by_label(label)?;
        Some(self.report(sites, marker))
    }

    /// Every marker of the unit, routines in declaration order
    pub fn report_all(&self) -> Vec<EffectReport> {
        self.graph
            .all_sites()
            .iter()
            .flat_map(|sites| sites.markers.iter().map(move |m| (sites, m)))
            .map(|(sites, marker)| self.report(sites, marker))
            .collect()
    }

    fn report(&self, sites: &RoutineSites, marker: &MarkerSite) -> EffectReport {
        let rules = EffectRules::new(self.hierarchies, self.table);
        let filter = SiteFilter::UpTo(marker);
        EffectReport {
            routine: sites.routine.clone(),
            marker: marker.index,
            label: marker.label.clone(),
            span: marker.span,
            raises: rules.accumulate(sites, Category::Raises, filter),
            tags: rules.accumulate(sites, Category::Tags, filter),
        }
    }

    /// Info diagnostic listing kinds only (`Unknown` spelled as the root)
    pub fn to_diagnostic(&self, report: &EffectReport) -> Diagnostic {
        let raises = report
            .raises
            .describe(self.hierarchies.get(Category::Raises));
        let tags = report.tags.describe(self.hierarchies.get(Category::Tags));
        let at = match &report.label {
            Some(label) => format!("marker '{}'", label),
            None => format!("marker {}", report.marker),
        };
        Diagnostic {
            severity: Severity::Info,
            code: "effects".to_string(),
            routine: report.routine.clone(),
            span: report.span,
            message: format!(
                "effects of '{}' at {}: raises {}, tags {}",
                report.routine, at, raises, tags
            ),
        }
    }
}
