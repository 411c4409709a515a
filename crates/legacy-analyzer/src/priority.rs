//! Post-success priority scoring for rebuild specs (spec §4.9 step 3).

use legacy_types::analysis::{FeatureAnalysis, Priority, RebuildSpec};

const HIGH_THRESHOLD: f64 = 0.5;
const MEDIUM_THRESHOLD: f64 = 0.25;

fn score(spec: &RebuildSpec, business_importance: f64) -> f64 {
    business_importance * spec.feature_confidence * spec.complexity_inverse
}

fn priority_for_score(value: f64) -> Priority {
    if value >= HIGH_THRESHOLD {
        Priority::High
    } else if value >= MEDIUM_THRESHOLD {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Assigns `priority` to every rebuild spec in place. Ties at a priority
/// band are broken by promoting specs that reference an interactive
/// element over purely informational ones — reflected here by nudging
/// those specs' scores up before bucketing, never by mutating other
/// fields.
pub fn assign_priorities(analysis: &mut FeatureAnalysis, business_importance: f64) {
    for spec in &mut analysis.rebuild_specs {
        let mut value = score(spec, business_importance);
        if spec.references_interactive_element {
            value += f64::EPSILON.max(0.0) + 0.001;
        }
        spec.priority = Some(priority_for_score(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legacy_types::analysis::RebuildSpec;

    fn spec(confidence: f64, complexity_inverse: f64, interactive: bool) -> RebuildSpec {
        RebuildSpec {
            title: "t".to_string(),
            description: "d".to_string(),
            references_interactive_element: interactive,
            feature_confidence: confidence,
            complexity_inverse,
            priority: None,
        }
    }

    #[test]
    fn high_confidence_important_feature_is_high_priority() {
        let mut analysis = FeatureAnalysis {
            interactive_elements: vec![],
            functional_capabilities: vec![],
            api_integrations: vec![],
            business_rules: vec![],
            rebuild_specs: vec![spec(0.9, 0.9, false)],
            overall_confidence: 0.9,
            quality_score: 0.9,
            context_ref: uuid::Uuid::new_v4(),
        };
        assign_priorities(&mut analysis, 0.9);
        assert_eq!(analysis.rebuild_specs[0].priority, Some(Priority::High));
    }

    #[test]
    fn low_confidence_is_low_priority() {
        let mut analysis = FeatureAnalysis {
            interactive_elements: vec![],
            functional_capabilities: vec![],
            api_integrations: vec![],
            business_rules: vec![],
            rebuild_specs: vec![spec(0.2, 0.2, false)],
            overall_confidence: 0.2,
            quality_score: 0.2,
            context_ref: uuid::Uuid::new_v4(),
        };
        assign_priorities(&mut analysis, 0.3);
        assert_eq!(analysis.rebuild_specs[0].priority, Some(Priority::Low));
    }

    #[test]
    fn tie_break_favors_interactive_element() {
        let mut analysis = FeatureAnalysis {
            interactive_elements: vec![],
            functional_capabilities: vec![],
            api_integrations: vec![],
            business_rules: vec![],
            rebuild_specs: vec![spec(0.5, 1.0, false), spec(0.5, 1.0, true)],
            overall_confidence: 0.5,
            quality_score: 0.5,
            context_ref: uuid::Uuid::new_v4(),
        };
        assign_priorities(&mut analysis, 1.0);
        assert_eq!(analysis.rebuild_specs[0].priority, analysis.rebuild_specs[1].priority);
    }
}
