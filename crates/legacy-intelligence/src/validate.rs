//! Response validation and quality scoring (C8, spec §4.8). The LLM
//! response is raw JSON text; this module parses it, checks required
//! fields/types/enum members by hand (no schema-validation crate in the
//! teacher's stack), and scores the result against a fixed weighting.

use legacy_types::analysis::{ContentSummary, FeatureAnalysis, QualityBreakdown};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_MIN_QUALITY: f64 = 0.5;

const WEIGHT_COMPLETENESS: f64 = 0.4;
const WEIGHT_SPECIFICITY: f64 = 0.35;
const WEIGHT_DEPTH: f64 = 0.25;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("response is not valid json: {0}")]
    InvalidJson(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("field {0} has wrong type, expected {1}")]
    WrongType(String, String),

    #[error("field {0} has invalid enum value {1:?}")]
    InvalidEnum(String, String),

    #[error("quality score {0:.2} below minimum {1:.2}")]
    BelowMinQuality(f64, f64),
}

fn require_str(obj: &Value, field: &str) -> Result<String, ValidationError> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            if obj.get(field).is_some() {
                ValidationError::WrongType(field.to_string(), "string".to_string())
            } else {
                ValidationError::MissingField(field.to_string())
            }
        })
}

fn require_f64(obj: &Value, field: &str) -> Result<f64, ValidationError> {
    obj.get(field).and_then(Value::as_f64).ok_or_else(|| {
        if obj.get(field).is_some() {
            ValidationError::WrongType(field.to_string(), "number".to_string())
        } else {
            ValidationError::MissingField(field.to_string())
        }
    })
}

fn require_str_array(obj: &Value, field: &str) -> Result<Vec<String>, ValidationError> {
    let arr = obj
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            if obj.get(field).is_some() {
                ValidationError::WrongType(field.to_string(), "array".to_string())
            } else {
                ValidationError::MissingField(field.to_string())
            }
        })?;
    arr.iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| ValidationError::WrongType(field.to_string(), "array of string".to_string()))
        })
        .collect()
}

/// Parses and validates a Step 1 content-summarization response, scoring it
/// with fixed 0.4/0.35/0.25 completeness/specificity/depth weights.
pub fn validate_content_summary(raw: &str) -> Result<ContentSummary, ValidationError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;

    let purpose = require_str(&value, "purpose")?;
    let user_context = require_str(&value, "user_context")?;
    let business_logic = require_str(&value, "business_logic")?;
    let navigation_role = require_str(&value, "navigation_role")?;
    let business_importance = require_f64(&value, "business_importance")?;
    let workflows = require_str_array(&value, "workflows")?;
    let keywords = require_str_array(&value, "keywords")?;

    let journey_stage_raw = require_str(&value, "journey_stage")?;
    let journey_stage = match journey_stage_raw.as_str() {
        "entry" => legacy_types::analysis::JourneyStage::Entry,
        "middle" => legacy_types::analysis::JourneyStage::Middle,
        "conversion" => legacy_types::analysis::JourneyStage::Conversion,
        "exit" => legacy_types::analysis::JourneyStage::Exit,
        other => {
            return Err(ValidationError::InvalidEnum(
                "journey_stage".to_string(),
                other.to_string(),
            ))
        }
    };

    let completeness = score_completeness(&[&purpose, &user_context, &business_logic, &navigation_role]);
    let specificity = score_specificity(&workflows, &keywords);
    let depth = score_depth(&business_logic);
    let overall = WEIGHT_COMPLETENESS * completeness + WEIGHT_SPECIFICITY * specificity + WEIGHT_DEPTH * depth;

    Ok(ContentSummary {
        id: Uuid::new_v4(),
        purpose,
        user_context,
        business_logic,
        navigation_role,
        business_importance: business_importance.clamp(0.0, 1.0),
        confidence: overall,
        workflows,
        journey_stage,
        keywords,
        quality: QualityBreakdown {
            overall,
            completeness,
            depth,
        },
    })
}

/// Parses and validates a Step 2 feature-analysis response. `context_ref`
/// ties the result back to the Step 1 `ContentSummary` it was conditioned
/// on.
pub fn validate_feature_analysis(
    raw: &str,
    context_ref: Uuid,
) -> Result<FeatureAnalysis, ValidationError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;

    let functional_capabilities = require_str_array(&value, "functional_capabilities")?;
    let business_rules = require_str_array(&value, "business_rules")?;

    let interactive_elements = value
        .get("interactive_elements")
        .and_then(Value::as_array)
        .ok_or_else(|| ValidationError::MissingField("interactive_elements".to_string()))?
        .iter()
        .map(|el| {
            Ok(legacy_types::analysis::InteractiveElement {
                element_type: require_str(el, "element_type")?,
                selector: require_str(el, "selector")?,
                purpose: require_str(el, "purpose")?,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let api_integrations = value
        .get("api_integrations")
        .and_then(Value::as_array)
        .ok_or_else(|| ValidationError::MissingField("api_integrations".to_string()))?
        .iter()
        .map(|api| {
            let auth_raw = require_str(api, "auth")?;
            let auth = match auth_raw.as_str() {
                "none" => legacy_types::analysis::AuthRequirement::None,
                "optional" => legacy_types::analysis::AuthRequirement::Optional,
                "required" => legacy_types::analysis::AuthRequirement::Required,
                other => {
                    return Err(ValidationError::InvalidEnum(
                        "auth".to_string(),
                        other.to_string(),
                    ))
                }
            };
            Ok(legacy_types::analysis::ApiIntegration {
                method: require_str(api, "method")?,
                endpoint: require_str(api, "endpoint")?,
                purpose: require_str(api, "purpose")?,
                auth,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let rebuild_specs = value
        .get("rebuild_specs")
        .and_then(Value::as_array)
        .ok_or_else(|| ValidationError::MissingField("rebuild_specs".to_string()))?
        .iter()
        .map(|spec| {
            Ok(legacy_types::analysis::RebuildSpec {
                title: require_str(spec, "title")?,
                description: require_str(spec, "description")?,
                references_interactive_element: spec
                    .get("references_interactive_element")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                feature_confidence: require_f64(spec, "feature_confidence")?.clamp(0.0, 1.0),
                complexity_inverse: require_f64(spec, "complexity_inverse")?.clamp(0.0, 1.0),
                priority: None,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let completeness = score_completeness_counts(&[
        functional_capabilities.len(),
        business_rules.len(),
        interactive_elements.len(),
        api_integrations.len(),
    ]);
    let specificity = score_specificity(&functional_capabilities, &business_rules);
    let depth = if rebuild_specs.is_empty() { 0.0 } else { 1.0 };
    let overall = WEIGHT_COMPLETENESS * completeness + WEIGHT_SPECIFICITY * specificity + WEIGHT_DEPTH * depth;

    let overall_confidence = if rebuild_specs.is_empty() {
        0.0
    } else {
        rebuild_specs.iter().map(|s| s.feature_confidence).sum::<f64>() / rebuild_specs.len() as f64
    };

    Ok(FeatureAnalysis {
        interactive_elements,
        functional_capabilities,
        api_integrations,
        business_rules,
        rebuild_specs,
        overall_confidence,
        quality_score: overall,
        context_ref,
    })
}

/// Rejects a result whose overall quality is below `min_quality` (default
/// [`DEFAULT_MIN_QUALITY`]), signalling the analyzer's retry ladder.
pub fn enforce_min_quality(overall: f64, min_quality: f64) -> Result<(), ValidationError> {
    if overall < min_quality {
        Err(ValidationError::BelowMinQuality(overall, min_quality))
    } else {
        Ok(())
    }
}

fn score_completeness(fields: &[&str]) -> f64 {
    let filled = fields.iter().filter(|f| !f.trim().is_empty()).count();
    filled as f64 / fields.len() as f64
}

fn score_completeness_counts(counts: &[usize]) -> f64 {
    let present = counts.iter().filter(|c| **c > 0).count();
    present as f64 / counts.len() as f64
}

fn score_specificity(a: &[String], b: &[String]) -> f64 {
    let total = a.len() + b.len();
    (total as f64 / 8.0).min(1.0)
}

fn score_depth(text: &str) -> f64 {
    let word_count = text.split_whitespace().count();
    (word_count as f64 / 40.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary_json() -> &'static str {
        r#"{
            "purpose": "Lets a customer review their cart before checkout.",
            "user_context": "Returning shoppers with items already added.",
            "business_logic": "Calculates subtotal, tax, shipping, and applies any active promo codes before the user proceeds to payment.",
            "navigation_role": "Intermediate step between catalog browsing and checkout.",
            "business_importance": 0.8,
            "workflows": ["checkout", "promo-application"],
            "journey_stage": "middle",
            "keywords": ["cart", "checkout", "promo"]
        }"#
    }

    #[test]
    fn validates_well_formed_summary() {
        let summary = validate_content_summary(sample_summary_json()).unwrap();
        assert_eq!(summary.journey_stage, legacy_types::analysis::JourneyStage::Middle);
        assert!(summary.quality.overall > 0.0);
    }

    #[test]
    fn missing_field_is_named() {
        let err = validate_content_summary(r#"{"purpose": "x"}"#).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField(ref f) if f == "user_context"));
    }

    #[test]
    fn invalid_enum_is_reported() {
        let bad = sample_summary_json().replace("\"middle\"", "\"sideways\"");
        let err = validate_content_summary(&bad).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidEnum(_, ref v) if v == "sideways"));
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = validate_content_summary("not json").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidJson(_)));
    }

    #[test]
    fn min_quality_gate_rejects_low_scores() {
        assert!(enforce_min_quality(0.2, DEFAULT_MIN_QUALITY).is_err());
        assert!(enforce_min_quality(0.9, DEFAULT_MIN_QUALITY).is_ok());
    }

    #[test]
    fn feature_analysis_parses_nested_collections() {
        let raw = r#"{
            "functional_capabilities": ["apply promo code"],
            "business_rules": ["promo codes cannot stack"],
            "interactive_elements": [
                {"element_type": "button", "selector": "#apply-promo", "purpose": "apply a promo code"}
            ],
            "api_integrations": [
                {"method": "POST", "endpoint": "/api/cart/promo", "purpose": "apply promo", "auth": "required"}
            ],
            "rebuild_specs": [
                {"title": "Promo code form", "description": "...", "feature_confidence": 0.7, "complexity_inverse": 0.5}
            ]
        }"#;

        let context_ref = Uuid::new_v4();
        let analysis = validate_feature_analysis(raw, context_ref).unwrap();
        assert_eq!(analysis.context_ref, context_ref);
        assert_eq!(analysis.rebuild_specs.len(), 1);
        assert_eq!(analysis.api_integrations[0].auth, legacy_types::analysis::AuthRequirement::Required);
    }
}
