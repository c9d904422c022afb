use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One link in a chain: which search to fire and under what condition,
/// relative to the result count of the preceding link's search.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "search_chain_links")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub chain_id: i32,
    pub search_id: i32,
    /// Defines evaluation order within the chain. Unique per chain; gaps are
    /// allowed and never recompacted.
    pub order_index: i32,
    pub condition_type: String,
    pub min_results: Option<i32>,
    /// Stamped when the link fires; makes redundant `evaluate` calls no-ops
    /// until the predecessor completes a newer run.
    pub last_fired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Trigger condition as a tagged variant at the API boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "condition_type", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Fire when the previous search found at least one result.
    ResultsFound,
    /// Fire when the previous search found nothing.
    NoResults,
    /// Fire when the previous search found at least `min_results` results.
    MinResults { min_results: i32 },
}

impl TriggerCondition {
    pub fn is_satisfied_by(&self, result_count: i32) -> bool {
        match self {
            TriggerCondition::ResultsFound => result_count > 0,
            TriggerCondition::NoResults => result_count == 0,
            TriggerCondition::MinResults { min_results } => result_count >= *min_results,
        }
    }

    pub fn condition_type(&self) -> &'static str {
        match self {
            TriggerCondition::ResultsFound => "results_found",
            TriggerCondition::NoResults => "no_results",
            TriggerCondition::MinResults { .. } => "min_results",
        }
    }

    pub fn min_results(&self) -> Option<i32> {
        match self {
            TriggerCondition::MinResults { min_results } => Some(*min_results),
            _ => None,
        }
    }

    /// Reassemble the variant from its stored columns.
    pub fn from_columns(condition_type: &str, min_results: Option<i32>) -> Option<Self> {
        match condition_type {
            "results_found" => Some(TriggerCondition::ResultsFound),
            "no_results" => Some(TriggerCondition::NoResults),
            "min_results" => Some(TriggerCondition::MinResults {
                min_results: min_results?,
            }),
            _ => None,
        }
    }
}

impl Model {
    pub fn trigger_condition(&self) -> Option<TriggerCondition> {
        TriggerCondition::from_columns(&self.condition_type, self.min_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_found_condition() {
        let cond = TriggerCondition::ResultsFound;
        assert!(cond.is_satisfied_by(1));
        assert!(cond.is_satisfied_by(100));
        assert!(!cond.is_satisfied_by(0));
    }

    #[test]
    fn test_no_results_condition() {
        let cond = TriggerCondition::NoResults;
        assert!(cond.is_satisfied_by(0));
        assert!(!cond.is_satisfied_by(1));
    }

    #[test]
    fn test_min_results_boundary_is_inclusive() {
        let cond = TriggerCondition::MinResults { min_results: 5 };
        assert!(!cond.is_satisfied_by(4));
        assert!(cond.is_satisfied_by(5));
        assert!(cond.is_satisfied_by(6));
    }

    #[test]
    fn test_column_round_trip() {
        for cond in [
            TriggerCondition::ResultsFound,
            TriggerCondition::NoResults,
            TriggerCondition::MinResults { min_results: 3 },
        ] {
            let rebuilt =
                TriggerCondition::from_columns(cond.condition_type(), cond.min_results()).unwrap();
            assert_eq!(rebuilt, cond);
        }
    }

    #[test]
    fn test_min_results_requires_threshold_column() {
        assert!(TriggerCondition::from_columns("min_results", None).is_none());
        assert!(TriggerCondition::from_columns("garbage", None).is_none());
    }

    #[test]
    fn test_tagged_serde_shape() {
        let cond = TriggerCondition::MinResults { min_results: 2 };
        let json = serde_json::to_value(&cond).unwrap();
        assert_eq!(json["condition_type"], "min_results");
        assert_eq!(json["min_results"], 2);

        let parsed: TriggerCondition =
            serde_json::from_value(serde_json::json!({"condition_type": "no_results"})).unwrap();
        assert_eq!(parsed, TriggerCondition::NoResults);
    }
}
