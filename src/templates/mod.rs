//! Template expander: parameterized search definitions, typed parameter
//! validation, `{name}` placeholder substitution, and materialization into
//! saved searches.

use crate::database::dao::{NewSavedSearch, NewTemplate};
use crate::database::entities::SearchTemplate;
use crate::database::DatabaseManager;
use crate::error::AppError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Boolean,
}

impl ParameterType {
    fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            ParameterType::String => value.is_string(),
            ParameterType::Number => value.is_number(),
            ParameterType::Boolean => value.is_boolean(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Number => "number",
            ParameterType::Boolean => "boolean",
        }
    }
}

/// One declared template parameter
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The partial saved-search definition a template carries
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateData {
    pub query: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_interval_hours: Option<i32>,
}

pub type ParameterSchema = BTreeMap<String, ParameterSpec>;

/// Validation result; issues are data, never errors
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub issues: Vec<String>,
}

/// Resolved search definition returned by preview, nothing persisted
#[derive(Debug, Serialize, ToSchema)]
pub struct TemplatePreview {
    pub name: String,
    pub query: String,
    pub platform: String,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub check_interval_hours: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopTemplate {
    pub id: i32,
    pub name: String,
    pub usage_count: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateAnalytics {
    pub total_templates: usize,
    pub total_uses: i64,
    pub categories: Vec<CategoryCount>,
    pub top_templates: Vec<TopTemplate>,
}

/// Template expander service
#[derive(Clone)]
pub struct TemplateService {
    database: Arc<dyn DatabaseManager>,
}

impl TemplateService {
    pub fn new(database: Arc<dyn DatabaseManager>) -> Self {
        Self { database }
    }

    pub async fn create(
        &self,
        user_id: i32,
        name: String,
        description: Option<String>,
        category: String,
        template_data: serde_json::Value,
        parameters: serde_json::Value,
        is_public: bool,
    ) -> Result<SearchTemplate, AppError> {
        // Reject structurally broken payloads up front; placeholder/schema
        // mismatches are reported later by validate, not here
        parse_template_data(&template_data)?;
        parse_schema(&parameters)?;

        let template = self
            .database
            .templates()
            .create(NewTemplate {
                name,
                description,
                category,
                template_data,
                parameters,
                is_public,
                created_by: Some(user_id),
            })
            .await?;

        tracing::info!(user_id, template_id = template.id, "template created");
        Ok(template)
    }

    pub async fn list(
        &self,
        user_id: i32,
        category: Option<&str>,
    ) -> Result<Vec<SearchTemplate>, AppError> {
        Ok(self
            .database
            .templates()
            .find_visible(user_id, category)
            .await?)
    }

    pub async fn get(&self, user_id: i32, template_id: i32) -> Result<SearchTemplate, AppError> {
        self.visible_template(user_id, template_id).await
    }

    /// Only the owner mutates; system templates are immutable via the API
    pub async fn update(
        &self,
        user_id: i32,
        template_id: i32,
        name: Option<String>,
        description: Option<Option<String>>,
        category: Option<String>,
        template_data: Option<serde_json::Value>,
        parameters: Option<serde_json::Value>,
        is_public: Option<bool>,
    ) -> Result<SearchTemplate, AppError> {
        let mut template = self.owned_template(user_id, template_id).await?;

        if let Some(template_data) = template_data {
            parse_template_data(&template_data)?;
            template.template_data = template_data;
        }
        if let Some(parameters) = parameters {
            parse_schema(&parameters)?;
            template.parameters = parameters;
        }
        if let Some(name) = name {
            template.name = name;
        }
        if let Some(description) = description {
            template.description = description;
        }
        if let Some(category) = category {
            template.category = category;
        }
        if let Some(is_public) = is_public {
            template.is_public = is_public;
        }

        Ok(self.database.templates().update(&template).await?)
    }

    pub async fn delete(&self, user_id: i32, template_id: i32) -> Result<(), AppError> {
        self.owned_template(user_id, template_id).await?;
        self.database.templates().delete(template_id).await?;
        Ok(())
    }

    pub async fn categories(&self, user_id: i32) -> Result<Vec<String>, AppError> {
        Ok(self.database.templates().categories(user_id).await?)
    }

    pub async fn analytics(&self, user_id: i32) -> Result<TemplateAnalytics, AppError> {
        let templates = self.database.templates().find_visible(user_id, None).await?;

        let total_uses = templates.iter().map(|t| t.usage_count as i64).sum();

        let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
        for t in &templates {
            *by_category.entry(t.category.clone()).or_default() += 1;
        }
        let categories = by_category
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();

        let mut ranked: Vec<_> = templates.iter().collect();
        ranked.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
        let top_templates = ranked
            .into_iter()
            .take(5)
            .map(|t| TopTemplate {
                id: t.id,
                name: t.name.clone(),
                usage_count: t.usage_count,
            })
            .collect();

        Ok(TemplateAnalytics {
            total_templates: templates.len(),
            total_uses,
            categories,
            top_templates,
        })
    }

    /// Non-throwing validation: structurally always succeeds and reports
    /// problems as issues in the payload.
    pub async fn validate(
        &self,
        user_id: i32,
        template_id: i32,
        supplied: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<ValidationOutcome, AppError> {
        let template = self.visible_template(user_id, template_id).await?;
        let schema = parse_schema(&template.parameters)?;
        let data = parse_template_data(&template.template_data)?;

        Ok(validate_supplied(&schema, &data.query, supplied))
    }

    pub async fn preview(
        &self,
        user_id: i32,
        template_id: i32,
        supplied: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<TemplatePreview, AppError> {
        let template = self.visible_template(user_id, template_id).await?;
        let schema = parse_schema(&template.parameters)?;
        let data = parse_template_data(&template.template_data)?;

        let values = resolve_values(&schema, supplied);
        Ok(TemplatePreview {
            name: template.name,
            query: substitute(&data.query, &values),
            platform: data.platform,
            min_price: data.min_price,
            max_price: data.max_price,
            check_interval_hours: data.check_interval_hours,
        })
    }

    /// Materialize a saved search from the template. Fails with a validation
    /// error when required parameters stay unresolved; on success the
    /// template's usage counter is bumped atomically.
    pub async fn use_template(
        &self,
        user_id: i32,
        template_id: i32,
        supplied: &serde_json::Map<String, serde_json::Value>,
        name: Option<String>,
    ) -> Result<i32, AppError> {
        let template = self.visible_template(user_id, template_id).await?;
        let schema = parse_schema(&template.parameters)?;
        let data = parse_template_data(&template.template_data)?;

        let outcome = validate_supplied(&schema, &data.query, supplied);
        if !outcome.valid {
            return Err(AppError::Validation(outcome.issues.join("; ")));
        }

        let values = resolve_values(&schema, supplied);
        let search = self
            .database
            .saved_searches()
            .create(NewSavedSearch {
                user_id,
                name: name.unwrap_or_else(|| template.name.clone()),
                query: substitute(&data.query, &values),
                platform: data.platform,
                min_price: data.min_price,
                max_price: data.max_price,
                check_interval_hours: data.check_interval_hours,
                template_id: Some(template.id),
            })
            .await?;

        self.database.templates().increment_usage(template.id).await?;

        metrics::counter!("vinyldigger_templates_used_total").increment(1);
        tracing::info!(user_id, template_id, search_id = search.id, "template materialized");
        Ok(search.id)
    }

    async fn visible_template(
        &self,
        user_id: i32,
        template_id: i32,
    ) -> Result<SearchTemplate, AppError> {
        let template = self
            .database
            .templates()
            .find_by_id(template_id)
            .await?
            .filter(|t| t.visible_to(user_id))
            .ok_or_else(|| AppError::NotFound(format!("template {} not found", template_id)))?;

        Ok(template)
    }

    async fn owned_template(
        &self,
        user_id: i32,
        template_id: i32,
    ) -> Result<SearchTemplate, AppError> {
        let template = self.visible_template(user_id, template_id).await?;
        if template.created_by != Some(user_id) {
            return Err(AppError::Forbidden(
                "only the owner can modify a template".to_string(),
            ));
        }
        Ok(template)
    }
}

fn parse_schema(parameters: &serde_json::Value) -> Result<ParameterSchema, AppError> {
    serde_json::from_value(parameters.clone())
        .map_err(|e| AppError::Validation(format!("invalid parameter schema: {}", e)))
}

fn parse_template_data(template_data: &serde_json::Value) -> Result<TemplateData, AppError> {
    serde_json::from_value(template_data.clone())
        .map_err(|e| AppError::Validation(format!("invalid template data: {}", e)))
}

/// Extract `{name}` placeholders from a query string. Unclosed braces are
/// ignored.
fn placeholders(query: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut chars = query.char_indices();
    while let Some((start, c)) = chars.next() {
        if c != '{' {
            continue;
        }
        if let Some(end) = query[start + 1..].find('}') {
            let name = &query[start + 1..start + 1 + end];
            if !name.is_empty() && !found.contains(&name.to_string()) {
                found.push(name.to_string());
            }
        }
    }
    found
}

fn validate_supplied(
    schema: &ParameterSchema,
    query: &str,
    supplied: &serde_json::Map<String, serde_json::Value>,
) -> ValidationOutcome {
    let mut issues = Vec::new();

    for (name, spec) in schema {
        if spec.required && !supplied.contains_key(name) && spec.default.is_none() {
            issues.push(format!("missing required parameter '{}'", name));
        }
    }

    for (name, value) in supplied {
        match schema.get(name) {
            Some(spec) if !spec.param_type.matches(value) => {
                issues.push(format!(
                    "parameter '{}' expects {}, got {}",
                    name,
                    spec.param_type.name(),
                    json_type_name(value)
                ));
            }
            Some(_) => {}
            None => issues.push(format!("unknown parameter '{}'", name)),
        }
    }

    // Every placeholder in the query must be declared
    for name in placeholders(query) {
        if !schema.contains_key(&name) {
            issues.push(format!("placeholder '{{{}}}' has no declared parameter", name));
        }
    }

    ValidationOutcome {
        valid: issues.is_empty(),
        issues,
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Merge supplied values over declared defaults, rendered as strings for
/// substitution.
fn resolve_values(
    schema: &ParameterSchema,
    supplied: &serde_json::Map<String, serde_json::Value>,
) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    for (name, spec) in schema {
        let value = supplied.get(name).or(spec.default.as_ref());
        if let Some(value) = value {
            values.insert(name.clone(), render(value));
        }
    }

    values
}

fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replace `{name}` placeholders with resolved values; unresolved
/// placeholders become the empty string.
fn substitute(query: &str, values: &BTreeMap<String, String>) -> String {
    let mut result = String::with_capacity(query.len());
    let mut rest = query;

    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        match rest[open + 1..].find('}') {
            Some(close) => {
                let name = &rest[open + 1..open + 1 + close];
                if let Some(value) = values.get(name) {
                    result.push_str(value);
                }
                rest = &rest[open + close + 2..];
            }
            None => {
                // Unclosed brace: keep the tail verbatim
                result.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(json: serde_json::Value) -> ParameterSchema {
        serde_json::from_value(json).unwrap()
    }

    fn map(json: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        json.as_object().unwrap().clone()
    }

    #[test]
    fn missing_required_is_an_issue_not_an_error() {
        let schema = schema(json!({
            "genre": {"type": "string", "required": true}
        }));
        let outcome = validate_supplied(&schema, "rock {genre}", &map(json!({})));
        assert!(!outcome.valid);
        assert_eq!(outcome.issues, vec!["missing required parameter 'genre'"]);
    }

    #[test]
    fn required_with_default_passes() {
        let schema = schema(json!({
            "genre": {"type": "string", "required": true, "default": "jazz"}
        }));
        let outcome = validate_supplied(&schema, "rock {genre}", &map(json!({})));
        assert!(outcome.valid);
    }

    #[test]
    fn wrong_type_is_reported() {
        let schema = schema(json!({
            "year": {"type": "number", "required": false}
        }));
        let outcome = validate_supplied(&schema, "{year}", &map(json!({"year": "1977"})));
        assert!(!outcome.valid);
        assert_eq!(
            outcome.issues,
            vec!["parameter 'year' expects number, got string"]
        );
    }

    #[test]
    fn undeclared_placeholder_is_reported() {
        let schema = schema(json!({}));
        let outcome = validate_supplied(&schema, "rock {genre}", &map(json!({})));
        assert!(!outcome.valid);
        assert_eq!(
            outcome.issues,
            vec!["placeholder '{genre}' has no declared parameter"]
        );
    }

    #[test]
    fn substitution_merges_supplied_over_defaults() {
        let schema = schema(json!({
            "genre": {"type": "string", "required": true, "default": "jazz"},
            "format": {"type": "string", "required": false, "default": "LP"}
        }));
        let values = resolve_values(&schema, &map(json!({"genre": "prog"})));
        assert_eq!(substitute("rock {genre} {format}", &values), "rock prog LP");
    }

    #[test]
    fn missing_optional_substitutes_empty() {
        let schema = schema(json!({
            "genre": {"type": "string", "required": false}
        }));
        let values = resolve_values(&schema, &map(json!({})));
        assert_eq!(substitute("rock {genre} vinyl", &values), "rock  vinyl");
    }

    #[test]
    fn non_string_values_render_plainly() {
        let schema = schema(json!({
            "year": {"type": "number", "required": false},
            "mono": {"type": "boolean", "required": false}
        }));
        let values = resolve_values(&schema, &map(json!({"year": 1977, "mono": true})));
        assert_eq!(substitute("{year} {mono}", &values), "1977 true");
    }

    #[test]
    fn unclosed_brace_kept_verbatim() {
        let values = BTreeMap::new();
        assert_eq!(substitute("rock {genre", &values), "rock {genre");
    }

    #[test]
    fn placeholder_extraction() {
        assert_eq!(
            placeholders("{a} and {b} and {a}"),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(placeholders("no placeholders").is_empty());
        assert!(placeholders("{}").is_empty());
    }
}
