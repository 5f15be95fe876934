use evalexpr::{build_operator_tree, ContextWithMutableVariables, HashMapContext, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Результат вычисления параметра
pub type ParameterResult = Result<f64, ParameterError>;

/// Ошибки при работе с параметрами
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    /// Параметр не найден
    #[error("Parameter '{0}' not found")]
    NotFound(String),
    /// Ошибка парсинга формулы
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Ошибка вычисления формулы
    #[error("Evaluation error: {0}")]
    EvaluationError(String),
    /// Циклическая зависимость
    #[error("Circular dependency: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),
    /// Неверный тип значения
    #[error("Invalid type: {0}")]
    InvalidType(String),
}

/// Описание параметра, объявленного моделью (`parameter_definitions()`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    pub initial: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl ParameterDefinition {
    pub fn new(name: impl Into<String>, initial: f64) -> Self {
        Self {
            name: name.into(),
            initial,
            caption: None,
        }
    }

    /// Подпись для UI: caption или имя
    pub fn label(&self) -> &str {
        self.caption.as_deref().unwrap_or(&self.name)
    }
}

/// Пользовательское переопределение значения параметра
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterOverride {
    Number { value: f64 },
    Formula { expression: String },
}

/// Набор параметров модели: определения + переопределения
struct ParameterTable<'a> {
    definitions: HashMap<&'a str, &'a ParameterDefinition>,
    overrides: &'a BTreeMap<String, ParameterOverride>,
}

impl<'a> ParameterTable<'a> {
    fn evaluate(&self, name: &str) -> ParameterResult {
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        self.evaluate_internal(name, &mut visited, &mut path)
    }

    fn evaluate_internal(
        &self,
        name: &str,
        visited: &mut HashSet<String>,
        path: &mut Vec<String>,
    ) -> ParameterResult {
        // Проверка на циклическую зависимость
        if visited.contains(name) {
            path.push(name.to_string());
            return Err(ParameterError::CircularDependency(path.clone()));
        }

        let definition = self
            .definitions
            .get(name)
            .ok_or_else(|| ParameterError::NotFound(name.to_string()))?;

        visited.insert(name.to_string());
        path.push(name.to_string());

        let result = match self.overrides.get(name) {
            None => Ok(definition.initial),
            Some(ParameterOverride::Number { value }) => Ok(*value),
            Some(ParameterOverride::Formula { expression }) => {
                let mut context = HashMapContext::new();

                // Вычислить только те параметры, которые упомянуты в формуле
                for dep_name in self.dependencies(name, expression) {
                    let dep_value = self.evaluate_internal(&dep_name, visited, path)?;
                    context
                        .set_value(dep_name, Value::Float(dep_value))
                        .map_err(|e| ParameterError::EvaluationError(e.to_string()))?;
                }

                context
                    .set_value("PI".to_string(), Value::Float(std::f64::consts::PI))
                    .ok();
                context
                    .set_value("E".to_string(), Value::Float(std::f64::consts::E))
                    .ok();

                let tree = build_operator_tree(expression)
                    .map_err(|e| ParameterError::ParseError(e.to_string()))?;

                let value = tree
                    .eval_with_context(&context)
                    .map_err(|e| ParameterError::EvaluationError(e.to_string()))?;

                match value {
                    Value::Float(f) => Ok(f),
                    Value::Int(i) => Ok(i as f64),
                    _ => Err(ParameterError::InvalidType(format!(
                        "Expected number, got {:?}",
                        value
                    ))),
                }
            }
        };

        visited.remove(name);
        path.pop();

        result
    }

    /// Имена параметров, встречающиеся в формуле как отдельные идентификаторы
    fn dependencies(&self, name: &str, expression: &str) -> Vec<String> {
        let identifiers: HashSet<&str> = expression
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| !token.is_empty())
            .collect();

        let mut deps: Vec<String> = self
            .definitions
            .keys()
            .filter(|candidate| **candidate != name && identifiers.contains(*candidate))
            .map(|candidate| candidate.to_string())
            .collect();
        // Самоссылка тоже считается циклом
        if identifiers.contains(name) {
            deps.push(name.to_string());
        }
        deps.sort();
        deps
    }
}

/// Вычислить итоговые значения всех параметров модели.
///
/// Значение параметра: `initial` из определения либо переопределение
/// пользователя (число или формула `evalexpr`, ссылающаяся на другие параметры).
/// Переопределения для необъявленных имён дают `NotFound`.
pub fn resolve_parameters(
    definitions: &[ParameterDefinition],
    overrides: &BTreeMap<String, ParameterOverride>,
) -> Result<BTreeMap<String, f64>, ParameterError> {
    let table = ParameterTable {
        definitions: definitions.iter().map(|d| (d.name.as_str(), d)).collect(),
        overrides,
    };

    if let Some(unknown) = overrides.keys().find(|k| !table.definitions.contains_key(k.as_str())) {
        return Err(ParameterError::NotFound(unknown.clone()));
    }

    definitions
        .iter()
        .map(|d| table.evaluate(&d.name).map(|v| (d.name.clone(), v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs() -> Vec<ParameterDefinition> {
        vec![
            ParameterDefinition::new("width", 10.0),
            ParameterDefinition::new("height", 5.0),
            ParameterDefinition::new("radius", 2.0),
        ]
    }

    fn formula(expr: &str) -> ParameterOverride {
        ParameterOverride::Formula {
            expression: expr.to_string(),
        }
    }

    #[test]
    fn test_defaults_without_overrides() {
        let values = resolve_parameters(&defs(), &BTreeMap::new()).unwrap();
        assert_eq!(values["width"], 10.0);
        assert_eq!(values["height"], 5.0);
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_number_override() {
        let mut overrides = BTreeMap::new();
        overrides.insert("width".to_string(), ParameterOverride::Number { value: 42.0 });
        let values = resolve_parameters(&defs(), &overrides).unwrap();
        assert_eq!(values["width"], 42.0);
    }

    #[test]
    fn test_formula_override_uses_other_parameters() {
        let mut overrides = BTreeMap::new();
        overrides.insert("height".to_string(), formula("width * 2"));
        let values = resolve_parameters(&defs(), &overrides).unwrap();
        assert_eq!(values["height"], 20.0);
    }

    #[test]
    fn test_formula_chain_through_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("width".to_string(), ParameterOverride::Number { value: 3.0 });
        overrides.insert("height".to_string(), formula("width + 1"));
        overrides.insert("radius".to_string(), formula("height * 2"));
        let values = resolve_parameters(&defs(), &overrides).unwrap();
        assert_eq!(values["radius"], 8.0);
    }

    #[test]
    fn test_formula_with_constants() {
        let mut overrides = BTreeMap::new();
        overrides.insert("radius".to_string(), formula("PI * width"));
        let values = resolve_parameters(&defs(), &overrides).unwrap();
        assert!((values["radius"] - std::f64::consts::PI * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_circular_dependency() {
        let mut overrides = BTreeMap::new();
        overrides.insert("width".to_string(), formula("height + 1"));
        overrides.insert("height".to_string(), formula("width + 1"));
        let result = resolve_parameters(&defs(), &overrides);
        assert!(matches!(result, Err(ParameterError::CircularDependency(_))));
    }

    #[test]
    fn test_self_reference_is_circular() {
        let mut overrides = BTreeMap::new();
        overrides.insert("width".to_string(), formula("width * 2"));
        let result = resolve_parameters(&defs(), &overrides);
        assert!(matches!(result, Err(ParameterError::CircularDependency(_))));
    }

    #[test]
    fn test_unknown_override_rejected() {
        let mut overrides = BTreeMap::new();
        overrides.insert("depth".to_string(), ParameterOverride::Number { value: 1.0 });
        assert_eq!(
            resolve_parameters(&defs(), &overrides),
            Err(ParameterError::NotFound("depth".to_string()))
        );
    }

    #[test]
    fn test_name_prefix_is_not_a_dependency() {
        let defs = vec![
            ParameterDefinition::new("w", 1.0),
            ParameterDefinition::new("width", 10.0),
        ];
        let mut overrides = BTreeMap::new();
        overrides.insert("w".to_string(), formula("width / 2"));
        let values = resolve_parameters(&defs, &overrides).unwrap();
        assert_eq!(values["w"], 5.0);
    }

    #[test]
    fn test_parse_error() {
        let mut overrides = BTreeMap::new();
        overrides.insert("width".to_string(), formula("(2 + 3"));
        assert!(matches!(
            resolve_parameters(&defs(), &overrides),
            Err(ParameterError::ParseError(_))
        ));
    }

    #[test]
    fn test_label_prefers_caption() {
        let mut d = ParameterDefinition::new("r", 1.0);
        assert_eq!(d.label(), "r");
        d.caption = Some("Radius".to_string());
        assert_eq!(d.label(), "Radius");
    }
}
