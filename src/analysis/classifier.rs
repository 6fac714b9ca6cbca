use crate::models::deployment::DeploymentClass;
use crate::models::issue::IssueRecord;
use serde::{Deserialize, Serialize};

/// Customers known to run private deployments.
pub const PRIVATE_CUSTOMERS: [&str; 20] = [
    "福田", "南方电网", "OPPO", "广东电信", "唯品会", "好未来", "招商", "新华三", "跨越", "TCL",
    "百度", "小红书", "格力", "猿辅导", "360", "玉溪", "东风", "融云", "滴滴", "作业帮",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    Environment,
    Customer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Matcher {
    Contains {
        value: String,
        #[serde(default)]
        ignore_case: bool,
    },
    Equals {
        value: String,
    },
    AnyOf {
        values: Vec<String>,
    },
    NonBlank,
}

impl Matcher {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Contains { value, ignore_case } => {
                if *ignore_case {
                    text.to_lowercase().contains(&value.to_lowercase())
                } else {
                    text.contains(value.as_str())
                }
            }
            Matcher::Equals { value } => text == value,
            Matcher::AnyOf { values } => values.iter().any(|v| text.contains(v.as_str())),
            Matcher::NonBlank => !text.trim().is_empty(),
        }
    }

    /// A blank pattern is a substring of everything, so it is never valid.
    pub fn is_valid(&self) -> bool {
        match self {
            Matcher::Contains { value, .. } | Matcher::Equals { value } => !value.trim().is_empty(),
            Matcher::AnyOf { values } => {
                !values.is_empty() && values.iter().all(|v| !v.trim().is_empty())
            }
            Matcher::NonBlank => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub field: RuleField,
    pub matcher: Matcher,
    pub class: DeploymentClass,
}

impl ClassificationRule {
    fn new(field: RuleField, matcher: Matcher, class: DeploymentClass) -> Self {
        Self { field, matcher, class }
    }

    pub fn is_valid(&self) -> bool {
        self.matcher.is_valid()
    }

    fn applies_to(&self, issue: &IssueRecord) -> bool {
        let text = match self.field {
            RuleField::Environment => issue.discovery_environment.as_deref(),
            RuleField::Customer => issue.customer_name.as_deref(),
        };
        self.matcher.matches(text.unwrap_or(""))
    }
}

/// Default cascade. Environment outranks customer name, explicit SaaS markers
/// outrank the private defaults.
pub fn default_rules() -> Vec<ClassificationRule> {
    use DeploymentClass::{Private, Saas};
    use RuleField::{Customer, Environment};

    vec![
        ClassificationRule::new(
            Environment,
            Matcher::Contains { value: "SaaS".to_string(), ignore_case: true },
            Saas,
        ),
        ClassificationRule::new(
            Environment,
            Matcher::Contains { value: "私有化".to_string(), ignore_case: false },
            Private,
        ),
        ClassificationRule::new(Customer, Matcher::Equals { value: "SaaS客户".to_string() }, Saas),
        ClassificationRule::new(
            Customer,
            Matcher::Contains { value: "SaaS".to_string(), ignore_case: false },
            Saas,
        ),
        // SDK channel customers are deployed privately.
        ClassificationRule::new(
            Customer,
            Matcher::Contains { value: "SDK".to_string(), ignore_case: true },
            Private,
        ),
        ClassificationRule::new(
            Customer,
            Matcher::AnyOf { values: PRIVATE_CUSTOMERS.iter().map(|c| c.to_string()).collect() },
            Private,
        ),
        // Named customers are private unless marked SaaS above.
        ClassificationRule::new(Customer, Matcher::NonBlank, Private),
    ]
}

/// First matching rule wins; no match means Unclassified.
pub fn classify(issue: &IssueRecord, rules: &[ClassificationRule]) -> DeploymentClass {
    rules
        .iter()
        .find(|rule| rule.applies_to(issue))
        .map(|rule| rule.class)
        .unwrap_or(DeploymentClass::Unclassified)
}
