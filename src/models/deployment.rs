use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentClass {
    Saas,
    Private,
    Unclassified,
}

impl DeploymentClass {
    pub fn label(&self) -> &'static str {
        match self {
            DeploymentClass::Saas => "SaaS",
            DeploymentClass::Private => "私有化",
            DeploymentClass::Unclassified => "未分类",
        }
    }
}
