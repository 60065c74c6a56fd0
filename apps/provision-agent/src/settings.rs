//! Provisioning inputs, read from the variables `azd` exports.

/// Everything needed to reach the project and create an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSettings {
    pub endpoint: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub project: String,
    pub model: String,
    pub key_vault: Option<String>,
}

impl ProvisionSettings {
    /// Resolve the settings, or name the first one that is missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, &'static str> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let first = |keys: &[&str]| keys.iter().find_map(|key| get(*key));

        let endpoint = first(&[
            "AZURE_AI_ENDPOINT",
            "AI_FOUNDRY_ACCOUNT_ENDPOINT",
            "PROJECT_ENDPOINT",
        ])
        .ok_or("endpoint")?;
        let subscription_id = get("AZURE_SUBSCRIPTION_ID").ok_or("subscription")?;
        let resource_group = first(&["AZURE_RESOURCE_GROUP_NAME", "AZURE_RESOURCE_GROUP"])
            .or_else(|| {
                first(&["AI_FOUNDRY_ACCOUNT_ID", "AZURE_COG_ACCOUNT_ID"])
                    .as_deref()
                    .and_then(resource_group_of)
            })
            .ok_or("resource-group")?;
        let project = first(&["AZURE_AI_PROJECT_NAME", "AI_FOUNDRY_PROJECT_NAME"]).ok_or("project")?;
        let model = first(&["AZURE_MODEL", "AI_FOUNDRY_DEPLOYMENT_MODEL_NAME"]).ok_or("model")?;

        Ok(Self {
            endpoint,
            subscription_id,
            resource_group,
            project,
            model,
            key_vault: get("AZURE_KEY_VAULT_ENDPOINT"),
        })
    }
}

/// The resource group segment of an ARM resource id.
fn resource_group_of(resource_id: &str) -> Option<String> {
    let (_, rest) = resource_id.split_once("/resourceGroups/")?;
    rest.split('/')
        .next()
        .filter(|rg| !rg.is_empty())
        .map(str::to_string)
}
