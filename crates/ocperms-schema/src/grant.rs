use serde::Serialize;
use serde_json::Value;

use crate::address::{Address, HexData};
use crate::error::ValidationError;
use crate::fields::{owned_string, sequence, Fields, Outcome};
use crate::path::FieldPath;
use crate::request::PermissionRequest;
use crate::signer::UpgradeOp;

/// Deployment data for an account that does not exist on-chain yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMeta {
    pub factory: Address,
    pub factory_data: HexData,
    /// Run in order after deployment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_ops: Option<Vec<UpgradeOp>>,
}

impl AccountMeta {
    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            factory: fields.required("factory", Address::validate_at)?,
            factory_data: fields.required("factoryData", HexData::validate_at)?,
            upgrade_ops: fields
                .optional("upgradeOps", |v, p| sequence(v, p, UpgradeOp::validate_at))?,
        })
    }
}

/// Grant-specific signer wiring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerMeta {
    /// Contract that authorizes use of the granted permission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegation_manager: Option<Address>,
}

impl SignerMeta {
    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            delegation_manager: fields.optional("delegationManager", Address::validate_at)?,
        })
    }
}

/// A permission issued by a grantor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedPermission {
    /// Opaque handle the grantor uses to look up and enforce the grant.
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_meta: Option<AccountMeta>,
    pub signer_meta: SignerMeta,
    /// Echo of the originating request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<PermissionRequest>,
}

impl GrantedPermission {
    /// Whether the granting account must be deployed before first use.
    pub fn needs_deployment(&self) -> bool {
        self.account_meta.is_some()
    }

    pub(crate) fn validate_at(value: &Value, path: &FieldPath) -> Outcome<Self> {
        let fields = Fields::of(value, path)?;
        Ok(Self {
            context: fields.required("context", owned_string)?,
            account_meta: fields.optional("accountMeta", AccountMeta::validate_at)?,
            signer_meta: fields.required("signerMeta", SignerMeta::validate_at)?,
            permission: fields.optional("permission", PermissionRequest::validate_at)?,
        })
    }
}

/// Grants in the order of the requests they answer.
pub type GrantedPermissionsResponse = Vec<GrantedPermission>;

/// Validate an untyped value as a [`GrantedPermission`].
pub fn validate_granted_permission(value: &Value) -> Result<GrantedPermission, ValidationError> {
    GrantedPermission::validate_at(value, &FieldPath::root())
}

/// Validate an untyped value as a [`GrantedPermissionsResponse`].
pub fn validate_granted_permissions_response(
    value: &Value,
) -> Result<GrantedPermissionsResponse, ValidationError> {
    sequence(value, &FieldPath::root(), GrantedPermission::validate_at)
}

validated_record!(AccountMeta, |value| AccountMeta::validate_at(
    value,
    &FieldPath::root()
));
validated_record!(SignerMeta, |value| SignerMeta::validate_at(
    value,
    &FieldPath::root()
));
validated_record!(GrantedPermission, validate_granted_permission);
